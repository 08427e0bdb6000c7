//! Cache invalidation events.
//!
//! Workflow mutations return the cache events they produced instead of
//! reaching into the presentation layer; the queue folds events into the set
//! of stale view paths that the frontend drains and re-fetches.

use std::collections::HashSet;

use uuid::Uuid;

/// A view-affecting mutation emitted by a workflow operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A booking for the car was created or changed.
    CarBookingsChanged { car_id: Uuid },
    /// The car record itself changed (created, edited, deleted).
    CarChanged { car_id: Uuid },
    /// A user's wishlist changed.
    WishlistChanged,
    /// A user's reservations view changed.
    ReservationsChanged,
    /// The admin bookings view changed.
    AdminBookingsChanged,
    /// The admin inventory view changed.
    AdminCarsChanged,
}

impl CacheEvent {
    /// View paths invalidated by this event.
    pub fn paths(&self) -> Vec<String> {
        match self {
            Self::CarBookingsChanged { car_id } => vec![
                format!("/cars/{car_id}"),
                format!("/test-drive/{car_id}"),
            ],
            Self::CarChanged { car_id } => {
                vec![format!("/cars/{car_id}"), "/cars".to_string()]
            }
            Self::WishlistChanged => vec!["/saved-cars".to_string()],
            Self::ReservationsChanged => vec!["/reservations".to_string()],
            Self::AdminBookingsChanged => vec!["/admin/test-drives".to_string()],
            Self::AdminCarsChanged => vec!["/admin/cars".to_string()],
        }
    }
}

/// Accumulates stale view paths between drains.
#[derive(Debug, Default)]
pub struct RevalidationQueue {
    paths: HashSet<String>,
}

impl RevalidationQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event's paths as stale.
    pub fn record(&mut self, event: &CacheEvent) {
        self.paths.extend(event.paths());
    }

    /// Records a batch of events.
    pub fn record_all(&mut self, events: &[CacheEvent]) {
        for event in events {
            self.record(event);
        }
    }

    /// Drains and returns the stale paths, sorted for stable output.
    pub fn take(&mut self) -> Vec<String> {
        let mut paths: Vec<String> = self.paths.drain().collect();
        paths.sort();
        paths
    }
}
