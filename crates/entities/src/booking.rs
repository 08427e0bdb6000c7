//! Test-drive booking entity definitions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a test-drive booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Requested by the customer, awaiting confirmation.
    Pending,
    /// Confirmed by an administrator.
    Confirmed,
    /// Test drive took place.
    Completed,
    /// Cancelled by the owner or an administrator.
    Cancelled,
    /// Customer did not show up.
    NoShow,
}

impl Default for BookingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl BookingStatus {
    /// Returns true if the booking counts against slot uniqueness.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Returns true if no further transitions are allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Returns true if a transition from `self` to `next` is allowed.
    ///
    /// Transitions are monotonic: Pending may become Confirmed or Cancelled;
    /// Confirmed may become Completed, Cancelled, or NoShow; terminal states
    /// admit nothing.
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Confirmed | Self::Cancelled),
            Self::Confirmed => matches!(next, Self::Completed | Self::Cancelled | Self::NoShow),
            Self::Completed | Self::Cancelled | Self::NoShow => false,
        }
    }
}

/// A test-drive booking for a car.
///
/// Bookings are never physically deleted; they only move through status
/// transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier.
    pub id: Uuid,
    /// Booked car ID.
    pub car_id: Uuid,
    /// Owning user ID.
    pub user_id: Uuid,
    /// Calendar date of the test drive.
    pub booking_date: NaiveDate,
    /// Local start time, "HH:MM".
    pub start_time: String,
    /// Local end time, "HH:MM".
    pub end_time: String,
    /// Optional free-text notes from the customer.
    pub notes: Option<String>,
    /// Current status.
    pub status: BookingStatus,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new pending booking.
    pub fn new(
        car_id: Uuid,
        user_id: Uuid,
        booking_date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            car_id,
            user_id,
            booking_date,
            start_time: start_time.into(),
            end_time: end_time.into(),
            notes: None,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
