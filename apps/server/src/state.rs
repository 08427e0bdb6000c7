//! Application state.

use std::sync::Arc;

use dealer_store::DealerStore;
use identity::TokenVerifier;
use tokio::sync::RwLock;
use vision::VisionClient;

use crate::config::Config;
use crate::services::revalidation::{CacheEvent, RevalidationQueue};

/// Shared application state.
pub struct AppState<S: DealerStore> {
    /// Server configuration.
    pub config: Config,
    /// Dealer store.
    pub store: S,
    /// Identity-provider token verifier.
    pub verifier: TokenVerifier,
    /// Vision model client (absent when AI features are not configured).
    pub vision: Option<VisionClient>,
    /// Stale view paths awaiting revalidation.
    pub revalidation: RwLock<RevalidationQueue>,
}

impl<S: DealerStore> AppState<S> {
    /// Creates new application state.
    pub fn new(
        config: Config,
        store: S,
        verifier: TokenVerifier,
        vision: Option<VisionClient>,
    ) -> Self {
        Self {
            config,
            store,
            verifier,
            vision,
            revalidation: RwLock::new(RevalidationQueue::new()),
        }
    }

    /// Folds workflow cache events into the revalidation queue.
    pub async fn record_events(&self, events: &[CacheEvent]) {
        if events.is_empty() {
            return;
        }
        let mut queue = self.revalidation.write().await;
        queue.record_all(events);
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state.
pub fn create_shared_state<S: DealerStore>(
    config: Config,
    store: S,
    verifier: TokenVerifier,
    vision: Option<VisionClient>,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, verifier, vision))
}
