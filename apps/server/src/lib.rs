//! Driveline dealership server library.
//!
//! Wires the dealer store, identity verification, and the vision client into
//! an axum application.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

use axum::Router;
use dealer_store::DealerStore;
use identity::{IdentityConfig, TokenVerifier};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vision::VisionClient;

pub use config::Config;
pub use error::{ServerError, ServerResult};
pub use state::{AppState, SharedState, create_shared_state};

/// Builds shared application state from the configuration and a store.
pub fn create_state<S: DealerStore>(config: Config, store: S) -> SharedState<S> {
    let verifier = TokenVerifier::new(IdentityConfig::new(config.jwt_secret.clone()));

    let vision = config.gemini_api_key.as_ref().map(|key| {
        let client = VisionClient::new(key.clone());
        match &config.gemini_model {
            Some(model) => client.with_model(model.clone()),
            None => client,
        }
    });
    if vision.is_none() {
        tracing::warn!("Vision API key not configured; AI endpoints will be unavailable");
    }

    create_shared_state(config, store, verifier, vision)
}

/// Builds the application router with tracing and CORS layers applied.
pub fn create_app<S: DealerStore + 'static>(state: SharedState<S>) -> Router {
    api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
