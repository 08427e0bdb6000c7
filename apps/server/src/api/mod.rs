//! HTTP API surface.
//!
//! All business endpoints are POST with JSON bodies; the two GET endpoints
//! (`/health`, `/api/cache/stale`) carry no request body.

pub mod admin;
pub mod catalog;
pub mod test_drive;

use api_protocol::{BookingUserView, BookingView, CarView, StaleViewsResponse};
use axum::{
    Json, Router, middleware,
    extract::State,
    routing::{get, post},
};
use dealer_store::DealerStore;
use entities::{Booking, Car, User};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::middleware::auth;
use crate::state::SharedState;

const MAX_PAGE_SIZE: u32 = 100;

/// Parses a wire UUID, naming the offending field on failure.
pub(crate) fn parse_id(value: &str, field: &str) -> ServerResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| ServerError::InvalidRequest(format!("Invalid {field}: not a UUID")))
}

/// Converts 1-based page parameters into a store limit and offset.
pub(crate) fn page_params(page: u32, page_size: u32) -> (u32, u32) {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    (page_size, (page - 1) * page_size)
}

/// Number of pages needed for `total` results.
pub(crate) fn page_count(total: u32, page_size: u32) -> u32 {
    total.div_ceil(page_size.clamp(1, MAX_PAGE_SIZE))
}

pub(crate) fn car_view(car: &Car, wishlisted: bool) -> CarView {
    CarView {
        id: car.id.to_string(),
        make: car.make.clone(),
        model: car.model.clone(),
        year: car.year,
        price: car.price,
        mileage: car.mileage,
        color: car.color.clone(),
        fuel_type: car.fuel_type.clone(),
        transmission: car.transmission.clone(),
        body_type: car.body_type.clone(),
        seats: car.seats,
        description: car.description.clone(),
        status: car.status,
        featured: car.featured,
        images: car.images.clone(),
        wishlisted,
        created_at: car.created_at.to_rfc3339(),
        updated_at: car.updated_at.to_rfc3339(),
    }
}

pub(crate) fn booking_view(booking: &Booking, car: Option<CarView>) -> BookingView {
    BookingView {
        id: booking.id.to_string(),
        car_id: booking.car_id.to_string(),
        car,
        booking_date: booking.booking_date.to_string(),
        start_time: booking.start_time.clone(),
        end_time: booking.end_time.clone(),
        notes: booking.notes.clone(),
        status: booking.status,
        created_at: booking.created_at.to_rfc3339(),
        updated_at: booking.updated_at.to_rfc3339(),
    }
}

pub(crate) fn booking_user_view(user: &User) -> BookingUserView {
    BookingUserView {
        id: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
    }
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "driveline-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Drains the stale view paths accumulated since the last call.
async fn stale_views<S: DealerStore>(
    State(state): State<SharedState<S>>,
) -> Json<StaleViewsResponse> {
    let paths = state.revalidation.write().await.take();
    Json(StaleViewsResponse { paths })
}

/// Builds the complete application router.
pub fn create_router<S: DealerStore + 'static>(state: SharedState<S>) -> Router {
    // Catalog endpoints are public; authentication only enriches them with
    // wishlist flags.
    let public = Router::new()
        .route("/api/car/list", post(catalog::list_cars))
        .route("/api/car/get", post(catalog::get_car))
        .route("/api/car/featured", post(catalog::featured_cars))
        .route("/api/car/facets", post(catalog::car_facets))
        .route("/api/car/image-search", post(catalog::image_search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_auth_middleware::<S>,
        ));

    let authed = Router::new()
        .route("/api/car/toggle-saved", post(catalog::toggle_saved_car))
        .route("/api/car/saved", post(catalog::list_saved_cars))
        .route("/api/test-drive/book", post(test_drive::book_test_drive))
        .route("/api/test-drive/list", post(test_drive::list_user_test_drives))
        .route("/api/test-drive/cancel", post(test_drive::cancel_test_drive))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware::<S>,
        ));

    // route_layer runs later-added layers first, so authentication precedes
    // the admin check.
    let admin = Router::new()
        .route("/api/admin/car/create", post(admin::create_car))
        .route("/api/admin/car/list", post(admin::list_cars))
        .route("/api/admin/car/update", post(admin::update_car))
        .route("/api/admin/car/delete", post(admin::delete_car))
        .route("/api/admin/car/extract-details", post(admin::extract_car_details))
        .route("/api/admin/test-drive/list", post(admin::list_test_drives))
        .route(
            "/api/admin/test-drive/update-status",
            post(admin::update_test_drive_status),
        )
        .route("/api/admin/dashboard", post(admin::dashboard))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware::<S>,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/cache/stale", get(stale_views::<S>))
        .merge(public)
        .merge(authed)
        .merge(admin)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use dealer_store::MemoryDealerStore;
    use identity::{IdentityConfig, TokenVerifier};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::state::create_shared_state;

    fn test_state() -> SharedState<MemoryDealerStore> {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-long-enough-for-hs256".to_string(),
            admin_emails: vec!["admin@example.com".to_string()],
            gemini_api_key: None,
            gemini_model: None,
            log_level: "info".to_string(),
        };
        let verifier = TokenVerifier::new(IdentityConfig::new(config.jwt_secret.clone()));
        create_shared_state(config, MemoryDealerStore::new(), verifier, None)
    }

    fn json_post(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from("{}")).unwrap()
    }

    #[tokio::test]
    async fn test_router_authenticates_bearer_tokens() {
        let state = test_state();
        let token = state
            .verifier
            .issue_token("provider|r", "r@example.com", None)
            .unwrap();
        let app = create_router(state);

        let ok = app
            .clone()
            .oneshot(json_post("/api/car/saved", Some(&token)))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let denied = app.oneshot(json_post("/api/car/saved", None)).await.unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_reject_non_admins() {
        let state = test_state();
        let token = state
            .verifier
            .issue_token("provider|u", "user@example.com", None)
            .unwrap();
        let app = create_router(state);

        let response = app
            .oneshot(json_post("/api/admin/dashboard", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_anonymous_catalog_access() {
        let app = create_router(test_state());
        let response = app.oneshot(json_post("/api/car/list", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_page_params() {
        assert_eq!(page_params(1, 12), (12, 0));
        assert_eq!(page_params(3, 12), (12, 24));
        // Page 0 is treated as page 1; oversized pages are clamped.
        assert_eq!(page_params(0, 12), (12, 0));
        assert_eq!(page_params(1, 1000), (MAX_PAGE_SIZE, 0));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 12), 0);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid", "car_id").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "car_id").unwrap(), id);
    }
}
