//! Public catalog endpoints.
//!
//! Browsing never requires authentication; a present caller only enriches
//! the results with wishlist flags.

use std::collections::HashSet;

use api_protocol::{
    CarFacetsRequest, CarFacetsResponse, DetectedCarFilters, FeaturedCarsRequest,
    FeaturedCarsResponse, GetCarRequest, GetCarResponse, ImageSearchRequest, ImageSearchResponse,
    ListCarsRequest, ListCarsResponse, ListSavedCarsRequest, ListSavedCarsResponse, PriceRange,
    ToggleSavedCarRequest, ToggleSavedCarResponse,
};
use axum::{Extension, Json, extract::State};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use dealer_store::{CarFilter, DealerStore};
use entities::CarStatus;
use uuid::Uuid;

use crate::api::{car_view, page_count, page_params, parse_id};
use crate::error::{ServerError, ServerResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::revalidation::CacheEvent;
use crate::state::SharedState;

/// Fuel types offered by the browse filters.
const FUEL_TYPES: &[&str] = &["Petrol", "Diesel", "Electric", "Hybrid", "Plug-in Hybrid"];

/// Transmissions offered by the browse filters.
const TRANSMISSIONS: &[&str] = &["Automatic", "Manual", "Semi-Automatic"];

const DEFAULT_FEATURED_LIMIT: u32 = 6;

/// IDs of the caller's saved cars, or an empty set for anonymous requests.
async fn wishlist_ids<S: DealerStore>(
    state: &SharedState<S>,
    caller: Option<&AuthenticatedUser>,
) -> ServerResult<HashSet<Uuid>> {
    match caller {
        Some(user) => Ok(state.store.saved_car_ids(user.id).await?.into_iter().collect()),
        None => Ok(HashSet::new()),
    }
}

/// Lists available cars matching the requested filters.
pub async fn list_cars<S: DealerStore>(
    State(state): State<SharedState<S>>,
    caller: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<ListCarsRequest>,
) -> ServerResult<Json<ListCarsResponse>> {
    let (limit, offset) = page_params(request.page, request.page_size);
    let filter = CarFilter {
        search: request.search,
        make: request.make,
        body_type: request.body_type,
        fuel_type: request.fuel_type,
        transmission: request.transmission,
        status: Some(CarStatus::Available),
        min_price: request.min_price,
        max_price: request.max_price,
        sort: request.sort.unwrap_or_default(),
        limit: Some(limit),
        offset: Some(offset),
        ..Default::default()
    };

    let (cars, total_count) = state.store.list_cars(filter).await?;
    let saved = wishlist_ids(&state, caller.as_deref()).await?;

    Ok(Json(ListCarsResponse {
        cars: cars
            .iter()
            .map(|car| car_view(car, saved.contains(&car.id)))
            .collect(),
        total_count,
        page_count: page_count(total_count, request.page_size),
    }))
}

/// Fetches a single car by ID.
pub async fn get_car<S: DealerStore>(
    State(state): State<SharedState<S>>,
    caller: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<GetCarRequest>,
) -> ServerResult<Json<GetCarResponse>> {
    let car_id = parse_id(&request.car_id, "car_id")?;
    let car = state
        .store
        .get_car(car_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Car not found".to_string()))?;

    let wishlisted = match caller {
        Some(Extension(user)) => state.store.is_car_saved(user.id, car.id).await?,
        None => false,
    };

    Ok(Json(GetCarResponse {
        car: car_view(&car, wishlisted),
    }))
}

/// Lists featured available cars for the homepage.
pub async fn featured_cars<S: DealerStore>(
    State(state): State<SharedState<S>>,
    caller: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<FeaturedCarsRequest>,
) -> ServerResult<Json<FeaturedCarsResponse>> {
    let filter = CarFilter {
        status: Some(CarStatus::Available),
        featured: Some(true),
        limit: Some(request.limit.unwrap_or(DEFAULT_FEATURED_LIMIT)),
        ..Default::default()
    };

    let (cars, _) = state.store.list_cars(filter).await?;
    let saved = wishlist_ids(&state, caller.as_deref()).await?;

    Ok(Json(FeaturedCarsResponse {
        cars: cars
            .iter()
            .map(|car| car_view(car, saved.contains(&car.id)))
            .collect(),
    }))
}

/// Returns the filter facets for the browse page.
pub async fn car_facets<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Json(CarFacetsRequest {}): Json<CarFacetsRequest>,
) -> ServerResult<Json<CarFacetsResponse>> {
    let makes = state.store.distinct_makes().await?;
    let body_types = state.store.distinct_body_types().await?;

    let (cars, _) = state
        .store
        .list_cars(CarFilter {
            status: Some(CarStatus::Available),
            ..Default::default()
        })
        .await?;
    let price_range = cars.iter().fold(PriceRange::default(), |mut range, car| {
        if range.min == 0.0 || car.price < range.min {
            range.min = car.price;
        }
        if car.price > range.max {
            range.max = car.price;
        }
        range
    });

    Ok(Json(CarFacetsResponse {
        makes,
        body_types,
        fuel_types: FUEL_TYPES.iter().map(|s| s.to_string()).collect(),
        transmissions: TRANSMISSIONS.iter().map(|s| s.to_string()).collect(),
        price_range,
    }))
}

/// Searches the catalog with filters extracted from an uploaded image.
pub async fn image_search<S: DealerStore>(
    State(state): State<SharedState<S>>,
    caller: Option<Extension<AuthenticatedUser>>,
    Json(request): Json<ImageSearchRequest>,
) -> ServerResult<Json<ImageSearchResponse>> {
    let vision = state.vision.as_ref().ok_or(ServerError::AiUnavailable)?;
    let image = STANDARD
        .decode(&request.image_base64)
        .map_err(|_| ServerError::InvalidRequest("Invalid image_base64".to_string()))?;
    let mime_type = request.mime_type.as_deref().unwrap_or("image/jpeg");

    let params = vision.image_search_params(&image, mime_type).await?;
    let detected = DetectedCarFilters {
        make: params.make.clone(),
        body_type: params.body_type.clone(),
        color: params.color.clone(),
    };

    let (limit, offset) = page_params(request.page, request.page_size);
    // Color has no dedicated column; it rides the free-text search instead.
    let filter = CarFilter {
        search: params.color,
        make: params.make,
        body_type: params.body_type,
        status: Some(CarStatus::Available),
        limit: Some(limit),
        offset: Some(offset),
        ..Default::default()
    };

    let (cars, total_count) = state.store.list_cars(filter).await?;
    let saved = wishlist_ids(&state, caller.as_deref()).await?;

    Ok(Json(ImageSearchResponse {
        detected,
        cars: cars
            .iter()
            .map(|car| car_view(car, saved.contains(&car.id)))
            .collect(),
        total_count,
        page_count: page_count(total_count, request.page_size),
    }))
}

/// Toggles a car's membership on the caller's wishlist.
pub async fn toggle_saved_car<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<ToggleSavedCarRequest>,
) -> ServerResult<Json<ToggleSavedCarResponse>> {
    let car_id = parse_id(&request.car_id, "car_id")?;
    state
        .store
        .get_car(car_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Car not found".to_string()))?;

    let (saved, message) = if state.store.is_car_saved(caller.id, car_id).await? {
        state.store.unsave_car(caller.id, car_id).await?;
        (false, "Car removed from favorites")
    } else {
        state.store.save_car(caller.id, car_id).await?;
        (true, "Car added to favorites")
    };

    tracing::debug!(user_id = %caller.id, car_id = %car_id, saved, "Wishlist toggled");
    state.record_events(&[CacheEvent::WishlistChanged]).await;

    Ok(Json(ToggleSavedCarResponse {
        saved,
        message: message.to_string(),
    }))
}

/// Lists the caller's saved cars, most recently saved first.
pub async fn list_saved_cars<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(ListSavedCarsRequest {}): Json<ListSavedCarsRequest>,
) -> ServerResult<Json<ListSavedCarsResponse>> {
    let cars = state.store.list_saved_cars(caller.id).await?;
    Ok(Json(ListSavedCarsResponse {
        cars: cars.iter().map(|car| car_view(car, true)).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use dealer_store::MemoryDealerStore;
    use entities::{Car, UserRole};
    use identity::{IdentityConfig, TokenVerifier};

    use super::*;
    use crate::config::Config;
    use crate::state::create_shared_state;

    fn test_state() -> SharedState<MemoryDealerStore> {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-long-enough-for-hs256".to_string(),
            admin_emails: Vec::new(),
            gemini_api_key: None,
            gemini_model: None,
            log_level: "info".to_string(),
        };
        let verifier = TokenVerifier::new(IdentityConfig::new(config.jwt_secret.clone()));
        create_shared_state(config, MemoryDealerStore::new(), verifier, None)
    }

    fn test_caller() -> AuthenticatedUser {
        let id = Uuid::new_v4();
        AuthenticatedUser {
            id,
            external_id: format!("provider|{id}"),
            email: format!("{id}@example.com"),
            role: UserRole::User,
        }
    }

    async fn seed_car(state: &SharedState<MemoryDealerStore>, make: &str, price: f64) -> Car {
        state
            .store
            .create_car(Car::new(make, "Test", 2023, price))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_cars_anonymous_has_no_wishlist_flags() {
        let state = test_state();
        seed_car(&state, "Tesla", 30000.0).await;

        let response = list_cars(
            State(state),
            None,
            Json(ListCarsRequest {
                page: 1,
                page_size: 12,
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.cars.len(), 1);
        assert!(!response.cars[0].wishlisted);
        assert_eq!(response.total_count, 1);
        assert_eq!(response.page_count, 1);
    }

    #[tokio::test]
    async fn test_list_cars_marks_saved_cars() {
        let state = test_state();
        let car = seed_car(&state, "Tesla", 30000.0).await;
        seed_car(&state, "BMW", 50000.0).await;
        let caller = test_caller();
        state.store.save_car(caller.id, car.id).await.unwrap();

        let response = list_cars(
            State(state),
            Some(Extension(caller)),
            Json(ListCarsRequest {
                page: 1,
                page_size: 12,
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let flags: Vec<(String, bool)> = response
            .cars
            .iter()
            .map(|c| (c.make.clone(), c.wishlisted))
            .collect();
        assert!(flags.contains(&("Tesla".to_string(), true)));
        assert!(flags.contains(&("BMW".to_string(), false)));
    }

    #[tokio::test]
    async fn test_get_car_unknown_id() {
        let state = test_state();
        let err = get_car(
            State(state),
            None,
            Json(GetCarRequest {
                car_id: Uuid::new_v4().to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_saved_round_trip() {
        let state = test_state();
        let car = seed_car(&state, "Tesla", 30000.0).await;
        let caller = test_caller();

        let on = toggle_saved_car(
            State(state.clone()),
            Extension(caller.clone()),
            Json(ToggleSavedCarRequest {
                car_id: car.id.to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(on.saved);

        let off = toggle_saved_car(
            State(state.clone()),
            Extension(caller.clone()),
            Json(ToggleSavedCarRequest {
                car_id: car.id.to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!off.saved);

        let listed = list_saved_cars(
            State(state),
            Extension(caller),
            Json(ListSavedCarsRequest {}),
        )
        .await
        .unwrap();
        assert!(listed.cars.is_empty());
    }

    #[tokio::test]
    async fn test_facets_report_price_range() {
        let state = test_state();
        seed_car(&state, "Tesla", 30000.0).await;
        seed_car(&state, "BMW", 95000.0).await;

        let facets = car_facets(State(state), Json(CarFacetsRequest {}))
            .await
            .unwrap();
        assert_eq!(facets.makes.len(), 2);
        assert_eq!(facets.price_range.min, 30000.0);
        assert_eq!(facets.price_range.max, 95000.0);
        assert!(!facets.fuel_types.is_empty());
    }

    #[tokio::test]
    async fn test_image_search_without_vision_is_unavailable() {
        let state = test_state();
        let err = image_search(
            State(state),
            None,
            Json(ImageSearchRequest {
                image_base64: STANDARD.encode(b"fake image"),
                mime_type: None,
                page: 1,
                page_size: 12,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServerError::AiUnavailable));
    }
}
