//! Admin back-office endpoints.
//!
//! All routes here sit behind the admin guard; handlers assume an
//! authenticated administrator in the request extensions.

use api_protocol::{
    AdminBookingView, AdminListCarsRequest, AdminListCarsResponse, AdminListTestDrivesRequest,
    AdminListTestDrivesResponse, BookingCounts, CarCounts, CreateCarRequest, CreateCarResponse,
    DashboardRequest, DashboardResponse, DashboardSummary, DeleteCarRequest, DeleteCarResponse,
    ExtractCarDetailsRequest, ExtractCarDetailsResponse, ExtractedCarDetails,
    UpdateCarRequest, UpdateCarResponse, UpdateTestDriveStatusRequest,
    UpdateTestDriveStatusResponse,
};
use axum::{Extension, Json, extract::State};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use dealer_store::{BookingFilter, CarFilter, DealerStore};
use entities::{BookingStatus, Car, CarStatus, User};
use vision::CarDetails;

use crate::api::{booking_user_view, booking_view, car_view, page_params, parse_id};
use crate::error::{ServerError, ServerResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::bookings;
use crate::services::revalidation::CacheEvent;
use crate::state::SharedState;

/// Creates a new car listing.
pub async fn create_car<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCarRequest>,
) -> ServerResult<Json<CreateCarResponse>> {
    if request.make.trim().is_empty() || request.model.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "make and model are required".to_string(),
        ));
    }

    let mut car = Car::new(request.make, request.model, request.year, request.price)
        .with_mileage(request.mileage)
        .with_color(request.color)
        .with_fuel_type(request.fuel_type)
        .with_transmission(request.transmission)
        .with_body_type(request.body_type)
        .with_description(request.description)
        .with_featured(request.featured)
        .with_images(request.images);
    car.seats = request.seats;

    let car = state.store.create_car(car).await?;
    tracing::info!(car_id = %car.id, admin = %caller.id, "Car created");
    state
        .record_events(&[
            CacheEvent::CarChanged { car_id: car.id },
            CacheEvent::AdminCarsChanged,
        ])
        .await;

    Ok(Json(CreateCarResponse {
        car: car_view(&car, false),
    }))
}

/// Lists cars of all statuses for the inventory screen.
pub async fn list_cars<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Json(request): Json<AdminListCarsRequest>,
) -> ServerResult<Json<AdminListCarsResponse>> {
    let (limit, offset) = page_params(request.page, request.page_size);
    let filter = CarFilter {
        search: request.search,
        limit: Some(limit),
        offset: Some(offset),
        ..Default::default()
    };

    let (cars, total_count) = state.store.list_cars(filter).await?;
    Ok(Json(AdminListCarsResponse {
        cars: cars.iter().map(|car| car_view(car, false)).collect(),
        total_count,
    }))
}

/// Applies a partial update to a car; absent fields are left unchanged.
pub async fn update_car<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateCarRequest>,
) -> ServerResult<Json<UpdateCarResponse>> {
    let car_id = parse_id(&request.car_id, "car_id")?;
    let mut car = state
        .store
        .get_car(car_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Car not found".to_string()))?;

    if let Some(price) = request.price {
        car.price = price;
    }
    if let Some(mileage) = request.mileage {
        car.mileage = mileage;
    }
    if let Some(description) = request.description {
        car.description = description;
    }
    if let Some(status) = request.status {
        car.status = status;
    }
    if let Some(featured) = request.featured {
        car.featured = featured;
    }
    if let Some(images) = request.images {
        car.images = images;
    }
    car.updated_at = Utc::now();

    let car = state.store.update_car(car).await?;
    tracing::info!(car_id = %car.id, admin = %caller.id, "Car updated");
    state
        .record_events(&[
            CacheEvent::CarChanged { car_id: car.id },
            CacheEvent::AdminCarsChanged,
        ])
        .await;

    Ok(Json(UpdateCarResponse {
        car: car_view(&car, false),
    }))
}

/// Deletes a car listing.
pub async fn delete_car<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<DeleteCarRequest>,
) -> ServerResult<Json<DeleteCarResponse>> {
    let car_id = parse_id(&request.car_id, "car_id")?;
    state.store.delete_car(car_id).await?;

    tracing::info!(car_id = %car_id, admin = %caller.id, "Car deleted");
    state
        .record_events(&[
            CacheEvent::CarChanged { car_id },
            CacheEvent::AdminCarsChanged,
        ])
        .await;

    Ok(Json(DeleteCarResponse {}))
}

fn extracted_details(details: CarDetails) -> ExtractedCarDetails {
    ExtractedCarDetails {
        make: details.make,
        model: details.model,
        year: details.year,
        color: details.color,
        body_type: details.body_type,
        fuel_type: details.fuel_type,
        transmission: details.transmission,
        price: details.price,
        mileage: details.mileage,
        description: details.description,
        confidence: details.confidence,
    }
}

/// Extracts car details from an uploaded image to pre-fill the listing form.
pub async fn extract_car_details<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Json(request): Json<ExtractCarDetailsRequest>,
) -> ServerResult<Json<ExtractCarDetailsResponse>> {
    let vision = state.vision.as_ref().ok_or(ServerError::AiUnavailable)?;
    let image = STANDARD
        .decode(&request.image_base64)
        .map_err(|_| ServerError::InvalidRequest("Invalid image_base64".to_string()))?;
    let mime_type = request.mime_type.as_deref().unwrap_or("image/jpeg");

    let details = vision.extract_car_details(&image, mime_type).await?;
    Ok(Json(ExtractCarDetailsResponse {
        details: extracted_details(details),
    }))
}

fn matches_search(search: &str, user: Option<&User>, car: Option<&Car>) -> bool {
    let needle = search.to_lowercase();
    let user_hit = user.is_some_and(|u| u.email.to_lowercase().contains(&needle));
    let car_hit = car.is_some_and(|c| {
        c.make.to_lowercase().contains(&needle) || c.model.to_lowercase().contains(&needle)
    });
    user_hit || car_hit
}

/// Lists bookings across all customers, joined with car and customer.
pub async fn list_test_drives<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Json(request): Json<AdminListTestDrivesRequest>,
) -> ServerResult<Json<AdminListTestDrivesResponse>> {
    let filter = BookingFilter {
        status: request.status,
        ..Default::default()
    };
    let all = state.store.list_bookings(filter).await?;

    let mut joined = Vec::with_capacity(all.len());
    for booking in all {
        let car = state.store.get_car(booking.car_id).await?;
        let user = state.store.get_user(booking.user_id).await?;
        if let Some(search) = &request.search {
            if !matches_search(search, user.as_ref(), car.as_ref()) {
                continue;
            }
        }
        joined.push(AdminBookingView {
            booking: booking_view(&booking, car.as_ref().map(|c| car_view(c, false))),
            user: user.as_ref().map(booking_user_view),
        });
    }

    // Search happens after the join, so pagination applies last.
    let total_count = joined.len() as u32;
    let (limit, offset) = page_params(request.page, request.page_size);
    let bookings = joined
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    Ok(Json(AdminListTestDrivesResponse {
        bookings,
        total_count,
    }))
}

/// Moves a booking through the status machine.
pub async fn update_test_drive_status<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateTestDriveStatusRequest>,
) -> ServerResult<Json<UpdateTestDriveStatusResponse>> {
    let booking_id = parse_id(&request.booking_id, "booking_id")?;

    let (booking, events) =
        bookings::update_booking_status(&state.store, &caller, booking_id, request.status).await?;
    state.record_events(&events).await;

    let car = state.store.get_car(booking.car_id).await?;
    let user = state.store.get_user(booking.user_id).await?;
    Ok(Json(UpdateTestDriveStatusResponse {
        booking: AdminBookingView {
            booking: booking_view(&booking, car.as_ref().map(|c| car_view(c, false))),
            user: user.as_ref().map(booking_user_view),
        },
    }))
}

/// Inventory and booking counts for the dashboard.
pub async fn dashboard<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Json(DashboardRequest {}): Json<DashboardRequest>,
) -> ServerResult<Json<DashboardResponse>> {
    let (cars, _) = state.store.list_cars(CarFilter::default()).await?;
    let mut car_counts = CarCounts {
        total: cars.len() as u32,
        ..Default::default()
    };
    for car in &cars {
        match car.status {
            CarStatus::Available => car_counts.available += 1,
            CarStatus::Unavailable => car_counts.unavailable += 1,
            CarStatus::Sold => car_counts.sold += 1,
        }
        if car.featured {
            car_counts.featured += 1;
        }
    }

    let bookings = state.store.list_bookings(BookingFilter::default()).await?;
    let mut booking_counts = BookingCounts {
        total: bookings.len() as u32,
        ..Default::default()
    };
    for booking in &bookings {
        match booking.status {
            BookingStatus::Pending => booking_counts.pending += 1,
            BookingStatus::Confirmed => booking_counts.confirmed += 1,
            BookingStatus::Completed => booking_counts.completed += 1,
            BookingStatus::Cancelled => booking_counts.cancelled += 1,
            BookingStatus::NoShow => booking_counts.no_show += 1,
        }
    }
    if booking_counts.total > 0 {
        booking_counts.conversion_rate =
            f64::from(booking_counts.completed) / f64::from(booking_counts.total);
    }

    Ok(Json(DashboardResponse {
        summary: DashboardSummary {
            cars: car_counts,
            test_drives: booking_counts,
        },
    }))
}
