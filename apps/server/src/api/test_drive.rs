//! Test-drive endpoints for customers.
//!
//! Thin HTTP adapters over [`crate::services::bookings`]: parse the wire
//! shapes, run the workflow, fold the returned cache events into the
//! revalidation queue, and render the views.

use api_protocol::{
    BookTestDriveRequest, BookTestDriveResponse, CancelTestDriveRequest, CancelTestDriveResponse,
    ListUserTestDrivesRequest, ListUserTestDrivesResponse,
};
use axum::{Extension, Json, extract::State};
use chrono::NaiveDate;
use dealer_store::DealerStore;

use crate::api::{booking_view, car_view, parse_id};
use crate::error::{ServerError, ServerResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::bookings::{self, BookTestDrive};
use crate::state::SharedState;

fn parse_booking_date(value: &str) -> ServerResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ServerError::InvalidRequest("Invalid booking_date: expected YYYY-MM-DD".to_string()))
}

/// Books a test drive for the caller.
pub async fn book_test_drive<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<BookTestDriveRequest>,
) -> ServerResult<Json<BookTestDriveResponse>> {
    let request = BookTestDrive {
        car_id: parse_id(&request.car_id, "car_id")?,
        booking_date: parse_booking_date(&request.booking_date)?,
        start_time: request.start_time,
        end_time: request.end_time,
        notes: request.notes,
    };

    let (booking, events) = bookings::book_test_drive(&state.store, &caller, request).await?;
    state.record_events(&events).await;

    let car = state.store.get_car(booking.car_id).await?;
    let car = car.as_ref().map(|c| car_view(c, false));
    Ok(Json(BookTestDriveResponse {
        booking: booking_view(&booking, car),
    }))
}

/// Lists the caller's test drives, newest first, joined with their cars.
pub async fn list_user_test_drives<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(ListUserTestDrivesRequest {}): Json<ListUserTestDrivesRequest>,
) -> ServerResult<Json<ListUserTestDrivesResponse>> {
    let drives = bookings::list_user_test_drives(&state.store, &caller).await?;
    let bookings = drives
        .iter()
        .map(|(booking, car)| booking_view(booking, car.as_ref().map(|c| car_view(c, false))))
        .collect();
    Ok(Json(ListUserTestDrivesResponse { bookings }))
}

/// Cancels a test drive owned by the caller (admins may cancel any).
pub async fn cancel_test_drive<S: DealerStore>(
    State(state): State<SharedState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(request): Json<CancelTestDriveRequest>,
) -> ServerResult<Json<CancelTestDriveResponse>> {
    let booking_id = parse_id(&request.booking_id, "booking_id")?;

    let (booking, events) =
        bookings::cancel_test_drive(&state.store, &caller, booking_id).await?;
    state.record_events(&events).await;

    Ok(Json(CancelTestDriveResponse {
        booking: booking_view(&booking, None),
    }))
}
