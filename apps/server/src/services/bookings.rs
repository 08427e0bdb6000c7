//! Test-drive booking workflow.
//!
//! All operations take the resolved caller explicitly and return tagged
//! errors; mutations additionally return the cache events they produced so
//! the HTTP layer can fold them into the revalidation queue.

use chrono::{NaiveDate, NaiveTime};
use dealer_store::{BookingFilter, DealerStore};
use entities::{Booking, BookingStatus, Car};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::revalidation::CacheEvent;

/// A booking create/cancel request, already parsed at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct BookTestDrive {
    pub car_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
}

fn parse_time(value: &str, field: &str) -> ServerResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ServerError::InvalidRequest(format!("Invalid {field}: expected HH:MM")))
}

/// Books a test drive for the caller.
///
/// The car must exist and be AVAILABLE. Slot uniqueness is enforced
/// atomically by the store; a losing concurrent request surfaces as
/// [`ServerError::SlotConflict`].
pub async fn book_test_drive<S: DealerStore>(
    store: &S,
    caller: &AuthenticatedUser,
    request: BookTestDrive,
) -> ServerResult<(Booking, Vec<CacheEvent>)> {
    let start = parse_time(&request.start_time, "start_time")?;
    let end = parse_time(&request.end_time, "end_time")?;
    if start >= end {
        return Err(ServerError::InvalidRequest(
            "start_time must be before end_time".to_string(),
        ));
    }

    let car = store
        .get_car(request.car_id)
        .await?
        .filter(Car::is_available)
        .ok_or_else(|| ServerError::NotFound("Car not available for test drive".to_string()))?;

    let mut booking = Booking::new(
        car.id,
        caller.id,
        request.booking_date,
        request.start_time,
        request.end_time,
    );
    booking.notes = request.notes;

    let booking = store.create_booking(booking).await?;

    tracing::info!(
        booking_id = %booking.id,
        car_id = %car.id,
        user_id = %caller.id,
        date = %booking.booking_date,
        "Test drive booked"
    );

    let events = vec![
        CacheEvent::CarBookingsChanged { car_id: car.id },
        CacheEvent::ReservationsChanged,
        CacheEvent::AdminBookingsChanged,
    ];
    Ok((booking, events))
}

/// Lists the caller's test drives, newest booking date first, each joined
/// with its car.
pub async fn list_user_test_drives<S: DealerStore>(
    store: &S,
    caller: &AuthenticatedUser,
) -> ServerResult<Vec<(Booking, Option<Car>)>> {
    let filter = BookingFilter {
        user_id: Some(caller.id),
        ..Default::default()
    };
    let bookings = store.list_bookings(filter).await?;

    let mut result = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let car = store.get_car(booking.car_id).await?;
        result.push((booking, car));
    }
    Ok(result)
}

/// Cancels a test drive.
///
/// Permitted for the booking owner or an admin. Terminal bookings fail with
/// an explicit state-transition error and are never mutated.
pub async fn cancel_test_drive<S: DealerStore>(
    store: &S,
    caller: &AuthenticatedUser,
    booking_id: Uuid,
) -> ServerResult<(Booking, Vec<CacheEvent>)> {
    let booking = store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Booking not found".to_string()))?;

    if booking.user_id != caller.id && !caller.is_admin() {
        return Err(ServerError::PermissionDenied(
            "Not allowed to cancel this booking".to_string(),
        ));
    }

    match booking.status {
        BookingStatus::Cancelled => {
            return Err(ServerError::InvalidStateTransition(
                "Booking is already cancelled".to_string(),
            ));
        }
        BookingStatus::Completed => {
            return Err(ServerError::InvalidStateTransition(
                "Completed booking cannot be cancelled".to_string(),
            ));
        }
        _ => {}
    }

    let booking = store
        .update_booking_status(booking_id, BookingStatus::Cancelled)
        .await?;

    tracing::info!(
        booking_id = %booking.id,
        cancelled_by = %caller.id,
        "Test drive cancelled"
    );

    let events = vec![
        CacheEvent::CarBookingsChanged { car_id: booking.car_id },
        CacheEvent::ReservationsChanged,
        CacheEvent::AdminBookingsChanged,
    ];
    Ok((booking, events))
}

/// Admin transition of a booking to any allowed status.
pub async fn update_booking_status<S: DealerStore>(
    store: &S,
    caller: &AuthenticatedUser,
    booking_id: Uuid,
    status: BookingStatus,
) -> ServerResult<(Booking, Vec<CacheEvent>)> {
    if !caller.is_admin() {
        return Err(ServerError::PermissionDenied(
            "Admin access required".to_string(),
        ));
    }
    if status == BookingStatus::Pending {
        return Err(ServerError::InvalidRequest(
            "Bookings cannot be moved back to PENDING".to_string(),
        ));
    }

    // Existence check first so an absent booking reads as 404, not 409.
    store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Booking not found".to_string()))?;

    let booking = store.update_booking_status(booking_id, status).await?;

    tracing::info!(
        booking_id = %booking.id,
        status = ?booking.status,
        "Booking status updated"
    );

    let events = vec![
        CacheEvent::CarBookingsChanged { car_id: booking.car_id },
        CacheEvent::ReservationsChanged,
        CacheEvent::AdminBookingsChanged,
    ];
    Ok((booking, events))
}
