//! Wire data types.
//!
//! Dates and timestamps cross the wire in canonical textual form: booking
//! dates as ISO-8601 calendar dates, timestamps as RFC 3339.

use entities::{BookingStatus, CarStatus, UserRole};
use serde::{Deserialize, Serialize};

/// A car as presented to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarView {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: i32,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub seats: Option<i32>,
    pub description: String,
    pub status: CarStatus,
    pub featured: bool,
    pub images: Vec<String>,
    /// Whether the requesting user has the car on their wishlist. Always
    /// false for anonymous requests.
    pub wishlisted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A test-drive booking as presented to its owner, joined with its car.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    pub id: String,
    pub car_id: String,
    pub car: Option<CarView>,
    /// ISO-8601 calendar date.
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// The booking owner, shown in admin views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingUserView {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
}

/// A booking in the admin back-office, joined with car and customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminBookingView {
    #[serde(flatten)]
    pub booking: BookingView,
    pub user: Option<BookingUserView>,
}

/// Car detail fields extracted from an image by the vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCarDetails {
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: String,
    pub body_type: String,
    pub fuel_type: String,
    pub transmission: String,
    pub price: Option<f64>,
    pub mileage: Option<i32>,
    pub description: String,
    pub confidence: f64,
}

/// Filters the vision model detected in a search image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedCarFilters {
    pub make: Option<String>,
    pub body_type: Option<String>,
    pub color: Option<String>,
}

/// Car inventory counts for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarCounts {
    pub total: u32,
    pub available: u32,
    pub unavailable: u32,
    pub sold: u32,
    pub featured: u32,
}

/// Test-drive booking counts for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingCounts {
    pub total: u32,
    pub pending: u32,
    pub confirmed: u32,
    pub completed: u32,
    pub cancelled: u32,
    pub no_show: u32,
    /// Completed bookings as a fraction of all bookings.
    pub conversion_rate: f64,
}

/// Admin dashboard summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub cars: CarCounts,
    pub test_drives: BookingCounts,
}

/// Bounds of catalog prices, for the browse page sliders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}
