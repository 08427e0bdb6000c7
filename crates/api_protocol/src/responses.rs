//! Wire response types.

use serde::{Deserialize, Serialize};

use crate::types::*;

// ============================================================================
// Catalog responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCarsResponse {
    pub cars: Vec<CarView>,
    pub total_count: u32,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCarResponse {
    pub car: CarView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedCarsResponse {
    pub cars: Vec<CarView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarFacetsResponse {
    pub makes: Vec<String>,
    pub body_types: Vec<String>,
    pub fuel_types: Vec<String>,
    pub transmissions: Vec<String>,
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchResponse {
    /// Filters detected in the uploaded image.
    pub detected: DetectedCarFilters,
    pub cars: Vec<CarView>,
    pub total_count: u32,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleSavedCarResponse {
    /// Membership after the toggle.
    pub saved: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSavedCarsResponse {
    pub cars: Vec<CarView>,
}

// ============================================================================
// Test-drive responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookTestDriveResponse {
    pub booking: BookingView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUserTestDrivesResponse {
    pub bookings: Vec<BookingView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTestDriveResponse {
    pub booking: BookingView,
}

// ============================================================================
// Admin responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCarResponse {
    pub car: CarView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminListCarsResponse {
    pub cars: Vec<CarView>,
    pub total_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCarResponse {
    pub car: CarView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCarResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractCarDetailsResponse {
    pub details: ExtractedCarDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminListTestDrivesResponse {
    pub bookings: Vec<AdminBookingView>,
    pub total_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTestDriveStatusResponse {
    pub booking: AdminBookingView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
}

// ============================================================================
// Cache invalidation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleViewsResponse {
    /// View paths invalidated since the last drain.
    pub paths: Vec<String>,
}
