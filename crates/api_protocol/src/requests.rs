//! Wire request types.

use dealer_store::CarSort;
use entities::{BookingStatus, CarStatus};
use serde::{Deserialize, Serialize};

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    12
}

// ============================================================================
// Catalog requests
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCarsRequest {
    pub search: Option<String>,
    pub make: Option<String>,
    pub body_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<CarSort>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCarRequest {
    pub car_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturedCarsRequest {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarFacetsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSearchRequest {
    /// Base64-encoded image bytes.
    pub image_base64: String,
    /// MIME type of the image; defaults to JPEG.
    pub mime_type: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleSavedCarRequest {
    pub car_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSavedCarsRequest {}

// ============================================================================
// Test-drive requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookTestDriveRequest {
    pub car_id: String,
    /// ISO-8601 calendar date.
    pub booking_date: String,
    /// Local start time, "HH:MM".
    pub start_time: String,
    /// Local end time, "HH:MM".
    pub end_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUserTestDrivesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTestDriveRequest {
    pub booking_id: String,
}

// ============================================================================
// Admin requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCarRequest {
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
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminListCarsRequest {
    /// Substring search over make, model, and description.
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Partial car update; absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCarRequest {
    pub car_id: String,
    pub price: Option<f64>,
    pub mileage: Option<i32>,
    pub description: Option<String>,
    pub status: Option<CarStatus>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCarRequest {
    pub car_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractCarDetailsRequest {
    /// Base64-encoded image bytes.
    pub image_base64: String,
    /// MIME type of the image; defaults to JPEG.
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminListTestDrivesRequest {
    pub status: Option<BookingStatus>,
    /// Substring search over customer email and car make/model.
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTestDriveStatusRequest {
    pub booking_id: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardRequest {}
