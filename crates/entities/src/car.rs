//! Car-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a car listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CarStatus {
    /// Listed and open for test drives.
    Available,
    /// Temporarily withdrawn from the catalog.
    Unavailable,
    /// Sold.
    Sold,
}

impl Default for CarStatus {
    fn default() -> Self {
        Self::Available
    }
}

/// A car in the dealership inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    /// Unique identifier.
    pub id: Uuid,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Asking price.
    pub price: f64,
    /// Mileage in kilometres.
    pub mileage: i32,
    /// Exterior color.
    pub color: String,
    /// Fuel type (Petrol, Diesel, Electric, Hybrid, ...).
    pub fuel_type: String,
    /// Transmission (Automatic, Manual, ...).
    pub transmission: String,
    /// Body type (SUV, Sedan, Hatchback, ...).
    pub body_type: String,
    /// Number of seats.
    pub seats: Option<i32>,
    /// Free-text description.
    pub description: String,
    /// Current lifecycle status.
    pub status: CarStatus,
    /// Whether the car is featured on the homepage.
    pub featured: bool,
    /// Ordered image URLs.
    pub images: Vec<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Car {
    /// Creates a new available, non-featured car.
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        price: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            make: make.into(),
            model: model.into(),
            year,
            price,
            mileage: 0,
            color: String::new(),
            fuel_type: String::new(),
            transmission: String::new(),
            body_type: String::new(),
            seats: None,
            description: String::new(),
            status: CarStatus::Available,
            featured: false,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the mileage.
    pub fn with_mileage(mut self, mileage: i32) -> Self {
        self.mileage = mileage;
        self
    }

    /// Sets the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Sets the fuel type.
    pub fn with_fuel_type(mut self, fuel_type: impl Into<String>) -> Self {
        self.fuel_type = fuel_type.into();
        self
    }

    /// Sets the transmission.
    pub fn with_transmission(mut self, transmission: impl Into<String>) -> Self {
        self.transmission = transmission.into();
        self
    }

    /// Sets the body type.
    pub fn with_body_type(mut self, body_type: impl Into<String>) -> Self {
        self.body_type = body_type.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: CarStatus) -> Self {
        self.status = status;
        self
    }

    /// Marks the car as featured.
    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }

    /// Sets the image URLs.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Returns true if the car can be booked for a test drive.
    pub fn is_available(&self) -> bool {
        self.status == CarStatus::Available
    }
}

/// A wishlist association between a user and a car.
///
/// Unique per (user, car) pair; created and removed by the toggle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCar {
    /// Owning user ID.
    pub user_id: Uuid,
    /// Saved car ID.
    pub car_id: Uuid,
    /// When the car was saved.
    pub saved_at: DateTime<Utc>,
}

impl SavedCar {
    /// Creates a new saved-car association.
    pub fn new(user_id: Uuid, car_id: Uuid) -> Self {
        Self {
            user_id,
            car_id,
            saved_at: Utc::now(),
        }
    }
}
