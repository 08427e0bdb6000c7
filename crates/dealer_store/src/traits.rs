//! Dealer store trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;
use entities::{Booking, BookingStatus, Car, CarStatus, User};
use uuid::Uuid;

use crate::StoreResult;

/// Sort order for car listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarSort {
    /// Newest listings first.
    #[default]
    Newest,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
}

/// Filter options for listing cars.
///
/// All supplied filters apply conjunctively. Text matches are
/// case-insensitive; `search` is a substring match over make, model, and
/// description.
#[derive(Debug, Clone, Default)]
pub struct CarFilter {
    /// Free-text search over make/model/description.
    pub search: Option<String>,
    /// Filter by make.
    pub make: Option<String>,
    /// Filter by body type.
    pub body_type: Option<String>,
    /// Filter by fuel type.
    pub fuel_type: Option<String>,
    /// Filter by transmission.
    pub transmission: Option<String>,
    /// Filter by lifecycle status.
    pub status: Option<CarStatus>,
    /// Only featured cars.
    pub featured: Option<bool>,
    /// Minimum price, inclusive.
    pub min_price: Option<f64>,
    /// Maximum price, inclusive.
    pub max_price: Option<f64>,
    /// Sort order.
    pub sort: CarSort,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

/// Filter options for listing bookings.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Filter by owning user ID.
    pub user_id: Option<Uuid>,
    /// Filter by car ID.
    pub car_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<BookingStatus>,
    /// Filter by booking date.
    pub booking_date: Option<NaiveDate>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

/// Trait for dealership storage operations.
#[async_trait]
pub trait DealerStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user.
    async fn create_user(&self, user: User) -> StoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Gets a user by external identity-provider subject.
    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    // =========================================================================
    // Car operations
    // =========================================================================

    /// Creates a new car.
    async fn create_car(&self, car: Car) -> StoreResult<Car>;

    /// Gets a car by ID.
    async fn get_car(&self, id: Uuid) -> StoreResult<Option<Car>>;

    /// Lists cars matching the filter, returning the page and the total
    /// number of matches before pagination.
    async fn list_cars(&self, filter: CarFilter) -> StoreResult<(Vec<Car>, u32)>;

    /// Updates a car.
    async fn update_car(&self, car: Car) -> StoreResult<Car>;

    /// Deletes a car and its wishlist entries. Booking history referencing
    /// the car is left in place (bookings are never physically deleted).
    async fn delete_car(&self, id: Uuid) -> StoreResult<()>;

    /// Lists the distinct makes present in the catalog.
    async fn distinct_makes(&self) -> StoreResult<Vec<String>>;

    /// Lists the distinct body types present in the catalog.
    async fn distinct_body_types(&self) -> StoreResult<Vec<String>>;

    // =========================================================================
    // Booking operations
    // =========================================================================

    /// Creates a new booking.
    ///
    /// The slot-uniqueness invariant is enforced here atomically: if another
    /// booking with an active status (PENDING or CONFIRMED) already holds the
    /// same (car, date, start time) slot, the insert fails with
    /// [`StoreError::SlotConflict`](crate::StoreError::SlotConflict) and no
    /// row is written.
    async fn create_booking(&self, booking: Booking) -> StoreResult<Booking>;

    /// Gets a booking by ID.
    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Lists bookings matching the filter, newest booking date first.
    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>>;

    /// Updates a booking's status.
    ///
    /// Fails with `InvalidStateTransition` if the transition is not allowed
    /// by [`BookingStatus::can_transition_to`]. The stored record is left
    /// untouched on failure.
    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Booking>;

    // =========================================================================
    // Saved car operations
    // =========================================================================

    /// Saves a car to a user's wishlist. Idempotent.
    async fn save_car(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<()>;

    /// Removes a car from a user's wishlist. Returns true if it was present.
    async fn unsave_car(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<bool>;

    /// Returns true if the car is on the user's wishlist.
    async fn is_car_saved(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<bool>;

    /// Returns the IDs of all cars on the user's wishlist.
    async fn saved_car_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Lists the cars on a user's wishlist, most recently saved first.
    async fn list_saved_cars(&self, user_id: Uuid) -> StoreResult<Vec<Car>>;
}
