//! In-memory dealer store implementation for testing.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use entities::{Booking, BookingStatus, Car, SavedCar, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    BookingFilter, CarFilter, CarSort, DealerStore, StoreError, StoreResult,
};

/// In-memory dealer store for testing purposes.
#[derive(Debug, Default)]
pub struct MemoryDealerStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    cars: Arc<RwLock<HashMap<Uuid, Car>>>,
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
    saved_cars: Arc<RwLock<Vec<SavedCar>>>,
}

impl MemoryDealerStore {
    /// Creates a new in-memory dealer store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn matches_car_filter(car: &Car, filter: &CarFilter) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let haystack = format!(
            "{} {} {}",
            car.make.to_lowercase(),
            car.model.to_lowercase(),
            car.description.to_lowercase()
        );
        if !haystack.contains(&needle) {
            return false;
        }
    }
    if let Some(make) = &filter.make {
        if !eq_ignore_case(&car.make, make) {
            return false;
        }
    }
    if let Some(body_type) = &filter.body_type {
        if !eq_ignore_case(&car.body_type, body_type) {
            return false;
        }
    }
    if let Some(fuel_type) = &filter.fuel_type {
        if !eq_ignore_case(&car.fuel_type, fuel_type) {
            return false;
        }
    }
    if let Some(transmission) = &filter.transmission {
        if !eq_ignore_case(&car.transmission, transmission) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if car.status != status {
            return false;
        }
    }
    if let Some(featured) = filter.featured {
        if car.featured != featured {
            return false;
        }
    }
    if let Some(min) = filter.min_price {
        if car.price < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if car.price > max {
            return false;
        }
    }
    true
}

#[async_trait]
impl DealerStore for MemoryDealerStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.external_id == user.external_id) {
            return Err(StoreError::already_exists("User", user.external_id));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    // =========================================================================
    // Car operations
    // =========================================================================

    async fn create_car(&self, car: Car) -> StoreResult<Car> {
        let mut cars = self.cars.write().await;
        if cars.contains_key(&car.id) {
            return Err(StoreError::already_exists("Car", car.id.to_string()));
        }
        cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn get_car(&self, id: Uuid) -> StoreResult<Option<Car>> {
        let cars = self.cars.read().await;
        Ok(cars.get(&id).cloned())
    }

    async fn list_cars(&self, filter: CarFilter) -> StoreResult<(Vec<Car>, u32)> {
        let cars = self.cars.read().await;
        let mut matched: Vec<Car> = cars
            .values()
            .filter(|c| matches_car_filter(c, &filter))
            .cloned()
            .collect();

        match filter.sort {
            CarSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            CarSort::PriceAsc => {
                matched.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
            }
            CarSort::PriceDesc => {
                matched.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(std::cmp::Ordering::Equal))
            }
        }

        let total = matched.len() as u32;
        let offset = filter.offset.unwrap_or(0) as usize;
        let page: Vec<Car> = match filter.limit {
            Some(limit) => matched.into_iter().skip(offset).take(limit as usize).collect(),
            None => matched.into_iter().skip(offset).collect(),
        };

        Ok((page, total))
    }

    async fn update_car(&self, car: Car) -> StoreResult<Car> {
        let mut cars = self.cars.write().await;
        if !cars.contains_key(&car.id) {
            return Err(StoreError::not_found("Car", car.id.to_string()));
        }
        let mut car = car;
        car.updated_at = chrono::Utc::now();
        cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn delete_car(&self, id: Uuid) -> StoreResult<()> {
        let mut cars = self.cars.write().await;
        if cars.remove(&id).is_none() {
            return Err(StoreError::not_found("Car", id.to_string()));
        }
        drop(cars);
        let mut saved = self.saved_cars.write().await;
        saved.retain(|s| s.car_id != id);
        Ok(())
    }

    async fn distinct_makes(&self) -> StoreResult<Vec<String>> {
        let cars = self.cars.read().await;
        let mut makes: Vec<String> = cars.values().map(|c| c.make.clone()).collect();
        makes.sort();
        makes.dedup();
        Ok(makes)
    }

    async fn distinct_body_types(&self) -> StoreResult<Vec<String>> {
        let cars = self.cars.read().await;
        let mut body_types: Vec<String> = cars.values().map(|c| c.body_type.clone()).collect();
        body_types.sort();
        body_types.dedup();
        Ok(body_types)
    }

    // =========================================================================
    // Booking operations
    // =========================================================================

    async fn create_booking(&self, booking: Booking) -> StoreResult<Booking> {
        // The conflict check and the insert happen under one write lock so
        // that two concurrent requests cannot both claim the slot.
        let mut bookings = self.bookings.write().await;
        let occupied = bookings.values().any(|b| {
            b.car_id == booking.car_id
                && b.booking_date == booking.booking_date
                && b.start_time == booking.start_time
                && b.status.is_active()
        });
        if occupied {
            return Err(StoreError::SlotConflict);
        }
        bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| {
                filter.user_id.is_none_or(|id| b.user_id == id)
                    && filter.car_id.is_none_or(|id| b.car_id == id)
                    && filter.status.is_none_or(|s| b.status == s)
                    && filter.booking_date.is_none_or(|d| b.booking_date == d)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.booking_date
                .cmp(&a.booking_date)
                .then(b.created_at.cmp(&a.created_at))
        });

        let offset = filter.offset.unwrap_or(0) as usize;
        let result = match filter.limit {
            Some(limit) => result.into_iter().skip(offset).take(limit as usize).collect(),
            None => result.into_iter().skip(offset).collect(),
        };
        Ok(result)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Booking", id.to_string()))?;
        if !booking.status.can_transition_to(status) {
            return Err(StoreError::invalid_transition(
                format!("{:?}", booking.status),
                format!("{status:?}"),
            ));
        }
        booking.status = status;
        booking.updated_at = chrono::Utc::now();
        Ok(booking.clone())
    }

    // =========================================================================
    // Saved car operations
    // =========================================================================

    async fn save_car(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<()> {
        let mut saved = self.saved_cars.write().await;
        if !saved.iter().any(|s| s.user_id == user_id && s.car_id == car_id) {
            saved.push(SavedCar::new(user_id, car_id));
        }
        Ok(())
    }

    async fn unsave_car(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<bool> {
        let mut saved = self.saved_cars.write().await;
        let before = saved.len();
        saved.retain(|s| !(s.user_id == user_id && s.car_id == car_id));
        Ok(saved.len() < before)
    }

    async fn is_car_saved(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<bool> {
        let saved = self.saved_cars.read().await;
        Ok(saved.iter().any(|s| s.user_id == user_id && s.car_id == car_id))
    }

    async fn saved_car_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let saved = self.saved_cars.read().await;
        Ok(saved
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.car_id)
            .collect())
    }

    async fn list_saved_cars(&self, user_id: Uuid) -> StoreResult<Vec<Car>> {
        let saved = self.saved_cars.read().await;
        let mut associations: Vec<&SavedCar> =
            saved.iter().filter(|s| s.user_id == user_id).collect();
        associations.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

        let cars = self.cars.read().await;
        Ok(associations
            .iter()
            .filter_map(|s| cars.get(&s.car_id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use entities::CarStatus;

    use super::*;

    fn sample_car(make: &str, model: &str, price: f64) -> Car {
        Car::new(make, model, 2023, price)
            .with_color("White")
            .with_fuel_type("Petrol")
            .with_transmission("Automatic")
            .with_body_type("Sedan")
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_slot_conflict_rejected() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("Tesla", "Model 3", 30000.0)).await.unwrap();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let first = Booking::new(car.id, user_a, june_first(), "10:00", "11:00");
        store.create_booking(first).await.unwrap();

        let second = Booking::new(car.id, user_b, june_first(), "10:00", "11:00");
        let err = store.create_booking(second).await.unwrap_err();
        assert!(matches!(err, StoreError::SlotConflict));
    }

    #[tokio::test]
    async fn test_cancelled_slot_can_be_rebooked() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("BMW", "530i", 95000.0)).await.unwrap();

        let first = Booking::new(car.id, Uuid::new_v4(), june_first(), "10:00", "11:00");
        let first = store.create_booking(first).await.unwrap();
        store
            .update_booking_status(first.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let second = Booking::new(car.id, Uuid::new_v4(), june_first(), "10:00", "11:00");
        assert!(store.create_booking(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_double_booking_yields_one_success() {
        // Regression for the check-then-insert race: exactly one of two
        // simultaneous requests for the same slot may succeed.
        let store = Arc::new(MemoryDealerStore::new());
        let car = store.create_car(sample_car("Honda", "Civic", 22000.0)).await.unwrap();

        let b1 = Booking::new(car.id, Uuid::new_v4(), june_first(), "10:00", "11:00");
        let b2 = Booking::new(car.id, Uuid::new_v4(), june_first(), "10:00", "11:00");

        let s1 = Arc::clone(&store);
        let s2 = Arc::clone(&store);
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.create_booking(b1).await }),
            tokio::spawn(async move { s2.create_booking(b2).await }),
        );
        let r1 = r1.unwrap();
        let r2 = r2.unwrap();

        assert_eq!(
            r1.is_ok() as u32 + r2.is_ok() as u32,
            1,
            "exactly one booking must win the slot"
        );
    }

    #[tokio::test]
    async fn test_terminal_transition_rejected_without_mutation() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("Ford", "Focus", 18000.0)).await.unwrap();

        let booking = Booking::new(car.id, Uuid::new_v4(), june_first(), "09:00", "10:00");
        let booking = store.create_booking(booking).await.unwrap();
        store
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let err = store
            .update_booking_status(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidStateTransition { .. }));

        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_price_range_filter() {
        let store = MemoryDealerStore::new();
        for (model, price) in [("A", 10000.0), ("B", 25000.0), ("C", 40000.0), ("D", 25000.0)] {
            store.create_car(sample_car("Make", model, price)).await.unwrap();
        }

        let filter = CarFilter {
            min_price: Some(20000.0),
            max_price: Some(25000.0),
            ..Default::default()
        };
        let (cars, total) = store.list_cars(filter).await.unwrap();
        assert_eq!(total, 2);
        assert!(cars.iter().all(|c| c.price >= 20000.0 && c.price <= 25000.0));
    }

    #[tokio::test]
    async fn test_search_matches_description() {
        let store = MemoryDealerStore::new();
        let car = sample_car("Tesla", "Model 3", 30000.0)
            .with_description("Long range battery, single owner");
        store.create_car(car).await.unwrap();
        store.create_car(sample_car("BMW", "530i", 95000.0)).await.unwrap();

        let filter = CarFilter {
            search: Some("long range".to_string()),
            ..Default::default()
        };
        let (cars, total) = store.list_cars(filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(cars[0].make, "Tesla");
    }

    #[tokio::test]
    async fn test_sort_by_price() {
        let store = MemoryDealerStore::new();
        for (model, price) in [("A", 30000.0), ("B", 10000.0), ("C", 20000.0)] {
            store.create_car(sample_car("Make", model, price)).await.unwrap();
        }

        let filter = CarFilter {
            sort: CarSort::PriceAsc,
            ..Default::default()
        };
        let (cars, _) = store.list_cars(filter).await.unwrap();
        let prices: Vec<f64> = cars.iter().map(|c| c.price).collect();
        assert_eq!(prices, vec![10000.0, 20000.0, 30000.0]);
    }

    #[tokio::test]
    async fn test_saved_car_toggle_pair_is_idempotent() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("Kia", "EV6", 45000.0)).await.unwrap();
        let user_id = Uuid::new_v4();

        assert!(!store.is_car_saved(user_id, car.id).await.unwrap());
        store.save_car(user_id, car.id).await.unwrap();
        assert!(store.is_car_saved(user_id, car.id).await.unwrap());
        assert!(store.unsave_car(user_id, car.id).await.unwrap());
        assert!(!store.is_car_saved(user_id, car.id).await.unwrap());
        // Removing again reports absence.
        assert!(!store.unsave_car(user_id, car.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_booking_list_order() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("Audi", "A4", 40000.0)).await.unwrap();
        let user_id = Uuid::new_v4();

        let earlier = Booking::new(
            car.id,
            user_id,
            NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            "10:00",
            "11:00",
        );
        let later = Booking::new(car.id, user_id, june_first(), "10:00", "11:00");
        store.create_booking(earlier).await.unwrap();
        store.create_booking(later.clone()).await.unwrap();

        let filter = BookingFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        let bookings = store.list_bookings(filter).await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].id, later.id);
    }

    #[tokio::test]
    async fn test_user_lookup_by_external_id() {
        let store = MemoryDealerStore::new();
        let user = User::new("provider|abc", "u@example.com");
        store.create_user(user.clone()).await.unwrap();

        let found = store.get_user_by_external_id("provider|abc").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);
        assert!(store.get_user_by_external_id("provider|missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_car_clears_wishlist_entries() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("Mini", "Cooper", 28000.0)).await.unwrap();
        let user_id = Uuid::new_v4();
        store.save_car(user_id, car.id).await.unwrap();

        store.delete_car(car.id).await.unwrap();
        assert!(!store.is_car_saved(user_id, car.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_car_keeps_booking_history() {
        let store = MemoryDealerStore::new();
        let car = store.create_car(sample_car("Mazda", "3", 24000.0)).await.unwrap();
        let booking = Booking::new(car.id, Uuid::new_v4(), june_first(), "10:00", "11:00");
        let booking = store.create_booking(booking).await.unwrap();

        store.delete_car(car.id).await.unwrap();

        // Booking history outlives the car record.
        assert!(store.get_booking(booking.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_featured_filter() {
        let store = MemoryDealerStore::new();
        store
            .create_car(sample_car("Tesla", "Model 3", 30000.0).with_featured(true))
            .await
            .unwrap();
        store
            .create_car(sample_car("BMW", "530i", 95000.0).with_status(CarStatus::Sold))
            .await
            .unwrap();

        let filter = CarFilter {
            featured: Some(true),
            status: Some(CarStatus::Available),
            ..Default::default()
        };
        let (cars, total) = store.list_cars(filter).await.unwrap();
        assert_eq!(total, 1);
        assert!(cars[0].featured);
    }
}
