//! SQLite dealer store implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use entities::{Booking, BookingStatus, Car, CarStatus, User, UserRole};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    QueryBuilder, Row, SqlitePool,
};
use uuid::Uuid;

use crate::{
    BookingFilter, CarFilter, CarSort, DealerStore, StoreError, StoreResult,
};

/// Embedded schema, applied on startup.
///
/// The partial unique index over active bookings is what makes
/// `create_booking` safe under concurrent requests: two inserts for the same
/// (car, date, start time) slot cannot both commit while either row is
/// PENDING or CONFIRMED.
///
/// Booking rows are never physically deleted and must outlive their car
/// record, so the bookings table carries plain ID columns rather than
/// foreign keys.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    name TEXT,
    image_url TEXT,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cars (
    id TEXT PRIMARY KEY,
    make TEXT NOT NULL,
    model TEXT NOT NULL,
    year INTEGER NOT NULL,
    price REAL NOT NULL,
    mileage INTEGER NOT NULL,
    color TEXT NOT NULL,
    fuel_type TEXT NOT NULL,
    transmission TEXT NOT NULL,
    body_type TEXT NOT NULL,
    seats INTEGER,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    featured INTEGER NOT NULL DEFAULT 0,
    images TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS test_drive_bookings (
    id TEXT PRIMARY KEY,
    car_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    booking_date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    notes TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_slot
    ON test_drive_bookings (car_id, booking_date, start_time)
    WHERE status IN ('PENDING', 'CONFIRMED');

CREATE TABLE IF NOT EXISTS saved_cars (
    user_id TEXT NOT NULL REFERENCES users(id),
    car_id TEXT NOT NULL REFERENCES cars(id),
    saved_at TEXT NOT NULL,
    PRIMARY KEY (user_id, car_id)
);
";

fn car_status_to_string(status: CarStatus) -> &'static str {
    match status {
        CarStatus::Available => "AVAILABLE",
        CarStatus::Unavailable => "UNAVAILABLE",
        CarStatus::Sold => "SOLD",
    }
}

fn parse_car_status(s: &str) -> StoreResult<CarStatus> {
    match s {
        "AVAILABLE" => Ok(CarStatus::Available),
        "UNAVAILABLE" => Ok(CarStatus::Unavailable),
        "SOLD" => Ok(CarStatus::Sold),
        other => Err(StoreError::Other(format!("Unknown car status: {other}"))),
    }
}

fn booking_status_to_string(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "PENDING",
        BookingStatus::Confirmed => "CONFIRMED",
        BookingStatus::Completed => "COMPLETED",
        BookingStatus::Cancelled => "CANCELLED",
        BookingStatus::NoShow => "NO_SHOW",
    }
}

fn parse_booking_status(s: &str) -> StoreResult<BookingStatus> {
    match s {
        "PENDING" => Ok(BookingStatus::Pending),
        "CONFIRMED" => Ok(BookingStatus::Confirmed),
        "COMPLETED" => Ok(BookingStatus::Completed),
        "CANCELLED" => Ok(BookingStatus::Cancelled),
        "NO_SHOW" => Ok(BookingStatus::NoShow),
        other => Err(StoreError::Other(format!("Unknown booking status: {other}"))),
    }
}

fn role_to_string(role: UserRole) -> &'static str {
    match role {
        UserRole::User => "USER",
        UserRole::Admin => "ADMIN",
    }
}

fn parse_role(s: &str) -> StoreResult<UserRole> {
    match s {
        "USER" => Ok(UserRole::User),
        "ADMIN" => Ok(UserRole::Admin),
        other => Err(StoreError::Other(format!("Unknown user role: {other}"))),
    }
}

fn parse_uuid(s: &str) -> StoreResult<Uuid> {
    s.parse()
        .map_err(|_| StoreError::Other(format!("Invalid UUID in database: {s}")))
}

fn parse_timestamp(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Other(format!("Invalid timestamp in database: {s}")))
}

fn parse_date(s: &str) -> StoreResult<NaiveDate> {
    s.parse()
        .map_err(|_| StoreError::Other(format!("Invalid date in database: {s}")))
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    external_id: String,
    email: String,
    name: Option<String>,
    image_url: Option<String>,
    role: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_user(self) -> StoreResult<User> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            external_id: self.external_id,
            email: self.email,
            name: self.name,
            image_url: self.image_url,
            role: parse_role(&self.role)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CarRow {
    id: String,
    make: String,
    model: String,
    year: i32,
    price: f64,
    mileage: i32,
    color: String,
    fuel_type: String,
    transmission: String,
    body_type: String,
    seats: Option<i32>,
    description: String,
    status: String,
    featured: bool,
    images: String,
    created_at: String,
    updated_at: String,
}

impl CarRow {
    fn into_car(self) -> StoreResult<Car> {
        Ok(Car {
            id: parse_uuid(&self.id)?,
            make: self.make,
            model: self.model,
            year: self.year,
            price: self.price,
            mileage: self.mileage,
            color: self.color,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            body_type: self.body_type,
            seats: self.seats,
            description: self.description,
            status: parse_car_status(&self.status)?,
            featured: self.featured,
            images: serde_json::from_str(&self.images)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: String,
    car_id: String,
    user_id: String,
    booking_date: String,
    start_time: String,
    end_time: String,
    notes: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl BookingRow {
    fn into_booking(self) -> StoreResult<Booking> {
        Ok(Booking {
            id: parse_uuid(&self.id)?,
            car_id: parse_uuid(&self.car_id)?,
            user_id: parse_uuid(&self.user_id)?,
            booking_date: parse_date(&self.booking_date)?,
            start_time: self.start_time,
            end_time: self.end_time,
            notes: self.notes,
            status: parse_booking_status(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

const CAR_COLUMNS: &str = "id, make, model, year, price, mileage, color, fuel_type, \
     transmission, body_type, seats, description, status, featured, images, \
     created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, car_id, user_id, booking_date, start_time, end_time, notes, \
     status, created_at, updated_at";

/// Appends the WHERE clause for a car filter to a query builder.
fn push_car_filter(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &CarFilter) {
    builder.push(" WHERE 1=1");
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        builder.push(" AND (LOWER(make) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR LOWER(model) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR LOWER(description) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(make) = &filter.make {
        builder.push(" AND LOWER(make) = ");
        builder.push_bind(make.to_lowercase());
    }
    if let Some(body_type) = &filter.body_type {
        builder.push(" AND LOWER(body_type) = ");
        builder.push_bind(body_type.to_lowercase());
    }
    if let Some(fuel_type) = &filter.fuel_type {
        builder.push(" AND LOWER(fuel_type) = ");
        builder.push_bind(fuel_type.to_lowercase());
    }
    if let Some(transmission) = &filter.transmission {
        builder.push(" AND LOWER(transmission) = ");
        builder.push_bind(transmission.to_lowercase());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(car_status_to_string(status));
    }
    if let Some(featured) = filter.featured {
        builder.push(" AND featured = ");
        builder.push_bind(featured);
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max);
    }
}

/// SQLite-backed dealer store.
#[derive(Debug, Clone)]
pub struct SqliteDealerStore {
    pool: SqlitePool,
}

impl SqliteDealerStore {
    /// Connects to the given SQLite database and applies the schema.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options: SqliteConnectOptions = url
            .parse::<SqliteConnectOptions>()
            .map_err(sqlx::Error::from)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool and applies the schema.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DealerStore for SqliteDealerStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (id, external_id, email, name, image_url, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .bind(role_to_string(user.role))
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::already_exists("User", user.external_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, external_id, email, name, image_url, role, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, external_id, email, name, image_url, role, created_at, updated_at
             FROM users WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    // =========================================================================
    // Car operations
    // =========================================================================

    async fn create_car(&self, car: Car) -> StoreResult<Car> {
        sqlx::query(
            "INSERT INTO cars (id, make, model, year, price, mileage, color, fuel_type, \
             transmission, body_type, seats, description, status, featured, images, \
             created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(car.id.to_string())
        .bind(&car.make)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.price)
        .bind(car.mileage)
        .bind(&car.color)
        .bind(&car.fuel_type)
        .bind(&car.transmission)
        .bind(&car.body_type)
        .bind(car.seats)
        .bind(&car.description)
        .bind(car_status_to_string(car.status))
        .bind(car.featured)
        .bind(serde_json::to_string(&car.images)?)
        .bind(car.created_at.to_rfc3339())
        .bind(car.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(car)
    }

    async fn get_car(&self, id: Uuid) -> StoreResult<Option<Car>> {
        let query = format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = ?");
        let row: Option<CarRow> = sqlx::query_as(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(CarRow::into_car).transpose()
    }

    async fn list_cars(&self, filter: CarFilter) -> StoreResult<(Vec<Car>, u32)> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) AS n FROM cars");
        push_car_filter(&mut count_builder, &filter);
        let total: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("n")?;

        let mut builder = QueryBuilder::new(format!("SELECT {CAR_COLUMNS} FROM cars"));
        push_car_filter(&mut builder, &filter);
        builder.push(match filter.sort {
            CarSort::Newest => " ORDER BY created_at DESC",
            CarSort::PriceAsc => " ORDER BY price ASC",
            CarSort::PriceDesc => " ORDER BY price DESC",
        });
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }
        if let Some(offset) = filter.offset {
            if filter.limit.is_none() {
                builder.push(" LIMIT -1");
            }
            builder.push(" OFFSET ");
            builder.push_bind(offset as i64);
        }

        let rows: Vec<CarRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let cars = rows
            .into_iter()
            .map(CarRow::into_car)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((cars, total as u32))
    }

    async fn update_car(&self, car: Car) -> StoreResult<Car> {
        let mut car = car;
        car.updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE cars SET make = ?, model = ?, year = ?, price = ?, mileage = ?, color = ?, \
             fuel_type = ?, transmission = ?, body_type = ?, seats = ?, description = ?, \
             status = ?, featured = ?, images = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&car.make)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.price)
        .bind(car.mileage)
        .bind(&car.color)
        .bind(&car.fuel_type)
        .bind(&car.transmission)
        .bind(&car.body_type)
        .bind(car.seats)
        .bind(&car.description)
        .bind(car_status_to_string(car.status))
        .bind(car.featured)
        .bind(serde_json::to_string(&car.images)?)
        .bind(car.updated_at.to_rfc3339())
        .bind(car.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Car", car.id.to_string()));
        }
        Ok(car)
    }

    async fn delete_car(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM saved_cars WHERE car_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Car", id.to_string()));
        }
        Ok(())
    }

    async fn distinct_makes(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT make FROM cars ORDER BY make")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("make").map_err(StoreError::from))
            .collect()
    }

    async fn distinct_body_types(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT body_type FROM cars ORDER BY body_type")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("body_type").map_err(StoreError::from))
            .collect()
    }

    // =========================================================================
    // Booking operations
    // =========================================================================

    async fn create_booking(&self, booking: Booking) -> StoreResult<Booking> {
        let result = sqlx::query(
            "INSERT INTO test_drive_bookings (id, car_id, user_id, booking_date, start_time, \
             end_time, notes, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id.to_string())
        .bind(booking.car_id.to_string())
        .bind(booking.user_id.to_string())
        .bind(booking.booking_date.to_string())
        .bind(&booking.start_time)
        .bind(&booking.end_time)
        .bind(&booking.notes)
        .bind(booking_status_to_string(booking.status))
        .bind(booking.created_at.to_rfc3339())
        .bind(booking.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(booking),
            // The partial unique index over active slots turns the racing
            // insert into a unique violation.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::SlotConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM test_drive_bookings WHERE id = ?");
        let row: Option<BookingRow> = sqlx::query_as(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {BOOKING_COLUMNS} FROM test_drive_bookings WHERE 1=1"
        ));
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id.to_string());
        }
        if let Some(car_id) = filter.car_id {
            builder.push(" AND car_id = ");
            builder.push_bind(car_id.to_string());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(booking_status_to_string(status));
        }
        if let Some(date) = filter.booking_date {
            builder.push(" AND booking_date = ");
            builder.push_bind(date.to_string());
        }
        builder.push(" ORDER BY booking_date DESC, created_at DESC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }
        if let Some(offset) = filter.offset {
            if filter.limit.is_none() {
                builder.push(" LIMIT -1");
            }
            builder.push(" OFFSET ");
            builder.push_bind(offset as i64);
        }

        let rows: Vec<BookingRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Booking> {
        let current = self
            .get_booking(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Booking", id.to_string()))?;

        if !current.status.can_transition_to(status) {
            return Err(StoreError::invalid_transition(
                format!("{:?}", current.status),
                format!("{status:?}"),
            ));
        }

        let now = Utc::now();
        // Guard on the previous status so a concurrent transition cannot be
        // silently overwritten.
        let result = sqlx::query(
            "UPDATE test_drive_bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(booking_status_to_string(status))
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .bind(booking_status_to_string(current.status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::invalid_transition(
                format!("{:?}", current.status),
                format!("{status:?}"),
            ));
        }

        let mut booking = current;
        booking.status = status;
        booking.updated_at = now;
        Ok(booking)
    }

    // =========================================================================
    // Saved car operations
    // =========================================================================

    async fn save_car(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO saved_cars (user_id, car_id, saved_at) VALUES (?, ?, ?)",
        )
        .bind(user_id.to_string())
        .bind(car_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unsave_car(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM saved_cars WHERE user_id = ? AND car_id = ?")
            .bind(user_id.to_string())
            .bind(car_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_car_saved(&self, user_id: Uuid, car_id: Uuid) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 AS x FROM saved_cars WHERE user_id = ? AND car_id = ?")
            .bind(user_id.to_string())
            .bind(car_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn saved_car_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let rows = sqlx::query("SELECT car_id FROM saved_cars WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("car_id")?;
                parse_uuid(&id)
            })
            .collect()
    }

    async fn list_saved_cars(&self, user_id: Uuid) -> StoreResult<Vec<Car>> {
        let query = format!(
            "SELECT {} FROM cars c
             JOIN saved_cars s ON s.car_id = c.id
             WHERE s.user_id = ?
             ORDER BY s.saved_at DESC",
            CAR_COLUMNS
                .split(", ")
                .map(|col| format!("c.{col}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let rows: Vec<CarRow> = sqlx::query_as(&query)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(CarRow::into_car).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    async fn test_store() -> SqliteDealerStore {
        SqliteDealerStore::connect("sqlite::memory:").await.unwrap()
    }

    async fn seed_user(store: &SqliteDealerStore, tag: &str) -> User {
        store
            .create_user(User::new(format!("provider|{tag}"), format!("{tag}@example.com")))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_car_round_trip() {
        let store = test_store().await;
        let car = Car::new("Tesla", "Model 3", 2022, 30000.0)
            .with_color("Red")
            .with_fuel_type("Electric")
            .with_transmission("Automatic")
            .with_body_type("Sedan")
            .with_images(vec!["https://img.example/1.jpg".to_string()]);
        let car = store.create_car(car).await.unwrap();

        let loaded = store.get_car(car.id).await.unwrap().unwrap();
        assert_eq!(loaded.make, "Tesla");
        assert_eq!(loaded.status, CarStatus::Available);
        assert_eq!(loaded.images.len(), 1);
    }

    #[tokio::test]
    async fn test_active_slot_unique_index() {
        let store = test_store().await;
        let car = store
            .create_car(Car::new("Honda", "Civic", 2023, 22000.0))
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let carol = seed_user(&store, "carol").await;

        let first = Booking::new(car.id, alice.id, date, "10:00", "11:00");
        let first = store.create_booking(first).await.unwrap();

        let second = Booking::new(car.id, bob.id, date, "10:00", "11:00");
        let err = store.create_booking(second).await.unwrap_err();
        assert!(matches!(err, StoreError::SlotConflict));

        // After cancelling, the slot opens up again.
        store
            .update_booking_status(first.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        let third = Booking::new(car.id, carol.id, date, "10:00", "11:00");
        assert!(store.create_booking(third).await.is_ok());
    }

    #[tokio::test]
    async fn test_filtered_car_listing() {
        let store = test_store().await;
        for (make, body, price) in [
            ("Tesla", "Sedan", 30000.0),
            ("BMW", "Sedan", 95000.0),
            ("Hyundai", "SUV", 25000.0),
        ] {
            store
                .create_car(
                    Car::new(make, "X", 2023, price)
                        .with_body_type(body)
                        .with_fuel_type("Petrol")
                        .with_transmission("Automatic"),
                )
                .await
                .unwrap();
        }

        let filter = CarFilter {
            body_type: Some("sedan".to_string()),
            max_price: Some(50000.0),
            ..Default::default()
        };
        let (cars, total) = store.list_cars(filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(cars[0].make, "Tesla");
    }

    #[tokio::test]
    async fn test_duplicate_external_id_rejected() {
        let store = test_store().await;
        store
            .create_user(User::new("provider|1", "a@example.com"))
            .await
            .unwrap();
        let err = store
            .create_user(User::new("provider|1", "b@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_saved_cars_join() {
        let store = test_store().await;
        let car = store
            .create_car(Car::new("Kia", "EV6", 2023, 45000.0))
            .await
            .unwrap();
        let user = store
            .create_user(User::new("provider|2", "c@example.com"))
            .await
            .unwrap();

        store.save_car(user.id, car.id).await.unwrap();
        // Saving twice is a no-op.
        store.save_car(user.id, car.id).await.unwrap();

        let saved = store.list_saved_cars(user.id).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, car.id);

        assert!(store.unsave_car(user.id, car.id).await.unwrap());
        assert!(store.list_saved_cars(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_car_keeps_booking_history() {
        let store = test_store().await;
        let car = store
            .create_car(Car::new("Mazda", "3", 2022, 24000.0))
            .await
            .unwrap();
        let user = seed_user(&store, "erin").await;
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let booking = store
            .create_booking(Booking::new(car.id, user.id, date, "10:00", "11:00"))
            .await
            .unwrap();
        store
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        store.delete_car(car.id).await.unwrap();
        assert!(store.get_car(car.id).await.unwrap().is_none());

        // Booking history outlives the car record.
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_terminal_status_guard() {
        let store = test_store().await;
        let car = store
            .create_car(Car::new("Ford", "Focus", 2021, 18000.0))
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let user = seed_user(&store, "dave").await;
        let booking = Booking::new(car.id, user.id, date, "09:00", "10:00");
        let booking = store.create_booking(booking).await.unwrap();

        store
            .update_booking_status(booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        store
            .update_booking_status(booking.id, BookingStatus::Completed)
            .await
            .unwrap();

        let err = store
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidStateTransition { .. }));

        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Completed);
    }
}
