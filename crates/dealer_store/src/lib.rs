//! Inventory, booking, and wishlist storage for DriveLine.
//!
//! This crate provides the storage abstraction for cars, users, test-drive
//! bookings, and saved-car associations. It ships a SQLite implementation
//! for production use and an in-memory implementation for tests.

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
