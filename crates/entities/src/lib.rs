//! Core entity definitions for DriveLine.
//!
//! This crate defines all the core data types used across the DriveLine
//! dealership platform: users, cars, test-drive bookings, and saved-car
//! associations.

mod booking;
mod car;
mod user;

pub use booking::*;
pub use car::*;
pub use user::*;
