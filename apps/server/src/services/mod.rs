//! Domain services.

pub mod bookings;
pub mod revalidation;
