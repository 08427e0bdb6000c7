//! Vision-model car detail extraction for DriveLine.
//!
//! Sends an uploaded car image to a vision-capable generative model and maps
//! the structured response onto car-attribute fields. Used for admin car
//! intake and for customer image search. No caching, no retries: a failed
//! call surfaces as a single terminal error.

mod client;
mod details;
mod error;

pub use client::*;
pub use details::*;
pub use error::*;
