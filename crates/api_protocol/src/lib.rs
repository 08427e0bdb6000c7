//! Wire protocol definitions for DriveLine server/client communication.
//!
//! This crate defines the JSON request/response shapes exchanged between the
//! DriveLine server and its clients, plus the stable error codes returned in
//! error bodies.

mod error;
mod requests;
mod responses;
mod types;

pub use error::*;
pub use requests::*;
pub use responses::*;
pub use types::*;
