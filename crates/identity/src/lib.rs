//! Identity-provider token validation for DriveLine.
//!
//! The platform delegates sign-in to an external identity provider; this
//! crate validates the bearer tokens that provider issues and exposes the
//! claims (subject, email, name) the server maps onto internal user records.

mod error;
mod token;

pub use error::*;
pub use token::*;

/// Default token expiration time in hours.
pub const DEFAULT_TOKEN_EXPIRATION_HOURS: u64 = 24;

/// Default token issuer.
pub const DEFAULT_TOKEN_ISSUER: &str = "driveline";
