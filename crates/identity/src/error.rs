//! Identity error types.

use thiserror::Error;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Token validation failed.
    #[error("Token validation failed: {0}")]
    TokenValidation(String),

    /// Token encoding failed.
    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),

    /// Token expired.
    #[error("Token expired")]
    TokenExpired,

    /// Invalid token.
    #[error("Invalid token")]
    InvalidToken,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => IdentityError::InvalidToken,
            _ => IdentityError::TokenValidation(e.to_string()),
        }
    }
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
