//! Server error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dealer_store::StoreError;
use serde_json::json;

/// Server error type.
///
/// Every workflow failure carries an explicit kind; the wire representation
/// pairs a stable error code with the human-readable message so clients never
/// have to pattern-match on text.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication required.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// An active booking already occupies the requested test-drive slot.
    #[error("Test drive slot already booked. Please select another time")]
    SlotConflict,

    /// Booking is in a state that does not admit the requested transition.
    #[error("{0}")]
    InvalidStateTransition(String),

    /// The vision model call failed.
    #[error("AI extraction failed: {0}")]
    AiExtraction(String),

    /// AI features are not configured.
    #[error("AI features are not configured on this server")]
    AiUnavailable,

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => Self::NotFound(e.to_string()),
            StoreError::SlotConflict => Self::SlotConflict,
            StoreError::InvalidStateTransition { .. } => {
                Self::InvalidStateTransition(e.to_string())
            }
            other => Self::Store(other),
        }
    }
}

impl From<vision::VisionError> for ServerError {
    fn from(e: vision::VisionError) -> Self {
        Self::AiExtraction(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        use api_protocol::error_codes;

        let (status, error_code, message) = match &self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, msg.clone())
            }
            ServerError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, error_codes::RESOURCE_NOT_FOUND, msg.clone())
            }
            ServerError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTHENTICATION_REQUIRED,
                "Authentication required".to_string(),
            ),
            ServerError::PermissionDenied(msg) => {
                (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED, msg.clone())
            }
            ServerError::SlotConflict => {
                (StatusCode::CONFLICT, error_codes::SLOT_CONFLICT, self.to_string())
            }
            ServerError::InvalidStateTransition(msg) => (
                StatusCode::CONFLICT,
                error_codes::INVALID_STATE_TRANSITION,
                msg.clone(),
            ),
            ServerError::AiExtraction(msg) => {
                (StatusCode::BAD_GATEWAY, error_codes::AI_EXTRACTION_FAILED, msg.clone())
            }
            ServerError::AiUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::AI_UNAVAILABLE,
                self.to_string(),
            ),
            ServerError::Store(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR, e.to_string())
            }
            ServerError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR, msg.clone())
            }
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: ServerError = StoreError::not_found("Car", "abc").into();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn test_slot_conflict_maps_through() {
        let err: ServerError = StoreError::SlotConflict.into();
        assert!(matches!(err, ServerError::SlotConflict));
    }

    #[test]
    fn test_transition_error_maps_through() {
        let err: ServerError = StoreError::invalid_transition("Cancelled", "Confirmed").into();
        assert!(matches!(err, ServerError::InvalidStateTransition(_)));
    }
}
