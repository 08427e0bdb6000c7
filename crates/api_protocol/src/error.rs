//! Wire error codes.
//!
//! Error responses carry a stable machine-readable code alongside the
//! human-readable message so clients branch on the code, never on message
//! text.

/// Stable error code strings returned in `{"error": {"code": ...}}` bodies.
pub mod error_codes {
    /// Malformed or invalid request parameters.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// No authenticated identity.
    pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
    /// Authenticated but not allowed to perform this action.
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    /// Referenced user/car/booking absent.
    pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
    /// An active booking already occupies the requested slot.
    pub const SLOT_CONFLICT: &str = "SLOT_CONFLICT";
    /// The booking is in a terminal state and cannot transition.
    pub const INVALID_STATE_TRANSITION: &str = "INVALID_STATE_TRANSITION";
    /// The vision model call failed or returned unusable output.
    pub const AI_EXTRACTION_FAILED: &str = "AI_EXTRACTION_FAILED";
    /// AI features are not configured on this deployment.
    pub const AI_UNAVAILABLE: &str = "AI_UNAVAILABLE";
    /// Internal server error.
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}
