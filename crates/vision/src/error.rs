//! Vision error types.

use thiserror::Error;

/// Errors that can occur during vision-model extraction.
#[derive(Debug, Error)]
pub enum VisionError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API returned a non-success status.
    #[error("Vision API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model returned no usable candidate text.
    #[error("Vision model returned an empty response")]
    EmptyResponse,

    /// The model output could not be parsed into the expected shape.
    #[error("Failed to parse vision model output: {0}")]
    Parse(String),
}

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;
