//! Error types for OpenAPI document loading.

use thiserror::Error;

/// Result type for document loading.
pub type Result<T> = std::result::Result<T, OpenApiError>;

/// Errors that can occur while loading and normalizing an OpenAPI document.
#[derive(Error, Debug)]
pub enum OpenApiError {
    /// Text is neither JSON nor YAML
    #[error("Failed to parse OpenAPI document: {0}")]
    ParseError(String),

    /// Parsed, but not a usable OpenAPI document
    #[error("Invalid OpenAPI document: {0}")]
    InvalidSpec(String),

    /// Only OpenAPI 3.x is understood
    #[error("Unsupported OpenAPI version '{0}', expected 3.x")]
    UnsupportedVersion(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
