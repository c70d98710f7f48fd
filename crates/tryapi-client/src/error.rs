//! Error types for request execution

use thiserror::Error;

/// Why a request could not be executed.
///
/// A response with an error status is not an error here; it comes back as an
/// [`ExecutedResponse`](crate::ExecutedResponse).
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Build(#[from] tryapi_core::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error(transparent)]
    PatternKey(#[from] tryapi_core::PatternKeyError),
}

impl ClientError {
    /// Problems with what the user entered, as opposed to network failures.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ClientError::Build(_) | ClientError::UnknownOperation(_) | ClientError::PatternKey(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
