//! Error types for request construction.

use thiserror::Error;

/// Result type for the request engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration-time errors raised while resolving authorization or building a request.
///
/// All of these are local to a single "execute" action: they stop the request
/// from being issued but never touch form state or the global configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// The media type is listed by the document but has no serializer.
    #[error("Unsupported media type for serialization: {media_type}")]
    UnsupportedMediaType { media_type: String },

    /// A body is present but no content type was selected.
    #[error("A request body is present but no content type is selected")]
    MissingContentType,

    /// The selected security scheme cannot be applied to a request.
    #[error("Unsupported security scheme '{scheme}': {reason}")]
    UnsupportedAuthorizationScheme { scheme: String, reason: String },

    /// The credential entered for a scheme does not fit the scheme kind.
    #[error("Security scheme '{scheme}' expects a {expected} credential")]
    CredentialMismatch {
        scheme: String,
        expected: &'static str,
    },

    /// The selected security alternative does not exist in the matrix.
    #[error("Security alternative {index} does not exist ({available} available)")]
    InvalidSecurityAlternative { index: usize, available: usize },

    /// A path parameter has no value, so the path template cannot be resolved.
    #[error("Missing value for path parameter '{name}'")]
    MissingParameterValue { name: String },

    /// The operation declares no parameter with this name.
    #[error("Operation has no parameter named '{name}'")]
    UnknownParameter { name: String },

    /// The operation declares no request body.
    #[error("Operation has no request body")]
    BodyNotApplicable,

    /// Target server and path did not form an absolute URL.
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error comes from the authorization configuration rather than the form.
    pub fn is_authorization_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedAuthorizationScheme { .. }
                | Error::CredentialMismatch { .. }
                | Error::InvalidSecurityAlternative { .. }
        )
    }

    pub(crate) fn unsupported_media_type(media_type: impl Into<String>) -> Self {
        Error::UnsupportedMediaType {
            media_type: media_type.into(),
        }
    }
}
