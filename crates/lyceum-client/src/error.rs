//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable transport: the client is not ready yet, or the backend
    /// could not be reached.
    #[error("Backend unavailable")]
    TransportUnavailable,

    /// The backend rejected the caller's identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend actor returned an error. The message is passed through
    /// verbatim.
    #[error("{0}")]
    Remote(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if the backend could not be reached (or the client is not ready).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::TransportUnavailable)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// Check if the backend actor itself rejected the call.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// The remote error message, if this is a remote error.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Error::Remote(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
