//! Domain error types.

use lyceum_cache::CacheError;
use lyceum_client::Error as ClientError;
use lyceum_session::SessionError;
use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The backend could not be reached, or no identity decision has been
    /// made yet.
    #[error("Backend unavailable")]
    TransportUnavailable,

    /// The backend rejected the caller.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend actor rejected the call. Passed through verbatim.
    #[error("{0}")]
    Remote(String),

    /// A login was attempted while a session is active.
    #[error("User is already authenticated")]
    AlreadyAuthenticated,

    /// Rejected locally, before any remote call.
    #[error("{0}")]
    Validation(String),

    /// A returning payment could not be confirmed.
    #[error("Payment confirmation failed: {0}")]
    ConfirmationFailed(String),

    /// The caller stopped waiting, but the confirmation call is still out.
    #[error("Payment confirmation still pending: {0}")]
    ConfirmationPending(String),

    /// The payment ledger could not be read or written.
    #[error("Payment ledger error: {0}")]
    Ledger(String),

    /// The caller stopped waiting.
    #[error("Cancelled")]
    Cancelled,

    /// Client failure below the remote-call level (HTTP, JSON, URL).
    #[error("Client error: {0}")]
    Client(String),

    /// Session error.
    #[error("Session error: {0}")]
    Session(SessionError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] lyceum_config::ConfigError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DomainError::TransportUnavailable)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DomainError::ConfirmationPending(_))
    }

    /// The remote error message, if the backend rejected the call.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            DomainError::Remote(msg) => Some(msg),
            _ => None,
        }
    }

    /// Rebuild from a borrowed client error, as shared through the cache.
    fn from_client_ref(e: &ClientError) -> Self {
        match e {
            ClientError::TransportUnavailable => DomainError::TransportUnavailable,
            ClientError::Unauthorized(m) => DomainError::Unauthorized(m.clone()),
            ClientError::Remote(m) => DomainError::Remote(m.clone()),
            other => DomainError::Client(other.to_string()),
        }
    }
}

impl From<ClientError> for DomainError {
    fn from(e: ClientError) -> Self {
        Self::from_client_ref(&e)
    }
}

impl From<SessionError> for DomainError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::AlreadyAuthenticated => DomainError::AlreadyAuthenticated,
            other => DomainError::Session(other),
        }
    }
}

impl From<CacheError> for DomainError {
    fn from(e: CacheError) -> Self {
        if let Some(client) = e.fetch_error::<ClientError>() {
            return Self::from_client_ref(client);
        }
        match e {
            CacheError::Cancelled => DomainError::Cancelled,
            other => DomainError::Internal(other.to_string()),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_remote_message_passes_through() {
        let err: DomainError = ClientError::Remote("Course not found".into()).into();
        assert_eq!(err.to_string(), "Course not found");
        assert_eq!(err.remote_message(), Some("Course not found"));
    }

    #[test]
    fn test_cache_error_unwraps_client_error() {
        let cache_err = CacheError::Fetch(Arc::new(ClientError::TransportUnavailable));
        assert!(DomainError::from(cache_err).is_unavailable());

        let cancelled = DomainError::from(CacheError::Cancelled);
        assert!(matches!(cancelled, DomainError::Cancelled));
    }

    #[test]
    fn test_session_already_authenticated() {
        let err = DomainError::from(SessionError::AlreadyAuthenticated);
        assert!(matches!(err, DomainError::AlreadyAuthenticated));
    }
}
