//! Error types for session management.

use lyceum_types::PrincipalError;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while logging in or out.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session (or provider delegation) is already active.
    #[error("User is already authenticated")]
    AlreadyAuthenticated,

    /// The identity provider failed.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// The session store failed.
    #[error("Session store error: {0}")]
    Store(String),

    /// The provider produced an unusable principal.
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(#[from] PrincipalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn is_already_authenticated(&self) -> bool {
        matches!(self, SessionError::AlreadyAuthenticated)
    }
}
