//! Error types for query cache reads.

use std::sync::Arc;

/// Error type for query cache reads.
///
/// Cloneable so one failed fetch can be handed to every reader sharing it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The fetcher failed. The original error is kept for downcasting.
    #[error("{0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),

    /// The reader's cancellation token fired before the result arrived.
    #[error("Read cancelled")]
    Cancelled,

    /// The cached value for this key was stored under a different type.
    #[error("Cached value for '{0}' has a different type")]
    TypeMismatch(String),

    /// The fetch task was aborted before it produced a result.
    #[error("Fetch for '{0}' aborted")]
    Aborted(String),
}

impl CacheError {
    /// Downcast a fetch failure to the fetcher's error type.
    pub fn fetch_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            CacheError::Fetch(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Result type for query cache reads.
pub type Result<T> = std::result::Result<T, CacheError>;
