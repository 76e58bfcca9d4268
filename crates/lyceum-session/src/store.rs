//! Session persistence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lyceum_types::Principal;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Default session file name within the data directory.
pub const SESSION_FILE: &str = "session.json";

/// A persisted login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub principal: Principal,
    /// Name of the provider that issued the principal.
    pub provider: String,
    pub logged_in_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(principal: Principal, provider: impl Into<String>) -> Self {
        Self {
            principal,
            provider: provider.into(),
            logged_in_at: Utc::now(),
        }
    }
}

/// Trait for session storage.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Load the stored session, if any.
    async fn load(&self) -> Result<Option<StoredSession>>;

    /// Replace the stored session.
    async fn save(&self, session: &StoredSession) -> Result<()>;

    /// Delete the stored session. Succeeds when nothing is stored.
    async fn clear(&self) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// FileSessionStore
// ─────────────────────────────────────────────────────────────────────────────

/// File-based session store for production use.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store keeping its file in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    /// Create with a custom file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let session = serde_json::from_str(&content).map_err(|e| {
            SessionError::Store(format!(
                "Failed to parse session file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(session))
    }

    async fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InMemorySessionStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory session store for testing.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `session`.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.session.lock().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<()> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> StoredSession {
        StoredSession::new(Principal::parse("aaaa-bbbb").unwrap(), "local-key")
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());

        assert_eq!(store.load().await.unwrap(), None);
        store.save(&session()).await.unwrap();

        let reopened = FileSessionStore::new(dir.path());
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded.principal.as_str(), "aaaa-bbbb");
        assert_eq!(loaded.provider, "local-key");

        reopened.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        // Clearing twice is fine.
        reopened.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_bad_principal() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(
            store.path(),
            r#"{"principal":"","provider":"x","logged_in_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load().await.unwrap_err(),
            SessionError::Store(_)
        ));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySessionStore::with_session(session());
        assert!(store.load().await.unwrap().is_some());
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
