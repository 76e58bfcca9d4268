//! Identity providers.
//!
//! A provider turns a login request into a [`Principal`]. The production
//! provider derives the principal from a device key kept in the data
//! directory; tests script the outcome.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use lyceum_types::Principal;
use parking_lot::Mutex;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, SessionError};

/// Device key file name within the data directory.
pub const KEY_FILE: &str = "identity.key";

/// How long a delegation issued by [`LocalKeyIdentity`] stays active.
const DELEGATION_TTL_HOURS: i64 = 8;

/// Trait for identity providers.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Short provider name, persisted with the session.
    fn name(&self) -> &str;

    /// Run the provider's login flow.
    ///
    /// Fails with [`SessionError::AlreadyAuthenticated`] when the provider
    /// still holds an active delegation.
    async fn login(&self) -> Result<Principal>;

    /// Drop any delegation held by the provider.
    async fn logout(&self) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// LocalKeyIdentity
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Delegation {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// Identity backed by a device key stored on disk.
///
/// The key is generated on first login. The principal is the unpadded
/// base64url SHA-256 digest of the key, so the same device always logs in
/// as the same principal.
#[derive(Debug)]
pub struct LocalKeyIdentity {
    key_path: PathBuf,
    delegation: Mutex<Option<Delegation>>,
}

impl LocalKeyIdentity {
    /// Create a provider keeping its key in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_key_path(data_dir.join(KEY_FILE))
    }

    /// Create a provider with a custom key path.
    pub fn with_key_path(key_path: PathBuf) -> Self {
        Self {
            key_path,
            delegation: Mutex::new(None),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Whether a delegation is currently active.
    pub fn has_delegation(&self) -> bool {
        self.delegation
            .lock()
            .as_ref()
            .is_some_and(|d| d.expires_at > Utc::now())
    }

    /// Derive the principal for a key.
    pub fn principal_for(key: &[u8]) -> Result<Principal> {
        let digest = Sha256::digest(key);
        Ok(Principal::parse(URL_SAFE_NO_PAD.encode(digest))?)
    }

    fn load_or_create_key(&self) -> Result<Vec<u8>> {
        if self.key_path.exists() {
            let encoded = std::fs::read_to_string(&self.key_path)?;
            return STANDARD
                .decode(encoded.trim())
                .map_err(|e| SessionError::Provider(format!("Corrupt device key: {}", e)));
        }

        if let Some(parent) = self.key_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut key = vec![0u8; 32];
        rand::rng().fill_bytes(&mut key);
        std::fs::write(&self.key_path, STANDARD.encode(&key))?;

        tracing::info!("Device key created at {}", self.key_path.display());
        Ok(key)
    }
}

#[async_trait]
impl IdentityProvider for LocalKeyIdentity {
    fn name(&self) -> &str {
        "local-key"
    }

    async fn login(&self) -> Result<Principal> {
        if self.has_delegation() {
            return Err(SessionError::AlreadyAuthenticated);
        }

        let key = self.load_or_create_key()?;
        let principal = Self::principal_for(&key)?;

        *self.delegation.lock() = Some(Delegation {
            principal: principal.clone(),
            expires_at: Utc::now() + Duration::hours(DELEGATION_TTL_HOURS),
        });

        Ok(principal)
    }

    async fn logout(&self) -> Result<()> {
        if let Some(d) = self.delegation.lock().take() {
            tracing::debug!(principal = %d.principal.short(), "delegation dropped");
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptedIdentity
// ─────────────────────────────────────────────────────────────────────────────

/// Provider whose login outcomes are scripted, for tests.
///
/// Each login pops the next scripted outcome; once the script runs out every
/// login succeeds with the fallback principal.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct ScriptedIdentity {
    script: Mutex<std::collections::VecDeque<std::result::Result<Principal, String>>>,
    fallback: Principal,
    logins: std::sync::atomic::AtomicUsize,
    logouts: std::sync::atomic::AtomicUsize,
    delay: Option<std::time::Duration>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedIdentity {
    /// Provider that always logs in as `principal`.
    pub fn new(principal: Principal) -> Self {
        Self {
            script: Mutex::new(Default::default()),
            fallback: principal,
            logins: Default::default(),
            logouts: Default::default(),
            delay: None,
        }
    }

    /// Queue a provider failure. The message `"User is already
    /// authenticated"` maps to [`SessionError::AlreadyAuthenticated`].
    pub fn fail_next(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(Err(message.into()));
        self
    }

    /// Queue a successful login as `principal`.
    pub fn succeed_next(self, principal: Principal) -> Self {
        self.script.lock().push_back(Ok(principal));
        self
    }

    /// Make every login take `delay`.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn logout_count(&self) -> usize {
        self.logouts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn login(&self) -> Result<Principal> {
        self.logins.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(principal)) => Ok(principal),
            Some(Err(message)) if message == SessionError::AlreadyAuthenticated.to_string() => {
                Err(SessionError::AlreadyAuthenticated)
            }
            Some(Err(message)) => Err(SessionError::Provider(message)),
            None => Ok(self.fallback.clone()),
        }
    }

    async fn logout(&self) -> Result<()> {
        self.logouts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_key_is_stable_across_instances() {
        let dir = TempDir::new().unwrap();

        let first = LocalKeyIdentity::new(dir.path());
        let p1 = first.login().await.unwrap();
        assert!(first.key_path().exists());

        let second = LocalKeyIdentity::new(dir.path());
        let p2 = second.login().await.unwrap();
        assert_eq!(p1, p2);
        // 32 byte digest, unpadded base64url
        assert_eq!(p1.as_str().len(), 43);
    }

    #[tokio::test]
    async fn test_local_key_reports_active_delegation() {
        let dir = TempDir::new().unwrap();
        let provider = LocalKeyIdentity::new(dir.path());

        provider.login().await.unwrap();
        assert!(provider.has_delegation());
        let err = provider.login().await.unwrap_err();
        assert!(err.is_already_authenticated());

        provider.logout().await.unwrap();
        assert!(!provider.has_delegation());
        provider.login().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_key_is_a_provider_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(KEY_FILE), "!!! not base64").unwrap();

        let provider = LocalKeyIdentity::new(dir.path());
        let err = provider.login().await.unwrap_err();
        assert!(matches!(err, SessionError::Provider(_)));
    }

    #[test]
    fn test_principal_for_known_key() {
        let a = LocalKeyIdentity::principal_for(b"device-a").unwrap();
        let b = LocalKeyIdentity::principal_for(b"device-b").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, LocalKeyIdentity::principal_for(b"device-a").unwrap());
    }
}
