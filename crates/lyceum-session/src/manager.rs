//! The session manager.

use std::sync::Arc;
use std::time::Duration;

use lyceum_types::Principal;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{info, warn};

use crate::error::{Result, SessionError};
use crate::provider::IdentityProvider;
use crate::store::{SessionStore, StoredSession};

/// Delay before the single login retry in [`SessionManager::login_with_recovery`].
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(300);

const EVENT_CAPACITY: usize = 16;

/// Where the process's session stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Anonymous,
    /// A provider login is in progress.
    Authenticating,
    Authenticated(Principal),
}

impl SessionStatus {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionStatus::Authenticated(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(Principal),
    /// Everything cached for the previous identity must be dropped.
    LoggedOut,
}

/// Owns the single active session of the process.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
    retry_delay: Duration,
}

struct ManagerInner {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    status: watch::Sender<SessionStatus>,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes login and logout.
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ManagerInner {
                provider,
                store,
                status: watch::Sender::new(SessionStatus::Anonymous),
                events,
                transition: Mutex::new(()),
            }),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the delay used by [`SessionManager::login_with_recovery`].
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.inner.status.borrow().principal().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.status.borrow().is_authenticated()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Subscribe to login/logout events.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn provider_name(&self) -> &str {
        self.inner.provider.name()
    }

    fn set_status(&self, status: SessionStatus) {
        self.inner.status.send_replace(status);
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Reload a stored session, if any, without running the provider.
    pub async fn restore(&self) -> Result<Option<Principal>> {
        let _guard = self.inner.transition.lock().await;

        let Some(stored) = self.inner.store.load().await? else {
            return Ok(None);
        };

        info!(principal = %stored.principal.short(), provider = %stored.provider, "session restored");
        self.set_status(SessionStatus::Authenticated(stored.principal.clone()));
        self.emit(SessionEvent::LoggedIn(stored.principal.clone()));
        Ok(Some(stored.principal))
    }

    /// Log in through the identity provider.
    ///
    /// Fails with [`SessionError::AlreadyAuthenticated`] if a session is
    /// already active or the provider still holds a delegation.
    pub async fn login(&self) -> Result<Principal> {
        let _guard = self.inner.transition.lock().await;

        if self.is_authenticated() {
            return Err(SessionError::AlreadyAuthenticated);
        }

        self.set_status(SessionStatus::Authenticating);
        let principal = match self.inner.provider.login().await {
            Ok(p) => p,
            Err(e) => {
                self.set_status(SessionStatus::Anonymous);
                return Err(e);
            }
        };

        let stored = StoredSession::new(principal.clone(), self.inner.provider.name());
        if let Err(e) = self.inner.store.save(&stored).await {
            warn!(error = %e, "failed to persist session; it will not survive a restart");
        }

        info!(principal = %principal.short(), "logged in");
        self.set_status(SessionStatus::Authenticated(principal.clone()));
        self.emit(SessionEvent::LoggedIn(principal.clone()));
        Ok(principal)
    }

    /// Clear the session and tell dependents to drop cached reads.
    ///
    /// Provider and store failures are logged; the local session is
    /// cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.inner.transition.lock().await;

        if let Err(e) = self.inner.provider.logout().await {
            warn!(error = %e, "identity provider logout failed");
        }
        if let Err(e) = self.inner.store.clear().await {
            warn!(error = %e, "failed to delete stored session");
        }

        self.set_status(SessionStatus::Anonymous);
        self.emit(SessionEvent::LoggedOut);
        info!("logged out");
        Ok(())
    }

    /// Log in, recovering once from a stale session.
    ///
    /// On [`SessionError::AlreadyAuthenticated`] the stale session is
    /// cleared and login is retried exactly once after the retry delay.
    pub async fn login_with_recovery(&self) -> Result<Principal> {
        match self.login().await {
            Err(SessionError::AlreadyAuthenticated) => {
                warn!("stale session detected, clearing and retrying login");
                self.logout().await?;
                tokio::time::sleep(self.retry_delay).await;
                self.login().await
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &*self.inner.status.borrow())
            .field("provider", &self.inner.provider.name())
            .finish()
    }
}
