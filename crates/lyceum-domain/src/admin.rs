//! Admin console access and key-gated writes.
//!
//! The console is open to an authenticated caller whose role query says
//! admin. Writes that change the catalog or payment setup additionally
//! need an admin key verified in this process; the key travels with the
//! write.

use std::sync::Arc;

use lyceum_session::SessionManager;
use lyceum_types::{Course, Instructor, LiveClass, StripeConfiguration};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{DomainError, Result};
use crate::mutation::{Mutation, MutationOrchestrator, MutationOutput};
use crate::notify::Notification;
use crate::queries::Queries;

/// Remote message returned before any admin key has been set.
const KEY_NOT_CONFIGURED: &str = "Admin key not configured";

/// Result of checking an admin key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Verified,
    Rejected,
    /// No key exists yet; the caller may set one.
    NotConfigured,
}

/// Guards the admin console.
#[derive(Clone)]
pub struct AdminGate {
    orchestrator: MutationOrchestrator,
    queries: Queries,
    session: SessionManager,
    verified_key: Arc<Mutex<Option<String>>>,
}

impl AdminGate {
    pub fn new(orchestrator: MutationOrchestrator, queries: Queries, session: SessionManager) -> Self {
        Self {
            orchestrator,
            queries,
            session,
            verified_key: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a key has been verified in this process.
    pub fn has_verified_key(&self) -> bool {
        self.verified_key.lock().is_some()
    }

    /// Drop the verified key, e.g. on logout.
    pub fn forget_key(&self) {
        if self.verified_key.lock().take().is_some() {
            debug!("admin key forgotten");
        }
    }

    /// Fail unless the caller may use the admin console.
    pub async fn require_console(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            return Err(DomainError::Unauthorized(
                "Please login to access the admin console".to_string(),
            ));
        }
        if !self.queries.is_admin().await? {
            return Err(DomainError::Unauthorized("Admin access required".to_string()));
        }
        Ok(())
    }

    /// Check `key` with the backend and remember it if it is valid.
    pub async fn verify_key(&self, key: &str) -> Result<KeyStatus> {
        let result = self
            .orchestrator
            .mutate(Mutation::VerifyAdminKey {
                key: key.to_string(),
            })
            .await;

        let notifier = self.orchestrator.notifier();
        match result {
            Ok(MutationOutput::KeyValid(true)) => {
                *self.verified_key.lock() = Some(key.to_string());
                info!("admin key verified");
                notifier.notify(Notification::success("Admin key verified successfully"));
                Ok(KeyStatus::Verified)
            }
            Ok(_) => {
                notifier.notify(Notification::error("Invalid admin key"));
                Ok(KeyStatus::Rejected)
            }
            Err(DomainError::Remote(message)) if message.contains(KEY_NOT_CONFIGURED) => {
                Ok(KeyStatus::NotConfigured)
            }
            Err(e) => Err(e),
        }
    }

    /// Set the admin key. The new key counts as verified.
    pub async fn set_key(&self, key: &str) -> Result<()> {
        self.orchestrator
            .mutate(Mutation::SetAdminKey {
                key: key.to_string(),
            })
            .await?;
        *self.verified_key.lock() = Some(key.to_string());
        Ok(())
    }

    async fn key_for_write(&self) -> Result<String> {
        self.require_console().await?;
        self.verified_key
            .lock()
            .clone()
            .ok_or_else(|| DomainError::Unauthorized("Please verify the admin key first".to_string()))
    }

    pub async fn create_course(&self, course: Course) -> Result<()> {
        let admin_key = self.key_for_write().await?;
        self.orchestrator
            .mutate(Mutation::CreateCourse { course, admin_key })
            .await?;
        Ok(())
    }

    pub async fn add_instructor(&self, instructor: Instructor) -> Result<()> {
        let admin_key = self.key_for_write().await?;
        self.orchestrator
            .mutate(Mutation::AddInstructor {
                instructor,
                admin_key,
            })
            .await?;
        Ok(())
    }

    pub async fn schedule_live_class(&self, live_class: LiveClass) -> Result<()> {
        let admin_key = self.key_for_write().await?;
        self.orchestrator
            .mutate(Mutation::ScheduleLiveClass {
                live_class,
                admin_key,
            })
            .await?;
        Ok(())
    }

    /// Save the payment provider setup. The backend call carries no key,
    /// but the gate still requires one.
    pub async fn configure_stripe(&self, config: StripeConfiguration) -> Result<()> {
        self.key_for_write().await?;
        self.orchestrator
            .mutate(Mutation::SetStripeConfiguration(config))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use lyceum_cache::{CacheConfig, QueryCache};
    use lyceum_client::testing::MockTransport;
    use lyceum_client::{LyceumClient, Operation, Readiness};
    use lyceum_session::{InMemorySessionStore, ScriptedIdentity};
    use lyceum_types::Principal;
    use serde_json::{Value, json};

    struct Harness {
        mock: Arc<MockTransport>,
        notes: Arc<MemoryNotifier>,
        gate: AdminGate,
    }

    async fn harness(logged_in: bool) -> Harness {
        let principal = Principal::parse("admin").unwrap();
        let mock = Arc::new(MockTransport::new());
        let client = LyceumClient::with_transport(mock.clone());
        client.set_readiness(Readiness::Authenticated(principal.clone()));
        let cache = QueryCache::new(CacheConfig::new());
        let notes = Arc::new(MemoryNotifier::new());
        let orchestrator = MutationOrchestrator::new(client.clone(), cache.clone(), notes.clone());
        let session = SessionManager::new(
            Arc::new(ScriptedIdentity::new(principal)),
            Arc::new(InMemorySessionStore::new()),
        );
        if logged_in {
            session.login().await.unwrap();
        }
        Harness {
            mock,
            notes,
            gate: AdminGate::new(orchestrator, Queries::new(client, cache), session),
        }
    }

    fn instructor() -> Instructor {
        Instructor {
            id: "i1".into(),
            name: "Ferris".into(),
            bio: "Crab".into(),
            qualifications: vec![],
            experience: 5,
            profile_image: None,
        }
    }

    #[tokio::test]
    async fn test_console_requires_login_and_role() {
        let h = harness(false).await;
        assert!(matches!(
            h.gate.require_console().await,
            Err(DomainError::Unauthorized(_))
        ));

        let h = harness(true).await;
        h.mock.respond(Operation::IsCallerAdmin, json!(false));
        assert!(h.gate.require_console().await.is_err());

        let h = harness(true).await;
        h.mock.respond(Operation::IsCallerAdmin, json!(true));
        h.gate.require_console().await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_key_outcomes() {
        let h = harness(true).await;

        h.mock.respond(Operation::VerifyAdminKey, json!(false));
        assert_eq!(h.gate.verify_key("wrong").await.unwrap(), KeyStatus::Rejected);
        assert!(!h.gate.has_verified_key());
        assert_eq!(h.notes.take(), vec![Notification::error("Invalid admin key")]);

        h.mock.fail(Operation::VerifyAdminKey, "Admin key not configured");
        assert_eq!(
            h.gate.verify_key("any").await.unwrap(),
            KeyStatus::NotConfigured
        );

        h.mock.respond(Operation::VerifyAdminKey, json!(true));
        assert_eq!(h.gate.verify_key("secret").await.unwrap(), KeyStatus::Verified);
        assert!(h.gate.has_verified_key());
    }

    #[tokio::test]
    async fn test_key_gated_write_needs_verified_key() {
        let h = harness(true).await;
        h.mock.respond(Operation::IsCallerAdmin, json!(true));
        h.mock.respond(Operation::AddInstructor, Value::Null);

        let err = h.gate.add_instructor(instructor()).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert_eq!(h.mock.call_count(Operation::AddInstructor), 0);

        h.mock.respond(Operation::SetAdminKey, Value::Null);
        h.gate.set_key("fresh-key").await.unwrap();
        h.gate.add_instructor(instructor()).await.unwrap();

        let call = h
            .mock
            .calls()
            .into_iter()
            .find(|c| c.operation == Operation::AddInstructor)
            .unwrap();
        assert_eq!(call.args[1], json!("fresh-key"));
    }

    #[tokio::test]
    async fn test_forget_key() {
        let h = harness(true).await;
        h.mock.respond(Operation::SetAdminKey, Value::Null);
        h.gate.set_key("k").await.unwrap();
        h.gate.forget_key();
        assert!(!h.gate.has_verified_key());
    }
}
