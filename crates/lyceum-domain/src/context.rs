//! Application context.
//!
//! Owns the wiring between components: session status drives client
//! readiness (and with it the cache's read gate), and every change of
//! identity (login, logout, or a different principal) purges the cached
//! reads and the verified admin key. Cache keys carry no principal.

use std::sync::Arc;

use lyceum_cache::{CacheConfig, QueryCache};
use lyceum_client::{LyceumClient, Readiness};
use lyceum_config::Settings;
use lyceum_session::{SessionEvent, SessionManager, SessionStatus};
use lyceum_types::{Course, Principal, Review};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::admin::AdminGate;
use crate::error::{DomainError, Result};
use crate::ledger::PaymentLedger;
use crate::mutation::{Mutation, MutationOrchestrator};
use crate::notify::{Notification, Notifier};
use crate::payment::{CheckoutRedirect, PaymentConfig, PaymentFlow};
use crate::queries::Queries;

/// What an enroll request led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Free course: enrolled directly.
    Enrolled,
    /// Paid course: the user must complete checkout at the redirect URL.
    Checkout(CheckoutRedirect),
}

/// Everything a front-end needs, explicitly owned.
#[derive(Clone)]
pub struct AppContext {
    client: LyceumClient,
    session: SessionManager,
    cache: QueryCache,
    queries: Queries,
    orchestrator: MutationOrchestrator,
    payments: PaymentFlow,
    admin: AdminGate,
    /// Identity the cached reads were fetched under; `None` is anonymous.
    cache_identity: Arc<Mutex<Option<Principal>>>,
    shutdown: CancellationToken,
}

/// Readiness implied by a session status. No calls go out while a login is
/// in progress.
fn readiness_for(status: &SessionStatus) -> Readiness {
    match status {
        SessionStatus::Anonymous => Readiness::Anonymous,
        SessionStatus::Authenticating => Readiness::Unavailable,
        SessionStatus::Authenticated(p) => Readiness::Authenticated(p.clone()),
    }
}

impl AppContext {
    pub fn new(
        client: LyceumClient,
        session: SessionManager,
        cache_config: CacheConfig,
        payment_config: PaymentConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let gate_client = client.clone();
        let cache = QueryCache::new(cache_config).with_gate(move || gate_client.is_ready());
        let queries = Queries::new(client.clone(), cache.clone());
        let orchestrator = MutationOrchestrator::new(client.clone(), cache.clone(), notifier);
        let payments = PaymentFlow::new(orchestrator.clone(), client.clone(), payment_config);
        let admin = AdminGate::new(orchestrator.clone(), queries.clone(), session.clone());

        Self {
            client,
            session,
            cache,
            queries,
            orchestrator,
            payments,
            admin,
            cache_identity: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Keep payment confirmation state in `ledger` instead of memory.
    pub fn with_payment_ledger(mut self, ledger: Arc<dyn PaymentLedger>) -> Self {
        self.payments = self.payments.with_ledger(ledger);
        self
    }

    /// Build from resolved settings.
    pub fn from_settings(
        settings: &Settings,
        client: LyceumClient,
        session: SessionManager,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut cache_config = CacheConfig::new().with_max_entries(settings.cache_max_entries);
        if let Some(age) = settings.cache_stale_after {
            cache_config = cache_config.with_stale_after(age);
        }
        Self::new(
            client,
            session,
            cache_config,
            PaymentConfig::from(settings),
            notifier,
        )
    }

    pub fn client(&self) -> &LyceumClient {
        &self.client
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn queries(&self) -> &Queries {
        &self.queries
    }

    pub fn mutations(&self) -> &MutationOrchestrator {
        &self.orchestrator
    }

    pub fn payments(&self) -> &PaymentFlow {
        &self.payments
    }

    pub fn admin(&self) -> &AdminGate {
        &self.admin
    }

    /// Restore any stored session, make the client ready, and start
    /// following session changes.
    pub async fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        if let Err(e) = self.session.restore().await {
            warn!(error = %e, "could not restore stored session");
        }
        self.switch_identity(self.session.principal());
        self.apply_status(&self.session.status());
        Ok(vec![self.follow_status(), self.follow_events()])
    }

    /// Stop the background tasks started by [`AppContext::start`].
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn apply_status(&self, status: &SessionStatus) {
        self.client.set_readiness(readiness_for(status));
    }

    fn purge(&self) {
        let dropped = self.cache.clear();
        self.admin.forget_key();
        debug!(dropped, "cached reads purged");
    }

    /// Purge unless the cache already belongs to `identity`. Both the
    /// explicit login/logout paths and the event follower land here, so a
    /// transition purges once.
    fn switch_identity(&self, identity: Option<Principal>) {
        {
            let mut current = self.cache_identity.lock();
            if *current == identity {
                return;
            }
            debug!(
                from = ?current.as_ref().map(Principal::short),
                to = ?identity.as_ref().map(Principal::short),
                "identity changed"
            );
            *current = identity;
        }
        self.purge();
    }

    fn follow_status(&self) -> JoinHandle<()> {
        let this = self.clone();
        let mut rx = self.session.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = this.shutdown.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = rx.borrow_and_update().clone();
                        this.apply_status(&status);
                    }
                }
            }
        })
    }

    fn follow_events(&self) -> JoinHandle<()> {
        let this = self.clone();
        let mut rx = self.session.events();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = this.shutdown.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(SessionEvent::LoggedOut) => this.switch_identity(None),
                        Ok(SessionEvent::LoggedIn(principal)) => {
                            this.switch_identity(Some(principal))
                        }
                        Err(RecvError::Lagged(n)) => {
                            // Missed events may include an identity change.
                            warn!(missed = n, "session events lagged, purging cache");
                            *this.cache_identity.lock() = this.session.principal();
                            this.purge();
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    /// Log in, recovering once from a stale session.
    pub async fn login(&self) -> Result<Principal> {
        let result = self.session.login_with_recovery().await;
        if let Ok(principal) = &result {
            // Reads cached while anonymous were answered for another caller.
            self.switch_identity(Some(principal.clone()));
        }
        self.apply_status(&self.session.status());
        match result {
            Ok(principal) => {
                info!(principal = %principal.short(), "login complete");
                Ok(principal)
            }
            Err(e) => {
                let e = DomainError::from(e);
                self.notify(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Log out and drop everything cached for the previous identity.
    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await?;
        self.switch_identity(None);
        self.apply_status(&self.session.status());
        Ok(())
    }

    fn notify(&self, notification: Notification) {
        self.orchestrator.notifier().notify(notification);
    }

    fn require_principal(&self, message: &str) -> Result<Principal> {
        self.session.principal().ok_or_else(|| {
            self.notify(Notification::error(message));
            DomainError::validation(message)
        })
    }

    /// Enroll in `course_id`: directly when free, through checkout when paid.
    pub async fn enroll(&self, course_id: &str) -> Result<EnrollOutcome> {
        self.require_principal("Please login to enroll in courses")?;

        if course_id.trim().is_empty() {
            let message = "Course id is required";
            self.notify(Notification::error(message));
            return Err(DomainError::validation(message));
        }
        // Inert only when the client is not ready.
        let course: Course = self
            .queries
            .course(course_id)
            .await?
            .ok_or(DomainError::TransportUnavailable)?;

        if course.is_free {
            self.orchestrator
                .mutate(Mutation::Enroll {
                    course_id: course.id.clone(),
                })
                .await?;
            Ok(EnrollOutcome::Enrolled)
        } else {
            Ok(EnrollOutcome::Checkout(
                self.payments.begin_checkout(&course).await?,
            ))
        }
    }

    /// Submit a review as the current user, who must be enrolled.
    pub async fn submit_review(&self, course_id: &str, rating: u8, comment: &str) -> Result<()> {
        let principal = self.require_principal("Please login to submit a review")?;

        if !self.queries.is_enrolled(course_id).await? {
            let message = "You must be enrolled in this course to submit a review";
            self.notify(Notification::error(message));
            return Err(DomainError::validation(message));
        }

        let review = Review::new(principal, course_id, rating, comment);
        self.orchestrator
            .mutate(Mutation::SubmitReview(review))
            .await?;
        Ok(())
    }
}
