//! Hosted-checkout redirects and payment confirmation.
//!
//! A paid enrollment leaves the process: [`PaymentFlow::begin_checkout`]
//! yields the provider's checkout URL, and the provider later sends the
//! user back to a return URL carrying `courseId` and `sessionId`. The
//! intent is rebuilt from that URL alone ([`PaymentReturn::from_url`]) and
//! confirmed once per checkout session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lyceum_config::Settings;
use lyceum_types::{Course, ShoppingItem, StripeSessionStatus};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{DomainError, Result};
use crate::ledger::{InMemoryPaymentLedger, LedgerEntry, LedgerState, PaymentLedger};
use crate::mutation::{Mutation, MutationOrchestrator, MutationOutput};

/// Payment provider id sent with confirmations.
pub const PAYMENT_PROVIDER: &str = "stripe";

/// Placeholder the provider substitutes with the checkout session id.
pub const CHECKOUT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

pub const SUCCESS_PATH: &str = "/payment-success";
pub const CANCEL_PATH: &str = "/payment-failure";

/// Settings for the payment flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    /// Base URL the provider redirects back to.
    pub return_base_url: String,
    pub currency: String,
    /// How long a caller waits for a confirmation. The call itself is
    /// never abandoned.
    pub confirm_timeout: Duration,
    /// Pause between a confirmed payment and the dashboard.
    pub redirect_delay: Duration,
}

impl PaymentConfig {
    pub fn new(return_base_url: impl Into<String>) -> Self {
        Self {
            return_base_url: return_base_url.into(),
            currency: "USD".to_string(),
            confirm_timeout: Duration::from_secs(120),
            redirect_delay: Duration::from_secs(3),
        }
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    fn base(&self) -> &str {
        self.return_base_url.trim_end_matches('/')
    }

    /// `{base}/payment-success?courseId={id}&sessionId={CHECKOUT_SESSION_ID}`
    pub fn success_url(&self, course_id: &str) -> String {
        let id: String = url::form_urlencoded::byte_serialize(course_id.as_bytes()).collect();
        format!(
            "{}{}?courseId={}&sessionId={}",
            self.base(),
            SUCCESS_PATH,
            id,
            CHECKOUT_SESSION_PLACEHOLDER
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base(), CANCEL_PATH)
    }
}

impl From<&Settings> for PaymentConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            return_base_url: settings.return_base_url.clone(),
            currency: settings.currency.clone(),
            confirm_timeout: settings.confirm_timeout,
            redirect_delay: settings.redirect_delay,
        }
    }
}

/// Where a payment stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Initiated,
    Redirected,
    Confirming,
    Enrolled,
    Failed,
}

/// One course purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub course_id: String,
    /// Provider checkout session id, once known.
    pub external_session_id: Option<String>,
    pub status: PaymentStatus,
}

/// The user should be sent to `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub intent: PaymentIntent,
    pub url: String,
}

/// A return from the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReturn {
    pub course_id: String,
    pub session_id: String,
}

impl PaymentReturn {
    /// Rebuild the intent from a return URL.
    ///
    /// Only the `courseId` and `sessionId` query parameters matter. If
    /// either is missing or empty (or the URL does not parse) there is
    /// nothing to confirm and `None` is returned.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let mut course_id = None;
        let mut session_id = None;
        for (name, value) in parsed.query_pairs() {
            match name.as_ref() {
                "courseId" => course_id = Some(value.into_owned()),
                "sessionId" => session_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let course_id = course_id.filter(|v| !v.is_empty())?;
        let session_id = session_id.filter(|v| !v.is_empty())?;
        // The provider never substituted the placeholder.
        if session_id == CHECKOUT_SESSION_PLACEHOLDER {
            return None;
        }
        Some(Self {
            course_id,
            session_id,
        })
    }
}

/// What a return URL means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnKind {
    /// A completed checkout to confirm.
    Success(PaymentReturn),
    /// The user backed out of checkout.
    Cancelled,
    /// Not a payment return, or missing parameters.
    Unrecognized,
}

/// Classify a URL the provider sent the user back to.
pub fn classify_return(url: &str) -> ReturnKind {
    let Ok(parsed) = Url::parse(url) else {
        return ReturnKind::Unrecognized;
    };
    match parsed.path().trim_end_matches('/') {
        CANCEL_PATH => ReturnKind::Cancelled,
        SUCCESS_PATH => PaymentReturn::from_url(url)
            .map(ReturnKind::Success)
            .unwrap_or(ReturnKind::Unrecognized),
        _ => ReturnKind::Unrecognized,
    }
}

/// Result of [`PaymentFlow::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Payment confirmed; show the success state for `redirect_after`,
    /// then move on to the dashboard.
    Enrolled { redirect_after: Duration },
    /// A confirmation for this session is already running.
    AlreadyInProgress,
    /// This session was already confirmed.
    AlreadyCompleted,
}

/// Drives checkout redirects and confirmations.
#[derive(Clone)]
pub struct PaymentFlow {
    orchestrator: MutationOrchestrator,
    client: lyceum_client::LyceumClient,
    config: PaymentConfig,
    /// Intents by checkout session id.
    sessions: Arc<Mutex<HashMap<String, PaymentIntent>>>,
    ledger: Arc<dyn PaymentLedger>,
}

impl PaymentFlow {
    pub fn new(
        orchestrator: MutationOrchestrator,
        client: lyceum_client::LyceumClient,
        config: PaymentConfig,
    ) -> Self {
        Self {
            orchestrator,
            client,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ledger: Arc::new(InMemoryPaymentLedger::new()),
        }
    }

    /// Keep confirmation state in `ledger`, typically a
    /// [`FilePaymentLedger`](crate::FilePaymentLedger) shared by every
    /// process of the same user.
    pub fn with_ledger(mut self, ledger: Arc<dyn PaymentLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Request a hosted checkout session for `course`.
    pub async fn begin_checkout(&self, course: &Course) -> Result<CheckoutRedirect> {
        if course.id.is_empty() {
            return Err(DomainError::validation("Course id is required"));
        }
        if course.is_free {
            return Err(DomainError::validation(
                "Free courses are enrolled directly, without checkout",
            ));
        }

        let item = ShoppingItem {
            product_name: course.title.clone(),
            product_description: course.description.clone(),
            price_in_cents: course.price,
            currency: self.config.currency.clone(),
            quantity: 1,
        };

        let output = self
            .orchestrator
            .mutate(Mutation::CreateCheckoutSession {
                items: vec![item],
                success_url: self.config.success_url(&course.id),
                cancel_url: self.config.cancel_url(),
            })
            .await?;

        let MutationOutput::Checkout(session) = output else {
            return Err(DomainError::Internal(
                "checkout returned no session".to_string(),
            ));
        };

        info!(course_id = %course.id, session_id = %session.id, "checkout session created");
        let intent = PaymentIntent {
            course_id: course.id.clone(),
            external_session_id: Some(session.id.clone()),
            status: PaymentStatus::Redirected,
        };
        self.sessions
            .lock()
            .insert(session.id.clone(), intent.clone());

        Ok(CheckoutRedirect {
            intent,
            url: session.url,
        })
    }

    /// Current intent for a checkout session, if this process has seen it.
    pub fn intent(&self, session_id: &str) -> Option<PaymentIntent> {
        self.sessions.lock().get(session_id).cloned()
    }

    /// Confirm a returning payment.
    ///
    /// Confirmation runs at most once per session id at a time and never
    /// again after it succeeded, within this process and across processes
    /// sharing the ledger. The call runs on its own task, so it completes
    /// even if the caller goes away. A failure is reported, not retried.
    ///
    /// When the backend has not answered within `confirm_timeout` the
    /// caller gets [`DomainError::ConfirmationPending`]; the intent stays
    /// `Confirming` until the call lands, and repeat confirmations return
    /// [`ConfirmOutcome::AlreadyInProgress`] meanwhile.
    pub async fn confirm(&self, ret: PaymentReturn) -> Result<ConfirmOutcome> {
        let previous = {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .entry(ret.session_id.clone())
                .or_insert_with(|| PaymentIntent {
                    course_id: ret.course_id.clone(),
                    external_session_id: Some(ret.session_id.clone()),
                    status: PaymentStatus::Initiated,
                });
            match entry.status {
                PaymentStatus::Confirming => return Ok(ConfirmOutcome::AlreadyInProgress),
                PaymentStatus::Enrolled => return Ok(ConfirmOutcome::AlreadyCompleted),
                previous => {
                    entry.course_id = ret.course_id.clone();
                    entry.status = PaymentStatus::Confirming;
                    previous
                }
            }
        };

        match self.claim(&ret).await {
            Ok(None) => {}
            Ok(Some(outcome)) => {
                let status = match outcome {
                    ConfirmOutcome::AlreadyCompleted => PaymentStatus::Enrolled,
                    _ => previous,
                };
                self.set_status(&ret.session_id, status);
                return Ok(outcome);
            }
            Err(e) => {
                self.set_status(&ret.session_id, previous);
                return Err(e);
            }
        }

        let session_id = ret.session_id.clone();
        let this = self.clone();
        let mut task = tokio::spawn(async move { this.run_confirmation(ret).await });

        match tokio::time::timeout(self.config.confirm_timeout, &mut task).await {
            Ok(joined) => joined
                .map_err(|e| DomainError::Internal(format!("confirmation task failed: {}", e)))?,
            Err(_) => {
                warn!(session_id = %session_id, timeout = ?self.config.confirm_timeout, "payment confirmation still pending");
                Err(DomainError::ConfirmationPending(format!(
                    "no answer from the backend after {:?}",
                    self.config.confirm_timeout
                )))
            }
        }
    }

    /// Check the ledger for an earlier confirmation of this session and, if
    /// there is none, mark it pending. `Some` means nothing is to be sent.
    async fn claim(&self, ret: &PaymentReturn) -> Result<Option<ConfirmOutcome>> {
        match self.ledger.get(&ret.session_id).await? {
            Some(entry) if entry.state == LedgerState::Confirmed => {
                debug!(session_id = %ret.session_id, "payment already confirmed");
                return Ok(Some(ConfirmOutcome::AlreadyCompleted));
            }
            Some(entry) if !entry.is_abandoned(self.config.confirm_timeout) => {
                debug!(session_id = %ret.session_id, "payment confirmation pending elsewhere");
                return Ok(Some(ConfirmOutcome::AlreadyInProgress));
            }
            Some(entry) => {
                warn!(session_id = %ret.session_id, since = %entry.updated_at, "retrying abandoned payment confirmation");
            }
            None => {}
        }

        self.ledger
            .record(&ret.session_id, LedgerEntry::pending(&ret.course_id))
            .await?;
        Ok(None)
    }

    async fn run_confirmation(&self, ret: PaymentReturn) -> Result<ConfirmOutcome> {
        let mutation = Mutation::ProcessCoursePayment {
            provider_id: PAYMENT_PROVIDER.to_string(),
            course_id: ret.course_id.clone(),
            session_id: ret.session_id.clone(),
        };

        let result = self
            .orchestrator
            .mutate(mutation)
            .await
            .map_err(|e| DomainError::ConfirmationFailed(e.to_string()));

        let stored = match &result {
            Ok(_) => {
                self.ledger
                    .record(&ret.session_id, LedgerEntry::confirmed(&ret.course_id))
                    .await
            }
            Err(_) => self.ledger.forget(&ret.session_id).await,
        };
        if let Err(e) = stored {
            warn!(session_id = %ret.session_id, error = %e, "could not update payment ledger");
        }

        match result {
            Ok(_) => {
                self.set_status(&ret.session_id, PaymentStatus::Enrolled);
                info!(course_id = %ret.course_id, session_id = %ret.session_id, "payment confirmed");
                Ok(ConfirmOutcome::Enrolled {
                    redirect_after: self.config.redirect_delay,
                })
            }
            Err(e) => {
                self.set_status(&ret.session_id, PaymentStatus::Failed);
                warn!(course_id = %ret.course_id, session_id = %ret.session_id, error = %e, "payment confirmation failed");
                Err(e)
            }
        }
    }

    fn set_status(&self, session_id: &str, status: PaymentStatus) {
        if let Some(intent) = self.sessions.lock().get_mut(session_id) {
            intent.status = status;
        }
    }

    /// Record that the user cancelled checkout for `session_id`.
    pub fn mark_cancelled(&self, session_id: &str) {
        self.set_status(session_id, PaymentStatus::Failed);
    }

    /// Provider-verified status of a checkout session.
    pub async fn checkout_status(&self, session_id: &str) -> Result<StripeSessionStatus> {
        if session_id.is_empty() {
            return Err(DomainError::validation("Checkout session id is required"));
        }
        Ok(self.client.payments().session_status(session_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::ledger::FilePaymentLedger;
    use crate::notify::{MemoryNotifier, Notification};
    use lyceum_cache::{CacheConfig, EntryStatus, QueryCache};
    use lyceum_client::testing::MockTransport;
    use lyceum_client::{LyceumClient, Operation, Readiness};
    use lyceum_types::Principal;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    struct Harness {
        mock: Arc<MockTransport>,
        cache: QueryCache,
        notes: Arc<MemoryNotifier>,
        flow: PaymentFlow,
    }

    fn harness(config: PaymentConfig) -> Harness {
        harness_with_ledger(config, Arc::new(InMemoryPaymentLedger::new()))
    }

    fn harness_with_ledger(config: PaymentConfig, ledger: Arc<dyn PaymentLedger>) -> Harness {
        let mock = Arc::new(MockTransport::new());
        let client = LyceumClient::with_transport(mock.clone());
        client.set_readiness(Readiness::Authenticated(Principal::parse("alice").unwrap()));
        let cache = QueryCache::new(CacheConfig::new());
        let notes = Arc::new(MemoryNotifier::new());
        let orchestrator = MutationOrchestrator::new(client.clone(), cache.clone(), notes.clone());
        Harness {
            mock,
            cache,
            notes,
            flow: PaymentFlow::new(orchestrator, client, config).with_ledger(ledger),
        }
    }

    fn paid_course() -> Course {
        Course {
            id: "c 42".into(),
            title: "Async Rust".into(),
            description: "Futures and executors".into(),
            category: "Programming".into(),
            difficulty: "Advanced".into(),
            instructor: "Ferris".into(),
            duration: 120,
            price: 4999,
            is_free: false,
            curriculum: vec![],
            prerequisites: vec![],
            videos: vec![],
        }
    }

    fn ret(course: &str, session: &str) -> PaymentReturn {
        PaymentReturn {
            course_id: course.into(),
            session_id: session.into(),
        }
    }

    #[test]
    fn test_return_urls() {
        let config = PaymentConfig::new("https://lyceum.example/");
        assert_eq!(
            config.success_url("c 42"),
            "https://lyceum.example/payment-success?courseId=c+42&sessionId={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(config.cancel_url(), "https://lyceum.example/payment-failure");
    }

    #[test]
    fn test_from_url() {
        assert_eq!(
            PaymentReturn::from_url(
                "https://lyceum.example/payment-success?courseId=c+42&sessionId=cs_123"
            ),
            Some(ret("c 42", "cs_123"))
        );
        assert_eq!(
            PaymentReturn::from_url("https://lyceum.example/payment-success?courseId=c1"),
            None
        );
        assert_eq!(
            PaymentReturn::from_url("https://lyceum.example/payment-success?courseId=&sessionId=x"),
            None
        );
        assert_eq!(PaymentReturn::from_url("not a url"), None);
    }

    #[test]
    fn test_classify_return() {
        assert_eq!(
            classify_return("https://lyceum.example/payment-failure"),
            ReturnKind::Cancelled
        );
        assert!(matches!(
            classify_return("https://lyceum.example/payment-success?courseId=c1&sessionId=s1"),
            ReturnKind::Success(_)
        ));
        assert_eq!(
            classify_return("https://lyceum.example/payment-success?courseId=c1"),
            ReturnKind::Unrecognized
        );
    }

    #[tokio::test]
    async fn test_begin_checkout() {
        let h = harness(PaymentConfig::new("https://lyceum.example"));
        h.mock.respond(
            Operation::CreateCheckoutSession,
            json!(r#"{"id":"cs_123","url":"https://checkout.example/cs_123"}"#),
        );

        let redirect = h.flow.begin_checkout(&paid_course()).await.unwrap();
        assert_eq!(redirect.url, "https://checkout.example/cs_123");
        assert_eq!(redirect.intent.status, PaymentStatus::Redirected);
        assert_eq!(redirect.intent.external_session_id.as_deref(), Some("cs_123"));

        let call = &h.mock.calls()[0];
        assert_eq!(call.args[0][0]["priceInCents"], json!(4999));
        assert_eq!(call.args[0][0]["currency"], json!("USD"));
        assert_eq!(call.args[0][0]["quantity"], json!(1));
        assert_eq!(
            call.args[2],
            json!("https://lyceum.example/payment-failure")
        );
    }

    #[tokio::test]
    async fn test_free_course_has_no_checkout() {
        let h = harness(PaymentConfig::new("https://lyceum.example"));
        let mut course = paid_course();
        course.is_free = true;

        assert!(h.flow.begin_checkout(&course).await.unwrap_err().is_validation());
        assert!(h.mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_session_id_is_inert() {
        let h = harness(PaymentConfig::new("https://lyceum.example"));
        let url = "https://lyceum.example/payment-success?courseId=c1";

        assert!(PaymentReturn::from_url(url).is_none());
        assert!(h.mock.calls().is_empty());
        assert!(h.notes.is_empty());
    }

    #[tokio::test]
    async fn test_confirm_enrolls_once() {
        let h = harness(PaymentConfig::new("https://lyceum.example"));
        let gate = h.mock.hold(Operation::ProcessCoursePayment);
        h.mock.respond(Operation::ProcessCoursePayment, Value::Null);
        h.cache
            .read(&keys::my_enrolled_courses(), || async {
                Ok::<_, DomainError>(Vec::<String>::new())
            })
            .await
            .unwrap();

        let first = {
            let flow = h.flow.clone();
            tokio::spawn(async move { flow.confirm(ret("c1", "cs_1")).await })
        };
        h.mock.wait_for_calls(Operation::ProcessCoursePayment, 1).await;

        assert_eq!(
            h.flow.confirm(ret("c1", "cs_1")).await.unwrap(),
            ConfirmOutcome::AlreadyInProgress
        );

        gate.notify_one();
        assert_eq!(
            first.await.unwrap().unwrap(),
            ConfirmOutcome::Enrolled {
                redirect_after: Duration::from_secs(3)
            }
        );
        assert_eq!(
            h.flow.confirm(ret("c1", "cs_1")).await.unwrap(),
            ConfirmOutcome::AlreadyCompleted
        );

        assert_eq!(h.mock.call_count(Operation::ProcessCoursePayment), 1);
        let args = &h.mock.calls()[0].args;
        assert_eq!(args, &vec![json!("stripe"), json!("c1"), json!("cs_1")]);
        assert_eq!(
            h.cache.status(&keys::my_enrolled_courses()),
            Some(EntryStatus::Idle)
        );
        assert_eq!(h.flow.intent("cs_1").unwrap().status, PaymentStatus::Enrolled);
        assert_eq!(
            h.notes.take(),
            vec![Notification::success("Payment processed successfully")]
        );
    }

    #[tokio::test]
    async fn test_confirm_failure_is_not_retried() {
        let h = harness(PaymentConfig::new("https://lyceum.example"));
        h.mock
            .fail(Operation::ProcessCoursePayment, "Payment not completed");

        let err = h.flow.confirm(ret("c1", "cs_2")).await.unwrap_err();
        assert!(matches!(err, DomainError::ConfirmationFailed(ref m) if m == "Payment not completed"));
        assert_eq!(h.flow.intent("cs_2").unwrap().status, PaymentStatus::Failed);
        assert_eq!(h.mock.call_count(Operation::ProcessCoursePayment), 1);
    }

    #[tokio::test]
    async fn test_timeout_leaves_confirmation_pending() {
        let h = harness(
            PaymentConfig::new("https://lyceum.example")
                .with_confirm_timeout(Duration::from_millis(20)),
        );
        let gate = h.mock.hold(Operation::ProcessCoursePayment);
        h.mock.respond(Operation::ProcessCoursePayment, Value::Null);

        let err = h.flow.confirm(ret("c1", "cs_3")).await.unwrap_err();
        assert!(err.is_pending());
        assert_eq!(h.flow.intent("cs_3").unwrap().status, PaymentStatus::Confirming);
        assert!(h.notes.is_empty());

        // Navigating back to the return URL must not send a second call.
        assert_eq!(
            h.flow.confirm(ret("c1", "cs_3")).await.unwrap(),
            ConfirmOutcome::AlreadyInProgress
        );
        assert_eq!(h.mock.call_count(Operation::ProcessCoursePayment), 1);

        gate.notify_one();
        while h.flow.intent("cs_3").unwrap().status == PaymentStatus::Confirming {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.flow.intent("cs_3").unwrap().status, PaymentStatus::Enrolled);
        assert_eq!(
            h.notes.take(),
            vec![Notification::success("Payment processed successfully")]
        );
        assert_eq!(
            h.flow.confirm(ret("c1", "cs_3")).await.unwrap(),
            ConfirmOutcome::AlreadyCompleted
        );
        assert_eq!(h.mock.call_count(Operation::ProcessCoursePayment), 1);
    }

    #[tokio::test]
    async fn test_confirmed_session_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = PaymentConfig::new("https://lyceum.example");

        let first = harness_with_ledger(
            config.clone(),
            Arc::new(FilePaymentLedger::new(dir.path())),
        );
        first.mock.respond(Operation::ProcessCoursePayment, Value::Null);
        assert!(matches!(
            first.flow.confirm(ret("c1", "cs_4")).await.unwrap(),
            ConfirmOutcome::Enrolled { .. }
        ));

        // A new process with nothing in memory.
        let second = harness_with_ledger(config, Arc::new(FilePaymentLedger::new(dir.path())));
        assert_eq!(
            second.flow.confirm(ret("c1", "cs_4")).await.unwrap(),
            ConfirmOutcome::AlreadyCompleted
        );
        assert_eq!(second.flow.intent("cs_4").unwrap().status, PaymentStatus::Enrolled);
        assert!(second.mock.calls().is_empty());
        assert!(second.notes.is_empty());
    }

    #[tokio::test]
    async fn test_pending_elsewhere_is_not_resent() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(FilePaymentLedger::new(dir.path()));
        ledger
            .record("cs_5", LedgerEntry::pending("c1"))
            .await
            .unwrap();

        let h = harness_with_ledger(PaymentConfig::new("https://lyceum.example"), ledger.clone());
        assert_eq!(
            h.flow.confirm(ret("c1", "cs_5")).await.unwrap(),
            ConfirmOutcome::AlreadyInProgress
        );
        assert!(h.mock.calls().is_empty());
        // Nothing is running here, so the session is not stuck in Confirming.
        assert_eq!(h.flow.intent("cs_5").unwrap().status, PaymentStatus::Initiated);

        let mut abandoned = LedgerEntry::pending("c1");
        abandoned.updated_at = abandoned.updated_at - chrono::TimeDelta::seconds(600);
        ledger.record("cs_5", abandoned).await.unwrap();
        h.mock.respond(Operation::ProcessCoursePayment, Value::Null);

        assert!(matches!(
            h.flow.confirm(ret("c1", "cs_5")).await.unwrap(),
            ConfirmOutcome::Enrolled { .. }
        ));
        assert_eq!(h.mock.call_count(Operation::ProcessCoursePayment), 1);
        assert_eq!(
            ledger.get("cs_5").await.unwrap().map(|e| e.state),
            Some(LedgerState::Confirmed)
        );
    }

    #[tokio::test]
    async fn test_failed_confirmation_clears_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(FilePaymentLedger::new(dir.path()));
        let h = harness_with_ledger(PaymentConfig::new("https://lyceum.example"), ledger.clone());
        h.mock
            .fail(Operation::ProcessCoursePayment, "Payment not completed");

        assert!(h.flow.confirm(ret("c1", "cs_6")).await.is_err());
        assert_eq!(ledger.get("cs_6").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_checkout_status() {
        let h = harness(PaymentConfig::new("https://lyceum.example"));
        h.mock.respond(
            Operation::GetStripeSessionStatus,
            json!({"failed": {"error": "card declined"}}),
        );

        let status = h.flow.checkout_status("cs_9").await.unwrap();
        assert!(!status.is_completed());
    }
}
