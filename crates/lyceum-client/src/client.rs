//! Main client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lyceum_types::Principal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::api::{
    AdminApi, CoursesApi, InstructorsApi, LiveClassesApi, PaymentsApi, ProfileApi, ProgressApi,
    ReviewsApi,
};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::transport::{HttpTransport, Transport};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether, and as whom, the client may issue calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    /// No identity decision yet. Every call fails with
    /// [`Error::TransportUnavailable`].
    #[default]
    Unavailable,
    /// Calls go out without a principal.
    Anonymous,
    /// Calls go out on behalf of this principal.
    Authenticated(Principal),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        !matches!(self, Readiness::Unavailable)
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Readiness::Authenticated(p) => Some(p),
            _ => None,
        }
    }
}

/// Lyceum backend client.
///
/// Cheap to clone; clones share the transport, readiness and in-flight
/// counter.
///
/// # Example
///
/// ```no_run
/// use lyceum_client::{LyceumClient, Readiness};
///
/// # async fn example() -> lyceum_client::Result<()> {
/// let client = LyceumClient::builder()
///     .base_url("http://localhost:4943")
///     .build()?;
/// client.set_readiness(Readiness::Anonymous);
///
/// let free = client.courses().free().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LyceumClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    readiness: watch::Sender<Readiness>,
    in_flight: AtomicUsize,
    base_url: Option<Url>,
}

/// Decrements the in-flight counter when the call settles or is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LyceumClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                readiness: watch::Sender::new(Readiness::Unavailable),
                in_flight: AtomicUsize::new(0),
                base_url: None,
            }),
        }
    }

    /// Base URL of the HTTP gateway, if this client uses one.
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Readiness
    // ─────────────────────────────────────────────────────────────────────────

    /// Current readiness.
    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.borrow().clone()
    }

    /// Whether calls may be issued at all.
    pub fn is_ready(&self) -> bool {
        self.inner.readiness.borrow().is_ready()
    }

    /// Change readiness. Subscribers are notified only on an actual change.
    pub fn set_readiness(&self, readiness: Readiness) {
        self.inner.readiness.send_if_modified(|current| {
            if *current == readiness {
                false
            } else {
                debug!(from = ?current, to = ?readiness, "client readiness changed");
                *current = readiness;
                true
            }
        });
    }

    /// Subscribe to readiness changes.
    pub fn subscribe_readiness(&self) -> watch::Receiver<Readiness> {
        self.inner.readiness.subscribe()
    }

    /// Number of calls currently awaiting a reply.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the courses API.
    pub fn courses(&self) -> CoursesApi {
        CoursesApi::new(self.clone())
    }

    /// Access the reviews API.
    pub fn reviews(&self) -> ReviewsApi {
        ReviewsApi::new(self.clone())
    }

    /// Access the instructors API.
    pub fn instructors(&self) -> InstructorsApi {
        InstructorsApi::new(self.clone())
    }

    /// Access the live classes API.
    pub fn live_classes(&self) -> LiveClassesApi {
        LiveClassesApi::new(self.clone())
    }

    /// Access the caller profile API.
    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }

    /// Access the payments API.
    pub fn payments(&self) -> PaymentsApi {
        PaymentsApi::new(self.clone())
    }

    /// Access the admin API.
    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.clone())
    }

    /// Access the video progress API.
    pub fn progress(&self) -> ProgressApi {
        ProgressApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue an operation with raw JSON arguments and decode the result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        operation: Operation,
        args: Vec<Value>,
    ) -> Result<T> {
        let principal = match &*self.inner.readiness.borrow() {
            Readiness::Unavailable => {
                debug!(operation = %operation, "call refused, client not ready");
                return Err(Error::TransportUnavailable);
            }
            Readiness::Anonymous => None,
            Readiness::Authenticated(p) => Some(p.clone()),
        };

        let _guard = InFlightGuard::enter(&self.inner.in_flight);
        debug!(operation = %operation, authenticated = principal.is_some(), "remote call");

        let value = self
            .inner
            .transport
            .call(operation, args, principal.as_ref())
            .await
            .inspect_err(|e| warn!(operation = %operation, error = %e, "remote call failed"))?;

        Ok(serde_json::from_value(value)?)
    }

    /// Encode one argument.
    pub(crate) fn arg<A: Serialize + ?Sized>(value: &A) -> Result<Value> {
        Ok(serde_json::to_value(value)?)
    }
}

/// Builder for creating a [`LyceumClient`].
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    readiness: Readiness,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            transport: None,
            readiness: Readiness::Unavailable,
        }
    }

    /// Set the base URL of the HTTP gateway.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use a custom transport instead of HTTP.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Initial readiness (defaults to [`Readiness::Unavailable`]).
    pub fn readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LyceumClient> {
        let (transport, base_url): (Arc<dyn Transport>, Option<Url>) = match self.transport {
            Some(transport) => (transport, None),
            None => {
                let base_url = self
                    .base_url
                    .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

                // Parse and normalize base URL
                let mut base_url = Url::parse(&base_url)?;
                if !base_url.path().ends_with('/') {
                    base_url.set_path(&format!("{}/", base_url.path()));
                }

                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| format!("lyceum-client/{}", env!("CARGO_PKG_VERSION")));

                let http = HttpTransport::new(base_url.clone(), self.timeout, &user_agent)?;
                (Arc::new(http), Some(base_url))
            }
        };

        Ok(LyceumClient {
            inner: Arc::new(ClientInner {
                transport,
                readiness: watch::Sender::new(self.readiness),
                in_flight: AtomicUsize::new(0),
                base_url,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
