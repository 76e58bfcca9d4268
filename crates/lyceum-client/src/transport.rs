//! Transports carrying operations to the backend actor.

use std::time::Duration;

use async_trait::async_trait;
use lyceum_types::Principal;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::operation::Operation;

/// Carries one operation to the backend and returns its raw result.
///
/// Implementations map their own failure modes onto
/// [`Error::TransportUnavailable`], [`Error::Unauthorized`] and
/// [`Error::Remote`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `operation` with positional `args` on behalf of `principal`
    /// (`None` for anonymous calls).
    async fn call(
        &self,
        operation: Operation,
        args: Vec<Value>,
        principal: Option<&Principal>,
    ) -> Result<Value>;
}

/// Reply envelope: `{"ok": value}` or `{"err": "message"}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(Value),
    Err(String),
}

/// HTTP gateway transport.
///
/// Each operation is a `POST {base}/api/v1/rpc/{operation}` with a JSON body
/// `{"args": [...]}`. Authenticated calls carry the principal as a bearer
/// token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for a normalized base URL.
    pub fn new(base_url: Url, timeout: Duration, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for an operation.
    pub(crate) fn url(&self, operation: Operation) -> Result<Url> {
        self.base_url
            .join(&format!("api/v1/rpc/{}", operation.as_str()))
            .map_err(Error::from)
    }

    /// Turn a response into the operation result.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if status.is_success() {
            return match response.json::<Reply>().await? {
                Reply::Ok(value) => Ok(value),
                Reply::Err(message) => Err(Error::Remote(message)),
            };
        }

        let message = match response.json::<Reply>().await {
            Ok(Reply::Err(message)) => message,
            _ => format!("HTTP {}", status.as_u16()),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(message),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                Error::TransportUnavailable
            }
            _ => Error::Remote(message),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        operation: Operation,
        args: Vec<Value>,
        principal: Option<&Principal>,
    ) -> Result<Value> {
        let url = self.url(operation)?;
        trace!(%url, "POST");

        let mut request = self
            .http
            .post(url)
            .json(&serde_json::json!({ "args": args }))
            .timeout(self.timeout);

        if let Some(principal) = principal {
            let value = HeaderValue::from_str(&format!("Bearer {}", principal))
                .map_err(|_| Error::Config("Invalid principal".to_string()))?;
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                debug!(operation = %operation, error = %e, "backend unreachable");
                Error::TransportUnavailable
            } else {
                Error::Http(e)
            }
        })?;

        self.handle_response(response).await
    }
}
