//! Payments API.

use lyceum_types::{CheckoutSession, ShoppingItem, StripeConfiguration, StripeSessionStatus};

use crate::client::LyceumClient;
use crate::error::{Error, Result};
use crate::operation::Operation;

/// Payments API client.
pub struct PaymentsApi {
    client: LyceumClient,
}

impl PaymentsApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// Whether the payment provider has been configured.
    pub async fn is_configured(&self) -> Result<bool> {
        self.client.call(Operation::IsStripeConfigured, vec![]).await
    }

    /// Set the payment provider configuration.
    pub async fn configure(&self, config: &StripeConfiguration) -> Result<()> {
        self.client
            .call(
                Operation::SetStripeConfiguration,
                vec![LyceumClient::arg(config)?],
            )
            .await
    }

    /// Create a hosted checkout session.
    ///
    /// The backend answers with the provider's JSON document as a string;
    /// it is decoded here.
    pub async fn create_checkout_session(
        &self,
        items: &[ShoppingItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession> {
        let raw: String = self
            .client
            .call(
                Operation::CreateCheckoutSession,
                vec![
                    LyceumClient::arg(items)?,
                    LyceumClient::arg(success_url)?,
                    LyceumClient::arg(cancel_url)?,
                ],
            )
            .await?;

        serde_json::from_str(&raw).map_err(|e| {
            Error::Remote(format!("Malformed checkout session from backend: {}", e))
        })
    }

    /// Externally verified status of a checkout session.
    pub async fn session_status(&self, session_id: &str) -> Result<StripeSessionStatus> {
        self.client
            .call(
                Operation::GetStripeSessionStatus,
                vec![LyceumClient::arg(session_id)?],
            )
            .await
    }

    /// Confirm a completed payment and enroll the caller.
    pub async fn process_course_payment(
        &self,
        provider_id: &str,
        course_id: &str,
        session_id: &str,
    ) -> Result<()> {
        self.client
            .call(
                Operation::ProcessCoursePayment,
                vec![
                    LyceumClient::arg(provider_id)?,
                    LyceumClient::arg(course_id)?,
                    LyceumClient::arg(session_id)?,
                ],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::client::{LyceumClient, Readiness};
    use crate::operation::Operation;
    use crate::testing::MockTransport;

    fn client(mock: Arc<MockTransport>) -> LyceumClient {
        LyceumClient::builder()
            .transport(mock)
            .readiness(Readiness::Anonymous)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_session_is_decoded_from_string() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Operation::CreateCheckoutSession,
            serde_json::json!(r#"{"id":"cs_test_1","url":"https://pay.example/cs_test_1"}"#),
        );

        let session = client(mock.clone())
            .payments()
            .create_checkout_session(&[], "https://app/ok", "https://app/cancel")
            .await
            .unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.url, "https://pay.example/cs_test_1");
        let call = &mock.calls()[0];
        assert_eq!(call.args[1], "https://app/ok");
        assert_eq!(call.args[2], "https://app/cancel");
    }

    #[tokio::test]
    async fn test_malformed_checkout_session() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Operation::CreateCheckoutSession, serde_json::json!("not json"));

        let err = client(mock)
            .payments()
            .create_checkout_session(&[], "a", "b")
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }
}
