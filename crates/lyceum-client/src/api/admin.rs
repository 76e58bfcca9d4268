//! Admin key API.

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Admin API client.
pub struct AdminApi {
    client: LyceumClient,
}

impl AdminApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// Check a candidate admin key. Fails with a remote error when no key
    /// has been configured yet.
    pub async fn verify_key(&self, key: &str) -> Result<bool> {
        self.client
            .call(Operation::VerifyAdminKey, vec![LyceumClient::arg(key)?])
            .await
    }

    /// Set the admin key.
    pub async fn set_key(&self, key: &str) -> Result<()> {
        self.client
            .call(Operation::SetAdminKey, vec![LyceumClient::arg(key)?])
            .await
    }
}
