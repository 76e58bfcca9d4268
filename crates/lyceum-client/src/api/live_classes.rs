//! Live classes API.

use lyceum_types::LiveClass;

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Live classes API client.
pub struct LiveClassesApi {
    client: LyceumClient,
}

impl LiveClassesApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// List upcoming live classes.
    pub async fn upcoming(&self) -> Result<Vec<LiveClass>> {
        self.client.call(Operation::GetUpcomingLiveClasses, vec![]).await
    }

    /// Schedule a live class. Requires the admin key.
    pub async fn schedule(&self, live_class: &LiveClass, admin_key: &str) -> Result<()> {
        self.client
            .call(
                Operation::ScheduleLiveClass,
                vec![LyceumClient::arg(live_class)?, LyceumClient::arg(admin_key)?],
            )
            .await
    }
}
