//! Video progress API.

use lyceum_types::Video;

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Progress API client.
pub struct ProgressApi {
    client: LyceumClient,
}

impl ProgressApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// Fetch a video's content record.
    pub async fn video(&self, video_id: &str) -> Result<Video> {
        self.client
            .call(Operation::GetVideoContent, vec![LyceumClient::arg(video_id)?])
            .await
    }

    /// Mark a video as completed.
    pub async fn complete_video(&self, video_id: &str) -> Result<()> {
        self.client
            .call(Operation::CompleteVideo, vec![LyceumClient::arg(video_id)?])
            .await
    }

    /// Record watch progress (percent, 0-100).
    pub async fn update(&self, video_id: &str, progress: u64) -> Result<()> {
        self.client
            .call(
                Operation::UpdateVideoProgress,
                vec![LyceumClient::arg(video_id)?, LyceumClient::arg(&progress)?],
            )
            .await
    }
}
