//! Instructors API.

use lyceum_types::Instructor;

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Instructors API client.
pub struct InstructorsApi {
    client: LyceumClient,
}

impl InstructorsApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// List all instructors.
    pub async fn all(&self) -> Result<Vec<Instructor>> {
        self.client.call(Operation::GetAllInstructors, vec![]).await
    }

    /// Get an instructor by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Instructor>> {
        self.client
            .call(Operation::GetInstructor, vec![LyceumClient::arg(id)?])
            .await
    }

    /// Add an instructor. Requires the admin key.
    pub async fn add(&self, instructor: &Instructor, admin_key: &str) -> Result<()> {
        self.client
            .call(
                Operation::AddInstructor,
                vec![LyceumClient::arg(instructor)?, LyceumClient::arg(admin_key)?],
            )
            .await
    }
}
