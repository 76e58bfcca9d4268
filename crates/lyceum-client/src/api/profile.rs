//! Caller profile and role API.

use lyceum_types::{Principal, UserProfile, UserRole};

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Profile API client.
pub struct ProfileApi {
    client: LyceumClient,
}

impl ProfileApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// The caller's profile, if one was saved.
    pub async fn caller(&self) -> Result<Option<UserProfile>> {
        self.client.call(Operation::GetCallerUserProfile, vec![]).await
    }

    /// Save the caller's profile.
    pub async fn save(&self, profile: &UserProfile) -> Result<()> {
        self.client
            .call(
                Operation::SaveCallerUserProfile,
                vec![LyceumClient::arg(profile)?],
            )
            .await
    }

    /// Another user's profile.
    pub async fn of(&self, user: &Principal) -> Result<Option<UserProfile>> {
        self.client
            .call(Operation::GetUserProfile, vec![LyceumClient::arg(user)?])
            .await
    }

    /// The caller's role.
    pub async fn role(&self) -> Result<UserRole> {
        self.client.call(Operation::GetCallerUserRole, vec![]).await
    }

    /// Whether the caller holds the admin role.
    pub async fn is_admin(&self) -> Result<bool> {
        self.client.call(Operation::IsCallerAdmin, vec![]).await
    }

    /// Assign a role to a user. Admin only.
    pub async fn assign_role(&self, user: &Principal, role: UserRole) -> Result<()> {
        self.client
            .call(
                Operation::AssignCallerUserRole,
                vec![LyceumClient::arg(user)?, LyceumClient::arg(&role)?],
            )
            .await
    }
}
