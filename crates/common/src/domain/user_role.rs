use crate::domain::result::DomainResult;
use crate::domain::Role;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Role currently assigned to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleAssignment {
    pub user_id: String,
    pub role: Role,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for looking up a user's role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserRoleInput {
    pub user_id: String,
}

/// Input for assigning (or replacing) a user's role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignUserRoleInput {
    pub user_id: String,
    pub role: Role,
}

/// Repository trait for role storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRoleRepository: Send + Sync {
    /// Get the role assigned to a user, `None` when no role is stored
    async fn get_user_role(&self, input: GetUserRoleInput)
        -> DomainResult<Option<UserRoleAssignment>>;

    /// Assign a role to a user, replacing any previous assignment
    async fn assign_user_role(&self, input: AssignUserRoleInput)
        -> DomainResult<UserRoleAssignment>;
}
