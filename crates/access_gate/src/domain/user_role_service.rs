use common::domain::{
    AssignUserRoleInput, DomainError, DomainResult, GetUserRoleInput, Role, UserRoleAssignment,
    UserRoleRepository,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domain::RoleLookupService;

/// Domain service for reading and changing user roles
pub struct UserRoleService {
    repository: Arc<dyn UserRoleRepository>,
    role_lookup: Arc<RoleLookupService>,
}

impl UserRoleService {
    pub fn new(repository: Arc<dyn UserRoleRepository>, role_lookup: Arc<RoleLookupService>) -> Self {
        Self {
            repository,
            role_lookup,
        }
    }

    /// Get the role assigned to a user
    #[instrument(skip(self))]
    pub async fn get_role(&self, user_id: &str) -> DomainResult<UserRoleAssignment> {
        debug!(user_id = %user_id, "getting user role");
        Self::validate_user_id(user_id)?;

        self.repository
            .get_user_role(GetUserRoleInput {
                user_id: user_id.to_string(),
            })
            .await?
            .ok_or_else(|| DomainError::UserRoleNotFound(user_id.to_string()))
    }

    /// Assign a role to a user, replacing any previous one.
    ///
    /// Cached lookups for the user are dropped so the gate sees the change on
    /// the next request.
    #[instrument(skip(self))]
    pub async fn assign_role(&self, user_id: &str, role: Role) -> DomainResult<UserRoleAssignment> {
        Self::validate_user_id(user_id)?;

        let assignment = self
            .repository
            .assign_user_role(AssignUserRoleInput {
                user_id: user_id.to_string(),
                role,
            })
            .await?;

        self.role_lookup.invalidate(user_id).await;

        info!(user_id = %user_id, role = %role, "user role assigned");
        Ok(assignment)
    }

    fn validate_user_id(user_id: &str) -> DomainResult<()> {
        if user_id.trim().is_empty() {
            return Err(DomainError::InvalidUserId(
                "User ID cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
