use crate::domain::{
    AssignUserRoleInput, DomainResult, GetUserRoleInput, Role, UserRoleAssignment,
    UserRoleRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of UserRoleRepository using HashMap
#[derive(Clone)]
pub struct InMemoryUserRoleRepository {
    roles: Arc<RwLock<HashMap<String, UserRoleAssignment>>>,
}

impl InMemoryUserRoleRepository {
    pub fn new() -> Self {
        Self {
            roles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a repository pre-populated with `(user_id, role)` pairs
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = (S, Role)>,
        S: Into<String>,
    {
        let now = Utc::now();
        let roles = roles
            .into_iter()
            .map(|(user_id, role)| {
                let user_id = user_id.into();
                let assignment = UserRoleAssignment {
                    user_id: user_id.clone(),
                    role,
                    updated_at: Some(now),
                };
                (user_id, assignment)
            })
            .collect();

        Self {
            roles: Arc::new(RwLock::new(roles)),
        }
    }
}

impl Default for InMemoryUserRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRoleRepository for InMemoryUserRoleRepository {
    async fn get_user_role(
        &self,
        input: GetUserRoleInput,
    ) -> DomainResult<Option<UserRoleAssignment>> {
        let roles = self.roles.read().await;
        Ok(roles.get(&input.user_id).cloned())
    }

    async fn assign_user_role(
        &self,
        input: AssignUserRoleInput,
    ) -> DomainResult<UserRoleAssignment> {
        let assignment = UserRoleAssignment {
            user_id: input.user_id.clone(),
            role: input.role,
            updated_at: Some(Utc::now()),
        };
        let mut roles = self.roles.write().await;
        roles.insert(input.user_id, assignment.clone());
        Ok(assignment)
    }
}
