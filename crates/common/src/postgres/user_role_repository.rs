use crate::domain::{
    AssignUserRoleInput, DomainError, DomainResult, GetUserRoleInput, Role, UserRoleAssignment,
    UserRoleRepository,
};
use crate::postgres::SharedPostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Role row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct UserRoleRow {
    pub user_id: String,
    pub role: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRoleRow> for UserRoleAssignment {
    type Error = DomainError;

    fn try_from(row: UserRoleRow) -> Result<Self, Self::Error> {
        Ok(UserRoleAssignment {
            role: row.role.parse::<Role>()?,
            user_id: row.user_id,
            updated_at: Some(row.updated_at),
        })
    }
}

/// PostgreSQL implementation of UserRoleRepository trait
#[derive(Clone)]
pub struct PostgresUserRoleRepository {
    client: Arc<SharedPostgresClient>,
}

impl PostgresUserRoleRepository {
    pub fn new(client: Arc<SharedPostgresClient>) -> Self {
        Self { client }
    }

    async fn connection(&self) -> DomainResult<deadpool_postgres::Client> {
        let client = self.client.get().await.map_err(DomainError::RepositoryError)?;
        client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)
    }
}

#[async_trait]
impl UserRoleRepository for PostgresUserRoleRepository {
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn get_user_role(
        &self,
        input: GetUserRoleInput,
    ) -> DomainResult<Option<UserRoleAssignment>> {
        let conn = self.connection().await?;

        debug!(user_id = %input.user_id, "fetching user role from database");

        let row = conn
            .query_opt(
                "SELECT user_id, role, updated_at
                 FROM user_roles
                 WHERE user_id = $1",
                &[&input.user_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                let role_row = UserRoleRow {
                    user_id: row.get("user_id"),
                    role: row.get("role"),
                    updated_at: row.get("updated_at"),
                };
                Ok(Some(role_row.try_into()?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id, role = %input.role))]
    async fn assign_user_role(
        &self,
        input: AssignUserRoleInput,
    ) -> DomainResult<UserRoleAssignment> {
        let conn = self.connection().await?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO user_roles (user_id, role, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE
             SET role = EXCLUDED.role, updated_at = EXCLUDED.updated_at",
            &[&input.user_id, &input.role.as_str(), &now],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(user_id = %input.user_id, role = %input.role, "user role stored");

        Ok(UserRoleAssignment {
            user_id: input.user_id,
            role: input.role,
            updated_at: Some(now),
        })
    }
}
