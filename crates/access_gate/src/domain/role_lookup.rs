use std::sync::Arc;
use std::time::Duration;

use common::domain::{DomainError, GetUserRoleInput, Role, UserRoleRepository};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::RoleCache;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleLookupError {
    #[error("role lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("role lookup unavailable: {0}")]
    Unavailable(String),

    #[error("unrecognized role stored for user: {0}")]
    UnrecognizedRole(String),
}

/// In-process role lookup in front of the role store.
///
/// Bounds each lookup with a timeout and optionally serves recent results
/// from a [`RoleCache`]. `Ok(None)` means the store answered and the user has
/// no role.
pub struct RoleLookupService {
    repository: Arc<dyn UserRoleRepository>,
    timeout: Duration,
    cache: Option<RoleCache>,
}

impl RoleLookupService {
    pub fn new(repository: Arc<dyn UserRoleRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            timeout,
            cache: None,
        }
    }

    /// Enable caching of resolved roles; a zero TTL leaves caching off
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = (!ttl.is_zero()).then(|| RoleCache::new(ttl));
        self
    }

    #[instrument(skip(self))]
    pub async fn lookup_role(&self, user_id: &str) -> Result<Option<Role>, RoleLookupError> {
        let epoch = match &self.cache {
            Some(cache) => {
                if let Some(role) = cache.get(user_id).await {
                    debug!(user_id = %user_id, role = %role, "role served from cache");
                    return Ok(Some(role));
                }
                Some(cache.epoch())
            }
            None => None,
        };

        let role = self.fetch(user_id).await?;

        if let (Some(cache), Some(epoch), Some(role)) = (&self.cache, epoch, role) {
            cache.insert(user_id, role, epoch).await;
        }
        Ok(role)
    }

    /// Drop any cached role for the user; call after every role change
    pub async fn invalidate(&self, user_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(user_id).await;
        }
    }

    // Runs on its own task so a panicking store surfaces as an error.
    async fn fetch(&self, user_id: &str) -> Result<Option<Role>, RoleLookupError> {
        let repository = Arc::clone(&self.repository);
        let input = GetUserRoleInput {
            user_id: user_id.to_string(),
        };
        let mut handle = tokio::spawn(async move { repository.get_user_role(input).await });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(assignment))) => Ok(assignment.map(|a| a.role)),
            Ok(Ok(Err(DomainError::UnrecognizedRole(role)))) => {
                Err(RoleLookupError::UnrecognizedRole(role))
            }
            Ok(Ok(Err(e))) => Err(RoleLookupError::Unavailable(e.to_string())),
            Ok(Err(join_error)) => Err(RoleLookupError::Unavailable(format!(
                "lookup task failed: {}",
                join_error
            ))),
            Err(_) => {
                handle.abort();
                Err(RoleLookupError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{MockUserRoleRepository, UserRoleAssignment};

    fn assignment(user_id: &str, role: Role) -> UserRoleAssignment {
        UserRoleAssignment {
            user_id: user_id.to_string(),
            role,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_returns_role() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role()
            .withf(|input: &GetUserRoleInput| input.user_id == "u1")
            .times(1)
            .returning(|_| Ok(Some(assignment("u1", Role::Admin))));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1));
        assert_eq!(service.lookup_role("u1").await, Ok(Some(Role::Admin)));
    }

    #[tokio::test]
    async fn test_lookup_without_role() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role().returning(|_| Ok(None));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1));
        assert_eq!(service.lookup_role("u1").await, Ok(None));
    }

    #[tokio::test]
    async fn test_repository_error_is_unavailable() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role()
            .returning(|_| Err(DomainError::RepositoryError(anyhow::anyhow!("connection refused"))));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1));
        assert!(matches!(
            service.lookup_role("u1").await,
            Err(RoleLookupError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_role_is_reported() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role()
            .returning(|_| Err(DomainError::UnrecognizedRole("moderator".to_string())));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1));
        assert_eq!(
            service.lookup_role("u1").await,
            Err(RoleLookupError::UnrecognizedRole("moderator".to_string()))
        );
    }

    #[tokio::test]
    async fn test_panicking_repository_is_unavailable() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role()
            .returning(|_| panic!("driver bug"));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1));
        assert!(matches!(
            service.lookup_role("u1").await,
            Err(RoleLookupError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_lookups() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role()
            .times(1)
            .returning(|_| Ok(Some(assignment("u1", Role::Member))));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1))
            .with_cache_ttl(Duration::from_secs(60));

        assert_eq!(service.lookup_role("u1").await, Ok(Some(Role::Member)));
        assert_eq!(service.lookup_role("u1").await, Ok(Some(Role::Member)));
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_lookup() {
        let mut repo = MockUserRoleRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_get_user_role()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(assignment("u1", Role::Member))));
        repo.expect_get_user_role()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(assignment("u1", Role::Imam))));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1))
            .with_cache_ttl(Duration::from_secs(60));

        assert_eq!(service.lookup_role("u1").await, Ok(Some(Role::Member)));
        service.invalidate("u1").await;
        assert_eq!(service.lookup_role("u1").await, Ok(Some(Role::Imam)));
    }

    #[tokio::test]
    async fn test_missing_role_is_not_cached() {
        let mut repo = MockUserRoleRepository::new();
        repo.expect_get_user_role().times(2).returning(|_| Ok(None));

        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1))
            .with_cache_ttl(Duration::from_secs(60));

        assert_eq!(service.lookup_role("u1").await, Ok(None));
        assert_eq!(service.lookup_role("u1").await, Ok(None));
    }

    struct SlowRepository;

    #[async_trait::async_trait]
    impl UserRoleRepository for SlowRepository {
        async fn get_user_role(
            &self,
            input: GetUserRoleInput,
        ) -> common::domain::DomainResult<Option<UserRoleAssignment>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some(assignment(&input.user_id, Role::Admin)))
        }

        async fn assign_user_role(
            &self,
            input: common::domain::AssignUserRoleInput,
        ) -> common::domain::DomainResult<UserRoleAssignment> {
            Ok(assignment(&input.user_id, input.role))
        }
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let service = RoleLookupService::new(Arc::new(SlowRepository), Duration::from_millis(20));
        assert_eq!(
            service.lookup_role("u1").await,
            Err(RoleLookupError::Timeout(Duration::from_millis(20)))
        );
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let repo = MockUserRoleRepository::new();
        let service = RoleLookupService::new(Arc::new(repo), Duration::from_secs(1))
            .with_cache_ttl(Duration::ZERO);
        assert!(service.cache.is_none());
    }
}
