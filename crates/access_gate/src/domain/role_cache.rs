use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use common::domain::Role;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
struct CachedRole {
    role: Role,
    expires_at: Instant,
}

/// Short-lived cache of resolved roles keyed by user id.
///
/// Only positive lookups are stored. Every invalidation bumps an epoch; a
/// lookup that started before an invalidation cannot write its (possibly
/// stale) result back.
pub struct RoleCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedRole>>,
    epoch: AtomicU64,
}

impl RoleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Current invalidation epoch, captured before fetching from storage
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub async fn get(&self, user_id: &str) -> Option<Role> {
        let entries = self.entries.read().await;
        entries
            .get(user_id)
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| cached.role)
    }

    /// Store a role fetched while `epoch` was current
    pub async fn insert(&self, user_id: &str, role: Role, epoch: u64) {
        let mut entries = self.entries.write().await;
        if self.epoch() != epoch {
            return;
        }
        let now = Instant::now();
        entries.retain(|_, cached| cached.expires_at > now);
        entries.insert(
            user_id.to_string(),
            CachedRole {
                role,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn invalidate(&self, user_id: &str) {
        let mut entries = self.entries.write().await;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        entries.remove(user_id);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_get() {
        let cache = RoleCache::new(Duration::from_secs(30));
        cache.insert("u1", Role::Imam, cache.epoch()).await;
        assert_eq!(cache.get("u1").await, Some(Role::Imam));
        assert_eq!(cache.get("u2").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_ignored() {
        let cache = RoleCache::new(Duration::from_millis(10));
        cache.insert("u1", Role::Admin, cache.epoch()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("u1").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = RoleCache::new(Duration::from_secs(30));
        cache.insert("u1", Role::Admin, cache.epoch()).await;
        cache.invalidate("u1").await;
        assert_eq!(cache.get("u1").await, None);
    }

    #[tokio::test]
    async fn test_insert_after_invalidation_is_dropped() {
        let cache = RoleCache::new(Duration::from_secs(30));
        let epoch = cache.epoch();

        // Role changed while the lookup was in flight.
        cache.invalidate("u1").await;
        cache.insert("u1", Role::Admin, epoch).await;

        assert_eq!(cache.get("u1").await, None);
        assert_eq!(cache.len().await, 0);
    }
}
