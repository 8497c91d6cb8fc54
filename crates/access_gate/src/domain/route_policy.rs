//! Declarative mapping from URL path prefixes to the roles allowed behind them.

use std::collections::HashSet;

use common::domain::Role;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoutePolicyError {
    #[error("Path prefix must start with '/': {0}")]
    InvalidPrefix(String),

    #[error("Duplicate path prefix: {0}")]
    DuplicatePrefix(String),

    #[error("Path prefix {0} allows no roles")]
    NoAllowedRoles(String),
}

/// One protected section of the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicyEntry {
    pub path_prefix: String,
    pub allowed_roles: HashSet<Role>,
}

impl RoutePolicyEntry {
    pub fn new(path_prefix: impl Into<String>, allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// Starts-with match against the request path
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.path_prefix)
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Static route policy table.
///
/// When several prefixes match a path, the longest one decides. Prefixes are
/// unique, so the choice is deterministic regardless of table order.
#[derive(Debug, Clone)]
pub struct RoutePolicyTable {
    entries: Vec<RoutePolicyEntry>,
}

impl RoutePolicyTable {
    pub fn new(entries: Vec<RoutePolicyEntry>) -> Result<Self, RoutePolicyError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !entry.path_prefix.starts_with('/') {
                return Err(RoutePolicyError::InvalidPrefix(entry.path_prefix.clone()));
            }
            if entry.allowed_roles.is_empty() {
                return Err(RoutePolicyError::NoAllowedRoles(entry.path_prefix.clone()));
            }
            if !seen.insert(entry.path_prefix.as_str()) {
                return Err(RoutePolicyError::DuplicatePrefix(entry.path_prefix.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The deployed protected sections
    pub fn default_policies() -> Self {
        Self {
            entries: vec![
                RoutePolicyEntry::new("/admin", [Role::Admin]),
                RoutePolicyEntry::new("/imam", [Role::Imam]),
                RoutePolicyEntry::new("/dashboard", [Role::Member]),
                RoutePolicyEntry::new("/livestream", [Role::Admin, Role::Imam, Role::Member]),
            ],
        }
    }

    /// Find the policy governing `path`, `None` for unprotected paths
    pub fn match_path(&self, path: &str) -> Option<&RoutePolicyEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(path))
            .max_by_key(|entry| entry.path_prefix.len())
    }

    pub fn entries(&self) -> &[RoutePolicyEntry] {
        &self.entries
    }
}

impl Default for RoutePolicyTable {
    fn default() -> Self {
        Self::default_policies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policies_are_valid() {
        let defaults = RoutePolicyTable::default_policies();
        assert!(RoutePolicyTable::new(defaults.entries().to_vec()).is_ok());
    }

    #[test]
    fn test_default_policy_roles() {
        let table = RoutePolicyTable::default_policies();

        let admin = table.match_path("/admin/settings").unwrap();
        assert!(admin.allows(Role::Admin));
        assert!(!admin.allows(Role::Member));
        assert!(!admin.allows(Role::Imam));

        let imam = table.match_path("/imam").unwrap();
        assert!(imam.allows(Role::Imam));
        assert!(!imam.allows(Role::Admin));

        let dashboard = table.match_path("/dashboard/profile").unwrap();
        assert!(dashboard.allows(Role::Member));
        assert!(!dashboard.allows(Role::Admin));

        let livestream = table.match_path("/livestream/abc123").unwrap();
        for role in Role::ALL {
            assert!(livestream.allows(role));
        }
    }

    #[test]
    fn test_unprotected_paths_do_not_match() {
        let table = RoutePolicyTable::default_policies();
        assert!(table.match_path("/").is_none());
        assert!(table.match_path("/about").is_none());
        assert!(table.match_path("/masjids/123").is_none());
        assert!(table.match_path("/login").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = RoutePolicyTable::new(vec![
            RoutePolicyEntry::new("/admin", [Role::Admin]),
            RoutePolicyEntry::new("/admin/public-reports", [Role::Admin, Role::Member]),
        ])
        .unwrap();

        let entry = table.match_path("/admin/public-reports/2024").unwrap();
        assert_eq!(entry.path_prefix, "/admin/public-reports");

        let entry = table.match_path("/admin/users").unwrap();
        assert_eq!(entry.path_prefix, "/admin");
    }

    #[test]
    fn test_longest_prefix_independent_of_order() {
        let table = RoutePolicyTable::new(vec![
            RoutePolicyEntry::new("/imam/events", [Role::Member]),
            RoutePolicyEntry::new("/imam", [Role::Imam]),
        ])
        .unwrap();

        assert_eq!(table.match_path("/imam/events/1").unwrap().path_prefix, "/imam/events");
    }

    #[test]
    fn test_rejects_duplicate_prefix() {
        let result = RoutePolicyTable::new(vec![
            RoutePolicyEntry::new("/admin", [Role::Admin]),
            RoutePolicyEntry::new("/admin", [Role::Member]),
        ]);
        assert_eq!(
            result.unwrap_err(),
            RoutePolicyError::DuplicatePrefix("/admin".to_string())
        );
    }

    #[test]
    fn test_rejects_relative_prefix() {
        let result = RoutePolicyTable::new(vec![RoutePolicyEntry::new("admin", [Role::Admin])]);
        assert!(matches!(result, Err(RoutePolicyError::InvalidPrefix(_))));
    }

    #[test]
    fn test_rejects_entry_without_roles() {
        let result = RoutePolicyTable::new(vec![RoutePolicyEntry::new("/admin", Vec::<Role>::new())]);
        assert!(matches!(result, Err(RoutePolicyError::NoAllowedRoles(_))));
    }
}
