use common::auth::AuthenticatedCaller;
use common::domain::Role;
use tracing::{debug, error, info, warn};

/// Why a request was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No token or no user id on the request
    MissingCredential,
    /// Token failed structural decoding
    MalformedCredential(String),
    /// User id beside the token differs from the token's own claim
    IdentityMismatch,
    /// Role store failed, timed out or was unreachable
    LookupUnavailable(String),
    /// Role store answered but the user has no role
    NoRoleAssigned,
    /// Role store holds a value outside the known role set
    UnrecognizedRole(String),
    /// Role resolved but not permitted under the matching prefix
    RoleInsufficient { role: Role, path_prefix: String },
}

impl DenyReason {
    /// Stable identifier used as the `deny_reason` log field
    pub fn kind(&self) -> &'static str {
        match self {
            DenyReason::MissingCredential => "missing_credential",
            DenyReason::MalformedCredential(_) => "malformed_credential",
            DenyReason::IdentityMismatch => "identity_mismatch",
            DenyReason::LookupUnavailable(_) => "lookup_unavailable",
            DenyReason::NoRoleAssigned => "no_role_assigned",
            DenyReason::UnrecognizedRole(_) => "unrecognized_role",
            DenyReason::RoleInsufficient { .. } => "role_insufficient",
        }
    }
}

/// Outcome of the access gate for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Continue to the handler. Carries the caller when a role was resolved;
    /// `None` for exempt methods and unprotected paths.
    Proceed(Option<AuthenticatedCaller>),
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, AccessDecision::Proceed(_))
    }

    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            AccessDecision::Deny(reason) => Some(reason),
            AccessDecision::Proceed(_) => None,
        }
    }

    /// Emit the decision at the level its cause warrants.
    ///
    /// Credential anomalies and data problems are warnings, store outages are
    /// errors, routine denials stay at debug/info.
    pub fn log(&self, path: &str, user_id: Option<&str>) {
        let user_id = user_id.unwrap_or("-");
        match self {
            AccessDecision::Proceed(caller) => {
                debug!(
                    path = %path,
                    user_id = %user_id,
                    role = caller.as_ref().map(|c| c.role.as_str()).unwrap_or("-"),
                    "access granted"
                );
            }
            AccessDecision::Deny(reason) => {
                let kind = reason.kind();
                match reason {
                    DenyReason::MissingCredential => {
                        debug!(path = %path, deny_reason = kind, "access denied: no credentials");
                    }
                    DenyReason::MalformedCredential(detail) => {
                        warn!(
                            path = %path,
                            user_id = %user_id,
                            deny_reason = kind,
                            detail = %detail,
                            "access denied: malformed identity token"
                        );
                    }
                    DenyReason::IdentityMismatch => {
                        warn!(
                            path = %path,
                            user_id = %user_id,
                            deny_reason = kind,
                            "access denied: user id does not match token claim"
                        );
                    }
                    DenyReason::LookupUnavailable(detail) => {
                        error!(
                            path = %path,
                            user_id = %user_id,
                            deny_reason = kind,
                            error = %detail,
                            "access denied: role lookup unavailable"
                        );
                    }
                    DenyReason::NoRoleAssigned => {
                        warn!(
                            path = %path,
                            user_id = %user_id,
                            deny_reason = kind,
                            "access denied: no role assigned to user"
                        );
                    }
                    DenyReason::UnrecognizedRole(role) => {
                        warn!(
                            path = %path,
                            user_id = %user_id,
                            deny_reason = kind,
                            stored_role = %role,
                            "access denied: unrecognized stored role"
                        );
                    }
                    DenyReason::RoleInsufficient { role, path_prefix } => {
                        info!(
                            path = %path,
                            user_id = %user_id,
                            deny_reason = kind,
                            role = %role,
                            path_prefix = %path_prefix,
                            "access denied: role not permitted"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_reason_kinds_are_distinct() {
        let reasons = [
            DenyReason::MissingCredential,
            DenyReason::MalformedCredential("bad".to_string()),
            DenyReason::IdentityMismatch,
            DenyReason::LookupUnavailable("down".to_string()),
            DenyReason::NoRoleAssigned,
            DenyReason::UnrecognizedRole("moderator".to_string()),
            DenyReason::RoleInsufficient {
                role: Role::Member,
                path_prefix: "/admin".to_string(),
            },
        ];
        let kinds: std::collections::HashSet<_> = reasons.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds.len(), reasons.len());
    }

    #[test]
    fn test_deny_reason_accessor() {
        let decision = AccessDecision::Deny(DenyReason::NoRoleAssigned);
        assert!(!decision.is_proceed());
        assert_eq!(decision.deny_reason(), Some(&DenyReason::NoRoleAssigned));
        assert_eq!(AccessDecision::Proceed(None).deny_reason(), None);
    }
}
