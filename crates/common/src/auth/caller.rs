use crate::domain::Role;

/// Credentials carried by a request: the user id and the raw signed token
/// issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
    pub raw_token: String,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>, raw_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            raw_token: raw_token.into(),
        }
    }
}

// Keep the raw token out of logs.
impl std::fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("user_id", &self.user_id)
            .field("raw_token", &"<redacted>")
            .finish()
    }
}

/// Caller whose role has been resolved by the access gate.
///
/// Inserted into request extensions when a protected request proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedCaller {
    pub user_id: String,
    pub role: Role,
}
