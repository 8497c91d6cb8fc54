use std::time::Duration;

/// Settings for the access gate
#[derive(Debug, Clone)]
pub struct AccessGateConfig {
    /// Path denied callers are redirected to
    pub login_path: String,
    /// Query parameter carrying the originally requested path
    pub return_path_param: String,
    pub token_cookie_name: String,
    pub user_id_cookie_name: String,
    /// Header carrying the user id when credentials are sent as headers
    pub user_id_header: String,
    /// Upper bound on a single role lookup
    pub role_lookup_timeout: Duration,
    /// Lifetime of cached role lookups, zero disables caching
    pub role_cache_ttl: Duration,
    /// Apply the gate to POST requests instead of letting them through
    pub gate_mutating_requests: bool,
    /// Clock skew tolerated on the token `exp` claim
    pub token_leeway_secs: u64,
    /// Mark cookies written by the app as Secure
    pub secure_cookies: bool,
}

impl Default for AccessGateConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            return_path_param: "from".to_string(),
            token_cookie_name: "token".to_string(),
            user_id_cookie_name: "userId".to_string(),
            user_id_header: "x-user-id".to_string(),
            role_lookup_timeout: Duration::from_secs(2),
            role_cache_ttl: Duration::ZERO,
            gate_mutating_requests: false,
            token_leeway_secs: 60,
            secure_cookies: false,
        }
    }
}
