/// Configuration for structural inspection of identity tokens
#[derive(Debug, Clone)]
pub struct IdentityTokenConfig {
    /// Clock skew tolerated when checking an `exp` claim
    pub leeway_secs: u64,
}

impl IdentityTokenConfig {
    pub fn new(leeway_secs: u64) -> Self {
        Self { leeway_secs }
    }
}

impl Default for IdentityTokenConfig {
    fn default() -> Self {
        Self { leeway_secs: 60 }
    }
}
