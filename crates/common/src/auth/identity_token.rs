use std::collections::HashSet;

use crate::auth::IdentityTokenConfig;
use crate::domain::{DomainError, DomainResult};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Claims read from an identity token envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub user_id: String,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawIdentityClaims {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
}

/// Trait for the cheap structural check applied to identity tokens.
///
/// Implementations must not verify signatures or perform I/O; the identity
/// provider owns signature verification.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityTokenInspector: Send + Sync {
    /// Decode the token envelope and extract the user-id claim
    fn inspect(&self, token: &str) -> DomainResult<IdentityClaims>;
}

/// JWT-based implementation of IdentityTokenInspector
pub struct JwtIdentityTokenInspector {
    config: IdentityTokenConfig,
}

impl JwtIdentityTokenInspector {
    pub fn new(config: IdentityTokenConfig) -> Self {
        Self { config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.validate_exp = true;
        validation.leeway = self.config.leeway_secs;
        validation
    }
}

impl IdentityTokenInspector for JwtIdentityTokenInspector {
    fn inspect(&self, token: &str) -> DomainResult<IdentityClaims> {
        let data = decode::<RawIdentityClaims>(token, &DecodingKey::from_secret(&[]), &self.validation())
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;

        let claims = data.claims;
        let user_id = claims
            .user_id
            .filter(|id| !id.is_empty())
            .or(claims.sub.filter(|id| !id.is_empty()))
            .ok_or_else(|| DomainError::InvalidToken("missing user id claim".to_string()))?;

        Ok(IdentityClaims {
            user_id,
            expires_at: claims.exp,
        })
    }
}
