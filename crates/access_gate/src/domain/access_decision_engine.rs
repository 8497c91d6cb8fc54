use std::sync::Arc;

use common::auth::{AuthenticatedCaller, CallerIdentity, IdentityTokenInspector};
use http::Method;
use tracing::instrument;

use crate::domain::{
    AccessDecision, DenyReason, RoleLookupError, RoleLookupService, RoutePolicyTable,
    TokenResolver,
};

/// What the gate needs to know about a request.
///
/// Built synchronously from the incoming request so the decision future owns
/// its data and does not borrow the request body.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub method: Method,
    pub path: String,
    pub identity: Option<CallerIdentity>,
}

impl GateRequest {
    pub fn from_request<B>(request: &http::Request<B>, resolver: &TokenResolver) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            identity: resolver.resolve(request.headers()),
        }
    }
}

/// Decides whether a request may reach its handler.
///
/// Fail-closed: every failure on the way to a role (missing or malformed
/// credentials, store errors, timeouts) becomes a deny. Holds no mutable
/// state, so one engine serves all requests concurrently.
pub struct AccessDecisionEngine {
    policy: Arc<RoutePolicyTable>,
    token_inspector: Arc<dyn IdentityTokenInspector>,
    role_lookup: Arc<RoleLookupService>,
    gate_mutating_requests: bool,
}

impl AccessDecisionEngine {
    pub fn new(
        policy: Arc<RoutePolicyTable>,
        token_inspector: Arc<dyn IdentityTokenInspector>,
        role_lookup: Arc<RoleLookupService>,
    ) -> Self {
        Self {
            policy,
            token_inspector,
            role_lookup,
            gate_mutating_requests: false,
        }
    }

    /// Apply the gate to POST requests as well
    pub fn with_mutating_requests_gated(mut self, gated: bool) -> Self {
        self.gate_mutating_requests = gated;
        self
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn decide(&self, request: &GateRequest) -> AccessDecision {
        let decision = self.evaluate(request).await;
        decision.log(
            &request.path,
            request.identity.as_ref().map(|identity| identity.user_id.as_str()),
        );
        decision
    }

    async fn evaluate(&self, request: &GateRequest) -> AccessDecision {
        // POST handlers authorize on their own unless the gate is told otherwise.
        if request.method == Method::POST && !self.gate_mutating_requests {
            return AccessDecision::Proceed(None);
        }

        let Some(entry) = self.policy.match_path(&request.path) else {
            return AccessDecision::Proceed(None);
        };

        let Some(identity) = &request.identity else {
            return AccessDecision::Deny(DenyReason::MissingCredential);
        };

        let claims = match self.token_inspector.inspect(&identity.raw_token) {
            Ok(claims) => claims,
            Err(e) => return AccessDecision::Deny(DenyReason::MalformedCredential(e.to_string())),
        };
        if claims.user_id != identity.user_id {
            return AccessDecision::Deny(DenyReason::IdentityMismatch);
        }

        let role = match self.role_lookup.lookup_role(&identity.user_id).await {
            Ok(Some(role)) => role,
            Ok(None) => return AccessDecision::Deny(DenyReason::NoRoleAssigned),
            Err(RoleLookupError::UnrecognizedRole(stored)) => {
                return AccessDecision::Deny(DenyReason::UnrecognizedRole(stored))
            }
            Err(e) => return AccessDecision::Deny(DenyReason::LookupUnavailable(e.to_string())),
        };

        if entry.allows(role) {
            AccessDecision::Proceed(Some(AuthenticatedCaller {
                user_id: identity.user_id.clone(),
                role,
            }))
        } else {
            AccessDecision::Deny(DenyReason::RoleInsufficient {
                role,
                path_prefix: entry.path_prefix.clone(),
            })
        }
    }
}
