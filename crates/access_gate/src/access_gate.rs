use std::sync::Arc;

use common::auth::{IdentityTokenConfig, IdentityTokenInspector, JwtIdentityTokenInspector};
use common::domain::UserRoleRepository;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{
    AccessDecisionEngine, AccessGateConfig, RoleLookupService, RoutePolicyTable, TokenResolver,
    UserRoleService,
};
use crate::http::{build_router, run_http_server, AccessGateLayer, HttpServerConfig, LoginRedirect};

/// Everything the gate and its HTTP surface need, wired once at startup
pub struct AccessGateServices {
    pub config: Arc<AccessGateConfig>,
    pub policy: Arc<RoutePolicyTable>,
    pub engine: Arc<AccessDecisionEngine>,
    pub user_role_service: Arc<UserRoleService>,
}

impl AccessGateServices {
    pub fn new(config: AccessGateConfig, repository: Arc<dyn UserRoleRepository>) -> Self {
        Self::with_policy(config, RoutePolicyTable::default_policies(), repository)
    }

    pub fn with_policy(
        config: AccessGateConfig,
        policy: RoutePolicyTable,
        repository: Arc<dyn UserRoleRepository>,
    ) -> Self {
        let policy = Arc::new(policy);
        let token_inspector: Arc<dyn IdentityTokenInspector> = Arc::new(
            JwtIdentityTokenInspector::new(IdentityTokenConfig::new(config.token_leeway_secs)),
        );
        let role_lookup = Arc::new(
            RoleLookupService::new(Arc::clone(&repository), config.role_lookup_timeout)
                .with_cache_ttl(config.role_cache_ttl),
        );
        let engine = Arc::new(
            AccessDecisionEngine::new(
                Arc::clone(&policy),
                token_inspector,
                Arc::clone(&role_lookup),
            )
            .with_mutating_requests_gated(config.gate_mutating_requests),
        );
        let user_role_service = Arc::new(UserRoleService::new(repository, Arc::clone(&role_lookup)));

        info!(
            protected_prefixes = policy.entries().len(),
            lookup_timeout_ms = config.role_lookup_timeout.as_millis() as u64,
            cache_ttl_secs = config.role_cache_ttl.as_secs(),
            gate_mutating_requests = config.gate_mutating_requests,
            "access gate configured"
        );

        Self {
            config: Arc::new(config),
            policy,
            engine,
            user_role_service,
        }
    }

    pub fn gate_layer(&self) -> AccessGateLayer {
        AccessGateLayer::new(
            Arc::clone(&self.engine),
            TokenResolver::from_config(&self.config),
            LoginRedirect::from_config(&self.config),
        )
    }
}

pub struct AccessGateApi {
    services: AccessGateServices,
    config: HttpServerConfig,
}

impl AccessGateApi {
    pub fn new(services: AccessGateServices, config: HttpServerConfig) -> Self {
        debug!("Initializing access gate API module");
        Self { services, config }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(
        CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
    > {
        move |ctx| {
            Box::pin(async move {
                let router = build_router(&self.services, self.config.logging.clone());
                run_http_server(self.config, router, ctx).await
            })
        }
    }
}
