use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{Request, Response};
use tower::{Layer, Service};

use crate::domain::{AccessDecision, AccessDecisionEngine, GateRequest, TokenResolver};
use crate::http::LoginRedirect;

/// Tower layer that runs every request through the access decision engine
/// before it reaches a handler.
///
/// Denied requests are answered with a login redirect and never touch the
/// inner service. Proceeding requests carry the resolved
/// [`common::auth::AuthenticatedCaller`] in their extensions when a role was
/// looked up.
#[derive(Clone)]
pub struct AccessGateLayer {
    engine: Arc<AccessDecisionEngine>,
    resolver: TokenResolver,
    redirect: LoginRedirect,
}

impl AccessGateLayer {
    pub fn new(engine: Arc<AccessDecisionEngine>, resolver: TokenResolver, redirect: LoginRedirect) -> Self {
        Self {
            engine,
            resolver,
            redirect,
        }
    }
}

impl<S> Layer<S> for AccessGateLayer {
    type Service = AccessGateService<S>;

    fn layer(&self, service: S) -> Self::Service {
        AccessGateService {
            inner: service,
            engine: Arc::clone(&self.engine),
            resolver: self.resolver.clone(),
            redirect: self.redirect.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AccessGateService<S> {
    inner: S,
    engine: Arc<AccessDecisionEngine>,
    resolver: TokenResolver,
    redirect: LoginRedirect,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessGateService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let gate_request = GateRequest::from_request(&req, &self.resolver);
        let engine = Arc::clone(&self.engine);
        let redirect = self.redirect.clone();

        // The instance polled ready is the one that must handle the call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match engine.decide(&gate_request).await {
                AccessDecision::Proceed(caller) => {
                    if let Some(caller) = caller {
                        req.extensions_mut().insert(caller);
                    }
                    inner.call(req).await
                }
                AccessDecision::Deny(_) => Ok(redirect.respond(&gate_request.path)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoleLookupService, RoutePolicyTable};
    use common::auth::{AuthenticatedCaller, IdentityClaims, MockIdentityTokenInspector};
    use common::domain::{InMemoryUserRoleRepository, Role};
    use http::header::{COOKIE, LOCATION};
    use http::{Method, StatusCode};
    use std::convert::Infallible;
    use std::time::Duration;
    use tower::{service_fn, ServiceExt};

    fn layer() -> AccessGateLayer {
        let mut inspector = MockIdentityTokenInspector::new();
        inspector.expect_inspect().returning(|_| {
            Ok(IdentityClaims {
                user_id: "u1".to_string(),
                expires_at: None,
            })
        });
        let repository = InMemoryUserRoleRepository::with_roles([("u1", Role::Member)]);
        let lookup = RoleLookupService::new(Arc::new(repository), Duration::from_secs(1));
        let engine = AccessDecisionEngine::new(
            Arc::new(RoutePolicyTable::default_policies()),
            Arc::new(inspector),
            Arc::new(lookup),
        );
        AccessGateLayer::new(Arc::new(engine), TokenResolver::default(), LoginRedirect::default())
    }

    // Echoes the caller's user id and role, or "anonymous".
    async fn echo_caller(req: Request<String>) -> Result<Response<String>, Infallible> {
        let body = match req.extensions().get::<AuthenticatedCaller>() {
            Some(caller) => format!("{}:{}", caller.user_id, caller.role),
            None => "anonymous".to_string(),
        };
        Ok(Response::new(body))
    }

    fn request(method: Method, path: &str, cookie: Option<&str>) -> Request<String> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(String::new()).unwrap()
    }

    #[tokio::test]
    async fn test_denied_request_never_reaches_handler() {
        let service = layer().layer(service_fn(|_req: Request<String>| async {
            Err::<Response<String>, &'static str>("handler must not run")
        }));

        let response = service
            .oneshot(request(Method::GET, "/dashboard/profile", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/login?from=%2Fdashboard%2Fprofile"
        );
    }

    #[tokio::test]
    async fn test_proceed_inserts_caller() {
        let service = layer().layer(service_fn(echo_caller));

        let response = service
            .oneshot(request(Method::GET, "/dashboard", Some("token=a.b.c; userId=u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "u1:member");
    }

    #[tokio::test]
    async fn test_unprotected_path_has_no_caller() {
        let service = layer().layer(service_fn(echo_caller));

        let response = service
            .oneshot(request(Method::GET, "/about", None))
            .await
            .unwrap();

        assert_eq!(response.body(), "anonymous");
    }

    #[tokio::test]
    async fn test_post_passes_through() {
        let service = layer().layer(service_fn(echo_caller));

        let response = service
            .oneshot(request(Method::POST, "/admin/settings", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "anonymous");
    }
}
