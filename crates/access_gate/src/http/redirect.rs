use http::header::{HeaderValue, CACHE_CONTROL, LOCATION};
use http::{Response, StatusCode};
use url::form_urlencoded::byte_serialize;

use crate::domain::AccessGateConfig;

/// Builds the redirect sent to denied callers.
///
/// The originally requested path rides along as a query parameter so the
/// login flow can send the caller back. Pure: the same path always yields an
/// equivalent response.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    login_path: String,
    return_param: String,
}

impl LoginRedirect {
    pub fn new(login_path: impl Into<String>, return_param: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            return_param: return_param.into(),
        }
    }

    pub fn from_config(config: &AccessGateConfig) -> Self {
        Self::new(config.login_path.clone(), config.return_path_param.clone())
    }

    /// Location header value for a denied request to `path`
    pub fn location(&self, path: &str) -> String {
        let encoded: String = byte_serialize(path.as_bytes()).collect();
        format!("{}?{}={}", self.login_path, self.return_param, encoded)
    }

    pub fn respond<B: Default>(&self, path: &str) -> Response<B> {
        // An unusable return parameter still sends the caller to the login page.
        let location = HeaderValue::from_str(&self.location(path))
            .or_else(|_| HeaderValue::from_str(&self.login_path))
            .unwrap_or_else(|_| HeaderValue::from_static("/"));

        let mut response = Response::new(B::default());
        *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;
        response.headers_mut().insert(LOCATION, location);
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

impl Default for LoginRedirect {
    fn default() -> Self {
        Self::from_config(&AccessGateConfig::default())
    }
}

/// Accept a return path only if it stays on this site
pub fn sanitize_return_path(path: &str) -> Option<&str> {
    (path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')).then_some(path)
}
