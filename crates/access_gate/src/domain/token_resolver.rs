use common::auth::CallerIdentity;
use common::http::find_cookie;
use http::header::{HeaderMap, AUTHORIZATION};

use crate::domain::AccessGateConfig;

/// Where a request's credentials were found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Identity-token and user-id cookies
    Cookies,
    /// `Authorization: Bearer` plus the user-id header
    Headers,
}

/// Extracts the caller identity from request-carried credentials.
///
/// Sources are tried in order and the first one that yields both a token and
/// a user id wins. Values are never combined across sources. No I/O.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    token_cookie_name: String,
    user_id_cookie_name: String,
    user_id_header: String,
}

impl TokenResolver {
    pub fn new(
        token_cookie_name: impl Into<String>,
        user_id_cookie_name: impl Into<String>,
        user_id_header: impl Into<String>,
    ) -> Self {
        Self {
            token_cookie_name: token_cookie_name.into(),
            user_id_cookie_name: user_id_cookie_name.into(),
            user_id_header: user_id_header.into(),
        }
    }

    pub fn from_config(config: &AccessGateConfig) -> Self {
        Self::new(
            config.token_cookie_name.clone(),
            config.user_id_cookie_name.clone(),
            config.user_id_header.clone(),
        )
    }

    pub fn resolve(&self, headers: &HeaderMap) -> Option<CallerIdentity> {
        self.resolve_with_source(headers).map(|(identity, _)| identity)
    }

    pub fn resolve_with_source(&self, headers: &HeaderMap) -> Option<(CallerIdentity, CredentialSource)> {
        [CredentialSource::Cookies, CredentialSource::Headers]
            .into_iter()
            .find_map(|source| {
                let identity = match source {
                    CredentialSource::Cookies => self.from_cookies(headers),
                    CredentialSource::Headers => self.from_headers(headers),
                };
                identity.map(|identity| (identity, source))
            })
    }

    fn from_cookies(&self, headers: &HeaderMap) -> Option<CallerIdentity> {
        let token = find_cookie(headers, &self.token_cookie_name)?;
        let user_id = find_cookie(headers, &self.user_id_cookie_name)?;
        Some(CallerIdentity::new(user_id, token))
    }

    fn from_headers(&self, headers: &HeaderMap) -> Option<CallerIdentity> {
        let auth_header = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))?
            .trim();

        let user_id = headers
            .get(self.user_id_header.as_str())?
            .to_str()
            .ok()?
            .trim();

        if token.is_empty() || user_id.is_empty() {
            return None;
        }
        Some(CallerIdentity::new(user_id, token))
    }
}

impl Default for TokenResolver {
    fn default() -> Self {
        Self::from_config(&AccessGateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::COOKIE;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_resolve_from_cookies() {
        let resolver = TokenResolver::default();
        let map = headers(&[(COOKIE.as_str(), "token=a.b.c; userId=u1")]);

        let (identity, source) = resolver.resolve_with_source(&map).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.raw_token, "a.b.c");
        assert_eq!(source, CredentialSource::Cookies);
    }

    #[test]
    fn test_resolve_from_headers() {
        let resolver = TokenResolver::default();
        let map = headers(&[("authorization", "Bearer x.y.z"), ("x-user-id", "u2")]);

        let (identity, source) = resolver.resolve_with_source(&map).unwrap();
        assert_eq!(identity.user_id, "u2");
        assert_eq!(identity.raw_token, "x.y.z");
        assert_eq!(source, CredentialSource::Headers);
    }

    #[test]
    fn test_cookies_win_over_headers() {
        let resolver = TokenResolver::default();
        let map = headers(&[
            (COOKIE.as_str(), "token=cookie.token.value; userId=cookie-user"),
            ("authorization", "Bearer header.token.value"),
            ("x-user-id", "header-user"),
        ]);

        let identity = resolver.resolve(&map).unwrap();
        assert_eq!(identity.user_id, "cookie-user");
        assert_eq!(identity.raw_token, "cookie.token.value");
    }

    #[test]
    fn test_sources_are_not_merged() {
        let resolver = TokenResolver::default();
        // Token only in a cookie, user id only in a header.
        let map = headers(&[(COOKIE.as_str(), "token=a.b.c"), ("x-user-id", "u1")]);
        assert!(resolver.resolve(&map).is_none());
    }

    #[test]
    fn test_incomplete_cookies_fall_through_to_headers() {
        let resolver = TokenResolver::default();
        let map = headers(&[
            (COOKIE.as_str(), "userId=cookie-user"),
            ("authorization", "Bearer h.t.v"),
            ("x-user-id", "header-user"),
        ]);

        let (identity, source) = resolver.resolve_with_source(&map).unwrap();
        assert_eq!(identity.user_id, "header-user");
        assert_eq!(source, CredentialSource::Headers);
    }

    #[test]
    fn test_no_credentials() {
        let resolver = TokenResolver::default();
        assert!(resolver.resolve(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_non_bearer_authorization_is_absent() {
        let resolver = TokenResolver::default();
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz"), ("x-user-id", "u1")]);
        assert!(resolver.resolve(&map).is_none());
    }

    #[test]
    fn test_non_utf8_header_is_absent() {
        let resolver = TokenResolver::default();
        let mut map = HeaderMap::new();
        map.insert(
            AUTHORIZATION,
            http::HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        map.insert("x-user-id", "u1".parse().unwrap());
        assert!(resolver.resolve(&map).is_none());
    }

    #[test]
    fn test_custom_cookie_names() {
        let resolver = TokenResolver::new("session", "uid", "x-uid");
        let map = headers(&[(COOKIE.as_str(), "session=s.t.u; uid=u9")]);
        assert_eq!(resolver.resolve(&map).unwrap().user_id, "u9");
    }
}
