use http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};

/// HttpOnly cookie carrying part of the caller's identity
pub struct IdentityCookie {
    pub name: String,
    pub value: String,
    pub max_age_seconds: i64,
    pub path: String,
    pub secure: bool,
}

impl IdentityCookie {
    /// Create a new identity cookie scoped to the whole site
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age_seconds: i64, secure: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age_seconds,
            path: "/".to_string(),
            secure,
        }
    }

    /// Create a cookie that clears the named credential (for logout)
    pub fn clear(name: impl Into<String>, secure: bool) -> Self {
        Self::new(name, String::new(), 0, secure)
    }

    /// Build the Set-Cookie header value
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, self.value),
            format!("Max-Age={}", self.max_age_seconds),
            format!("Path={}", self.path),
            "HttpOnly".to_string(),
            "SameSite=Lax".to_string(),
        ];

        if self.secure {
            parts.push("Secure".to_string());
        }

        parts.join("; ")
    }

    /// Append the Set-Cookie header to response headers
    pub fn append_to_headers(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.to_header_value()) {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// Find a cookie by name across every Cookie header on the request.
///
/// The first occurrence wins. Empty values and non-UTF-8 headers are treated
/// as absent.
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
