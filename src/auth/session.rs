//! Session resolution: bearer credential from cookie or header to a user

use axum::http::{header, HeaderMap};
use std::sync::Arc;

use crate::auth::jwt::TokenIssuer;
use crate::auth::models::User;
use crate::error::{Error, Result};
use crate::store::Database;

/// Cookie carrying the raw signed token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Read a cookie value from all `Cookie` headers
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };
        for pair in cookie_header.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == name {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// Strip quotes and an optional `Bearer ` prefix that clients or proxies
/// sometimes leave on the cookie value
pub fn normalize_cookie_token(raw: &str) -> Option<String> {
    let token = raw.trim().trim_matches('"').trim();
    let token = strip_bearer_scheme(token).unwrap_or(token).trim();
    if token.is_empty() || token.eq_ignore_ascii_case("bearer") {
        None
    } else {
        Some(token.to_string())
    }
}

/// Extract the credential from an `Authorization: Bearer <token>` value
pub fn bearer_from_authorization(value: &str) -> Option<String> {
    let token = strip_bearer_scheme(value.trim())?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn strip_bearer_scheme(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(rest)
    } else {
        None
    }
}

/// Build the `Set-Cookie` value for a freshly issued token
pub fn build_session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        ACCESS_TOKEN_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the `Set-Cookie` value that removes the session
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        ACCESS_TOKEN_COOKIE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Resolves a request's bearer credential to a stored user.
///
/// The cookie is tried first, then the `Authorization` header; the first
/// candidate that verifies and maps to an existing user wins.
#[derive(Clone)]
pub struct SessionResolver {
    tokens: Arc<TokenIssuer>,
    db: Database,
}

impl SessionResolver {
    pub fn new(tokens: Arc<TokenIssuer>, db: Database) -> Self {
        Self { tokens, db }
    }

    /// Candidate tokens in resolution order
    pub fn candidates(headers: &HeaderMap) -> Vec<(&'static str, String)> {
        let mut candidates = Vec::with_capacity(2);

        if let Some(token) =
            get_cookie_value(headers, ACCESS_TOKEN_COOKIE).and_then(|raw| normalize_cookie_token(&raw))
        {
            candidates.push(("cookie", token));
        }

        if let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_from_authorization)
        {
            candidates.push(("header", token));
        }

        candidates
    }

    /// Resolve the request to a user or fail with `Error::Unauthenticated`
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<User> {
        for (location, token) in Self::candidates(headers) {
            let Ok(claims) = self.tokens.verify(&token) else {
                tracing::debug!("Session {} token invalid", location);
                continue;
            };

            match self.db.find_user_by_username(&claims.sub).await? {
                Some(user) => return Ok(user),
                None => {
                    tracing::debug!(
                        "Session {} token names user '{}' who no longer exists",
                        location,
                        claims.sub
                    );
                }
            }
        }

        Err(Error::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_normalize_cookie_token() {
        assert_eq!(normalize_cookie_token("abc.def.ghi").as_deref(), Some("abc.def.ghi"));
        assert_eq!(normalize_cookie_token("\"abc.def.ghi\"").as_deref(), Some("abc.def.ghi"));
        assert_eq!(normalize_cookie_token("Bearer abc.def.ghi").as_deref(), Some("abc.def.ghi"));
        assert_eq!(
            normalize_cookie_token("\"Bearer abc.def.ghi\"").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(normalize_cookie_token("\"\""), None);
        assert_eq!(normalize_cookie_token("Bearer "), None);
    }

    #[test]
    fn test_bearer_from_authorization() {
        assert_eq!(bearer_from_authorization("Bearer tok").as_deref(), Some("tok"));
        assert_eq!(bearer_from_authorization("bearer tok").as_deref(), Some("tok"));
        assert_eq!(bearer_from_authorization("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_from_authorization("tok"), None);
        assert_eq!(bearer_from_authorization("Bearer   "), None);
    }

    #[test]
    fn test_get_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc; other=1"),
        );
        assert_eq!(get_cookie_value(&headers, "access_token").as_deref(), Some("abc"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_candidates_order_cookie_then_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=from-cookie"));

        let candidates = SessionResolver::candidates(&headers);
        assert_eq!(
            candidates,
            vec![
                ("cookie", "from-cookie".to_string()),
                ("header", "from-header".to_string())
            ]
        );
        assert!(SessionResolver::candidates(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = build_session_cookie("tok", 3600, false);
        assert_eq!(cookie, "access_token=tok; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax");
        assert!(build_session_cookie("tok", 3600, true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
