use axum::http::{header, HeaderMap};

use crate::auth::{AuthError, Claims, TokenKeys};

/// A verified access token taken from the request.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub claims: Claims,
}

impl Session {
    /// Session from the bearer header or the named cookie, whichever
    /// [`access_token`] picks. Missing, malformed and expired tokens all
    /// count as no session.
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str, keys: &TokenKeys) -> Option<Self> {
        let token = access_token(headers, cookie_name).ok()?;
        match keys.verify(&token) {
            Ok(claims) => Some(Self { access_token: token, claims }),
            Err(e) => {
                tracing::debug!("Ignoring session token: {}", e);
                None
            }
        }
    }
}

/// Raw token from the Authorization header, then the session cookie.
/// A present header always wins, even when it is not a Bearer header.
pub fn access_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, AuthError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("non-ASCII authorization header".to_string()))?;
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        return Ok(token.to_string());
    }

    cookie_value(headers, cookie_name).ok_or(AuthError::MissingToken)
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for an HttpOnly, site-wide cookie.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        value,
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie(name, "", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn reads_named_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; sb-access-token=abc.def.ghi; other=1")]);
        assert_eq!(cookie_value(&map, "sb-access-token").as_deref(), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&map, "missing"), None);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "sb-access-token=from-cookie"),
        ]);
        assert_eq!(access_token(&map, "sb-access-token").unwrap(), "from-header");

        let cookie_only = headers(&[(header::COOKIE, "sb-access-token=from-cookie")]);
        assert_eq!(access_token(&cookie_only, "sb-access-token").unwrap(), "from-cookie");
    }

    #[test]
    fn no_credentials_is_missing_token() {
        assert!(matches!(
            access_token(&HeaderMap::new(), "sb-access-token"),
            Err(AuthError::MissingToken)
        ));
        let empty_bearer = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert!(matches!(access_token(&empty_bearer, "sb-access-token"), Err(AuthError::MissingToken)));
    }

    #[test]
    fn cookie_attributes() {
        assert_eq!(
            set_cookie("sb-access-token", "t", 3600, true),
            "sb-access-token=t; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure"
        );
        assert_eq!(
            clear_cookie("sb-access-token", false),
            "sb-access-token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }
}
