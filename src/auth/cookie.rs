//! Cookie parsing and `Set-Cookie` formatting for session credentials.

use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponseParts, ResponseParts};
use serde_json::json;
use tracing::error;

/// Cookie name for the access credential.
pub const ACCESS_COOKIE_NAME: &str = "access_key";

/// Scheme tag in front of the credential inside the cookie value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// `SameSite` cookie attribute.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    #[default]
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes applied to every cookie set by the server.
///
/// Defaults are `HttpOnly; Secure; SameSite=None`.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            domain: None,
            secure: true,
            same_site: SameSite::None,
        }
    }
}

impl CookieSettings {
    fn attributes(&self) -> String {
        let mut attrs = format!("; HttpOnly; SameSite={}; Path=/", self.same_site.as_str());
        if self.secure {
            attrs.push_str("; Secure");
        }
        if let Some(domain) = &self.domain {
            attrs.push_str("; Domain=");
            attrs.push_str(domain);
        }
        attrs
    }

    /// `Set-Cookie` value carrying a freshly minted credential.
    pub fn session_cookie(&self, token: &str) -> SetCookie {
        SetCookie(format!(
            "{}=\"{}{}\"{}",
            ACCESS_COOKIE_NAME,
            BEARER_PREFIX,
            token,
            self.attributes()
        ))
    }

    /// `Set-Cookie` value that removes the credential.
    pub fn clear_session_cookie(&self) -> SetCookie {
        SetCookie(format!(
            "{}=; Max-Age=0{}",
            ACCESS_COOKIE_NAME,
            self.attributes()
        ))
    }

    /// `Set-Cookie` value holding a CSRF secret.
    pub fn csrf_cookie(&self, name: &str, secret: &str) -> SetCookie {
        SetCookie(format!("{}={}{}", name, secret, self.attributes()))
    }
}

/// A `Set-Cookie` header that can be returned from a handler alongside the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie(pub String);

impl IntoResponseParts for SetCookie {
    type Error = (StatusCode, Json<serde_json::Value>);

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let value = HeaderValue::from_str(&self.0).map_err(|e| {
            error!(error = %e, "Set-Cookie value is not a valid header");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Failed to set cookie" })),
            )
        })?;
        res.headers_mut().append(header::SET_COOKIE, value);
        Ok(res)
    }
}

/// Extract a cookie value from the Cookie header. Surrounding quotes are removed.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                if key.trim() == name {
                    let value = value.trim();
                    return Some(
                        value
                            .strip_prefix('"')
                            .and_then(|v| v.strip_suffix('"'))
                            .unwrap_or(value),
                    );
                }
            }
        }
    }
    None
}

/// The raw credential from the access cookie, without its scheme tag.
pub fn access_token(headers: &HeaderMap) -> Option<&str> {
    get_cookie(headers, ACCESS_COOKIE_NAME)?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("csrf_secret=abc123"));

        assert_eq!(get_cookie(&headers, "csrf_secret"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; access_key=\"Bearer abc\"; csrf_secret=xyz789"),
        );

        assert_eq!(get_cookie(&headers, "access_key"), Some("Bearer abc"));
        assert_eq!(get_cookie(&headers, "csrf_secret"), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, "access_key"), None);
        assert_eq!(get_cookie(&HeaderMap::new(), "access_key"), None);
    }

    #[test]
    fn test_access_token_requires_bearer_tag() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_key=\"Bearer a.b.c\""),
        );
        assert_eq!(access_token(&headers), Some("a.b.c"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("access_key=a.b.c"));
        assert_eq!(access_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_key=\"Bearer \""),
        );
        assert_eq!(access_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_default_attributes() {
        let SetCookie(cookie) = CookieSettings::default().session_cookie("a.b.c");

        assert!(cookie.starts_with("access_key=\"Bearer a.b.c\""));
        assert!(cookie.contains("; HttpOnly"));
        assert!(cookie.contains("; SameSite=None"));
        assert!(cookie.contains("; Secure"));
        assert!(!cookie.contains("Domain="));
    }

    #[test]
    fn test_session_cookie_overrides() {
        let settings = CookieSettings {
            domain: Some("example.com".to_string()),
            secure: false,
            same_site: SameSite::Lax,
        };
        let SetCookie(cookie) = settings.session_cookie("a.b.c");

        assert!(cookie.contains("; SameSite=Lax"));
        assert!(cookie.contains("; Domain=example.com"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let SetCookie(cookie) = CookieSettings::default().clear_session_cookie();

        assert!(cookie.starts_with("access_key=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_cookie_round_trips_through_request_header() {
        let SetCookie(cookie) = CookieSettings::default().session_cookie("x.y.z");
        let pair = cookie.split(';').next().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());

        assert_eq!(access_token(&headers), Some("x.y.z"));
    }

    #[test]
    fn test_invalid_cookie_value_fails_response() {
        use axum::response::IntoResponse;

        let settings = CookieSettings {
            domain: Some("example.com\n".to_string()),
            ..CookieSettings::default()
        };

        let response = (settings.session_cookie("abc"), "ok").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_valid_cookie_value_is_appended() {
        use axum::response::IntoResponse;

        let settings = CookieSettings::default();
        let response = (
            settings.session_cookie("abc"),
            settings.csrf_cookie("csrf_secret", "xyz"),
            "ok",
        )
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get_all(header::SET_COOKIE).iter().count(),
            2
        );
    }
}
