//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket with per-IP tracking to slow down password guessing.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use serde_json::json;
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::extract_client_ip;
use crate::cli::IpExtractor;

/// Default login attempts per minute per client.
pub const DEFAULT_LOGIN_PER_MINUTE: u32 = 10;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login attempts
    pub login: Arc<IpLimiter>,
    /// Proxy header to key clients by; `None` keys by socket address
    pub ip_extractor: Option<IpExtractor>,
}

impl RateLimitConfig {
    /// Allow `login_per_minute` login attempts per client per minute (at least one).
    pub fn new(login_per_minute: u32, ip_extractor: Option<IpExtractor>) -> Self {
        let per_minute = NonZeroU32::new(login_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            ip_extractor,
        }
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, config.ip_extractor.as_ref()) {
        Ok(ip) => ip,
        Err(reason) => {
            warn!(reason, "Unable to determine client IP");
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "Unable to determine client IP." })),
            )
                .into_response();
        }
    };

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Login rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "detail": "Too many login attempts. Please wait before trying again." })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_per_client() {
        let config = RateLimitConfig::new(2, None);

        assert!(config.login.check_key(&"a".to_string()).is_ok());
        assert!(config.login.check_key(&"a".to_string()).is_ok());
        assert!(config.login.check_key(&"a".to_string()).is_err());
        assert!(config.login.check_key(&"b".to_string()).is_ok());
    }

    #[test]
    fn test_zero_quota_clamped_to_one() {
        let config = RateLimitConfig::new(0, None);

        assert!(config.login.check_key(&"a".to_string()).is_ok());
        assert!(config.login.check_key(&"a".to_string()).is_err());
    }
}
