#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, header},
};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use todoguard::{
    ServerConfig,
    auth::{ACCESS_COOKIE_NAME, CookieSettings},
    cli::IpExtractor,
    config::{AuthConfig, DEFAULT_CSRF_COOKIE_NAME, DEFAULT_CSRF_HEADER_NAME},
    create_app,
    csrf::{CsrfPair, CsrfVerifier},
    db::Database,
    jwt::TokenCodec,
};

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-0123456789abcdef";
pub const CSRF_SECRET: &[u8] = b"test-csrf-secret-0123456789abcde";

/// Everything a test needs to drive the app and forge its own credentials.
pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub codec: TokenCodec,
    pub csrf: CsrfVerifier,
}

pub fn auth_config() -> AuthConfig {
    let mut config = AuthConfig::new(JWT_SECRET, CSRF_SECRET);
    config.cookies = CookieSettings {
        secure: false,
        ..CookieSettings::default()
    };
    config
}

pub async fn test_server_config(
    login_rate_per_minute: u32,
    ip_extractor: Option<IpExtractor>,
) -> ServerConfig {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    ServerConfig {
        db,
        auth: auth_config(),
        login_rate_per_minute,
        password_cost: 4,
        ip_extractor,
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(100, None).await
}

pub async fn create_test_app_with(
    login_rate_per_minute: u32,
    ip_extractor: Option<IpExtractor>,
) -> TestApp {
    let config = test_server_config(login_rate_per_minute, ip_extractor).await;
    TestApp {
        app: create_app(&config),
        db: config.db.clone(),
        codec: TokenCodec::from_config(&config.auth),
        csrf: CsrfVerifier::new(&config.auth.csrf_secret),
    }
}

/// Attach the socket address axum would record for a real connection.
pub fn from_peer(mut request: Request<Body>, peer: [u8; 4]) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
    request
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

/// `access_key` cookie fragment as a browser would send it back.
pub fn access_cookie(token: &str) -> String {
    format!("{}=\"Bearer {}\"", ACCESS_COOKIE_NAME, token)
}

pub fn csrf_cookie(secret: &str) -> String {
    format!("{}={}", DEFAULT_CSRF_COOKIE_NAME, secret)
}

/// Cookie header carrying both the credential and the CSRF secret.
pub fn session_cookies(token: &str, pair: &CsrfPair) -> String {
    format!("{}; {}", access_cookie(token), csrf_cookie(&pair.secret))
}

/// Request with the full session: credential cookie, CSRF cookie and CSRF header.
pub fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    pair: &CsrfPair,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, session_cookies(token, pair))
        .header(DEFAULT_CSRF_HEADER_NAME, &pair.token);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// The credential carried by a `Set-Cookie: access_key=...` header, if any.
pub fn issued_token(response: &Response<Body>) -> Option<String> {
    set_cookies(response).into_iter().find_map(|cookie| {
        let value = cookie.strip_prefix(&format!("{}=\"Bearer ", ACCESS_COOKIE_NAME))?;
        value.split_once('"').map(|(token, _)| token.to_string())
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
