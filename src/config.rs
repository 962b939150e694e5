//! Authentication configuration, built once at startup and handed to the
//! services that need it.

use jsonwebtoken::Algorithm;
use std::time::Duration;

use crate::auth::CookieSettings;
use crate::jwt::DEFAULT_TOKEN_TTL_SECS;

/// Default header carrying the CSRF token on mutating requests.
pub const DEFAULT_CSRF_HEADER_NAME: &str = "x-csrf-token";

/// Default cookie holding the CSRF secret.
pub const DEFAULT_CSRF_COOKIE_NAME: &str = "csrf_secret";

/// Symmetric algorithms accepted for signing access credentials.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SigningAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(value: SigningAlgorithm) -> Self {
        match value {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs384 => Algorithm::HS384,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

/// Keys and policy for credential and CSRF handling.
#[derive(Clone)]
pub struct AuthConfig {
    /// Key for signing access credentials
    pub jwt_secret: Vec<u8>,
    pub jwt_algorithm: SigningAlgorithm,
    /// Access credential lifetime
    pub jwt_ttl: Duration,
    /// Key for deriving CSRF tokens from CSRF secrets
    pub csrf_secret: Vec<u8>,
    pub csrf_header_name: String,
    pub csrf_cookie_name: String,
    /// Attributes applied to every cookie the server sets
    pub cookies: CookieSettings,
}

impl AuthConfig {
    /// Configuration with default policy for the given keys.
    pub fn new(jwt_secret: impl Into<Vec<u8>>, csrf_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_algorithm: SigningAlgorithm::default(),
            jwt_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            csrf_secret: csrf_secret.into(),
            csrf_header_name: DEFAULT_CSRF_HEADER_NAME.to_string(),
            csrf_cookie_name: DEFAULT_CSRF_COOKIE_NAME.to_string(),
            cookies: CookieSettings::default(),
        }
    }
}
