//! Credential and CSRF verification for route handlers.
//!
//! Four verification modes, from cheapest to strictest:
//! - `verify_jwt_only`: credential must verify, nothing is refreshed
//! - `verify_update_jwt`: credential must verify, a fresh one is minted
//! - `verify_csrf`: CSRF pair must validate
//! - `verify_csrf_update_jwt`: CSRF first, then credential, then refresh
//!
//! Everything here is synchronous and pure over (headers, keys, clock).

use axum::http::HeaderMap;
use tracing::{debug, warn};

use super::cookie::{CookieSettings, SetCookie, access_token, get_cookie};
use super::errors::AuthError;
use crate::config::AuthConfig;
use crate::csrf::{CsrfPair, CsrfVerifier};
use crate::jwt::{Claims, TokenCodec, TokenError};

/// Issues and verifies access credentials.
pub trait CredentialBackend: Send + Sync {
    fn issue(&self, subject: &str) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<Claims, TokenError>;
    fn verify_allow_expired(&self, token: &str) -> Result<Claims, TokenError>;
}

impl CredentialBackend for TokenCodec {
    fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.encode(subject)
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(token)
    }

    fn verify_allow_expired(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_allow_expired(token)
    }
}

/// Mints and checks CSRF secret/token pairs.
pub trait CsrfBackend: Send + Sync {
    fn mint(&self) -> CsrfPair;
    fn check(&self, secret: &str, token: &str) -> bool;
}

impl CsrfBackend for CsrfVerifier {
    fn mint(&self) -> CsrfPair {
        self.generate_pair()
    }

    fn check(&self, secret: &str, token: &str) -> bool {
        self.validate(secret, token)
    }
}

/// The CSRF values a request presented.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfContext<'a> {
    /// From the CSRF cookie
    pub secret: Option<&'a str>,
    /// From the CSRF header
    pub token: Option<&'a str>,
}

pub struct AuthService<C = TokenCodec, V = CsrfVerifier> {
    codec: C,
    csrf: V,
    csrf_header_name: String,
    csrf_cookie_name: String,
    cookies: CookieSettings,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_backends(
            TokenCodec::from_config(config),
            CsrfVerifier::new(&config.csrf_secret),
            config,
        )
    }
}

impl<C: CredentialBackend, V: CsrfBackend> AuthService<C, V> {
    pub fn with_backends(codec: C, csrf: V, config: &AuthConfig) -> Self {
        Self {
            codec,
            csrf,
            csrf_header_name: config.csrf_header_name.to_ascii_lowercase(),
            csrf_cookie_name: config.csrf_cookie_name.clone(),
            cookies: config.cookies.clone(),
        }
    }

    /// Pull the CSRF cookie and header out of a request.
    pub fn csrf_context<'a>(&self, headers: &'a HeaderMap) -> CsrfContext<'a> {
        CsrfContext {
            secret: get_cookie(headers, &self.csrf_cookie_name),
            token: headers
                .get(self.csrf_header_name.as_str())
                .and_then(|v| v.to_str().ok()),
        }
    }

    /// Mint a CSRF pair together with the cookie that carries its secret.
    pub fn new_csrf_pair(&self) -> (CsrfPair, SetCookie) {
        let pair = self.csrf.mint();
        let cookie = self.cookies.csrf_cookie(&self.csrf_cookie_name, &pair.secret);
        (pair, cookie)
    }

    /// Issue a credential for a freshly authenticated subject (login).
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.codec.issue(subject).map_err(AuthError::TokenIssue)
    }

    pub fn session_cookie(&self, token: &str) -> SetCookie {
        self.cookies.session_cookie(token)
    }

    pub fn clear_session_cookie(&self) -> SetCookie {
        self.cookies.clear_session_cookie()
    }

    /// Verify the access credential without refreshing it. Returns the subject.
    pub fn verify_jwt_only(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        self.authenticate(headers).map(|claims| claims.sub)
    }

    /// Verify the access credential and mint a fresh one for the same subject.
    /// Returns `(new_token, subject)`.
    pub fn verify_update_jwt(&self, headers: &HeaderMap) -> Result<(String, String), AuthError> {
        let claims = self.authenticate(headers)?;
        let token = self.issue(&claims.sub)?;
        Ok((token, claims.sub))
    }

    pub fn verify_csrf(&self, csrf: &CsrfContext<'_>) -> Result<(), AuthError> {
        let (Some(secret), Some(token)) = (csrf.secret, csrf.token) else {
            debug!("CSRF cookie or header missing");
            return Err(AuthError::CsrfMismatch);
        };
        if !self.csrf.check(secret, token) {
            warn!("CSRF token does not match secret");
            return Err(AuthError::CsrfMismatch);
        }
        Ok(())
    }

    /// Guard for mutating endpoints: CSRF pair first, then the credential, then
    /// a refreshed credential. Returns the new token.
    pub fn verify_csrf_update_jwt(
        &self,
        headers: &HeaderMap,
        csrf: &CsrfContext<'_>,
    ) -> Result<String, AuthError> {
        self.verify_csrf(csrf)?;
        let (token, _subject) = self.verify_update_jwt(headers)?;
        Ok(token)
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = access_token(headers).ok_or(AuthError::MissingCredential)?;
        self.codec.verify(token).map_err(|e| {
            self.log_rejection(token, &e);
            AuthError::InvalidCredential(e)
        })
    }

    fn log_rejection(&self, token: &str, err: &TokenError) {
        match err {
            TokenError::Expired => match self.codec.verify_allow_expired(token) {
                Ok(claims) => debug!(subject = %claims.sub, "Expired credential presented"),
                Err(e) => warn!(error = %e, "Expired credential failed re-verification"),
            },
            TokenError::InvalidSignature => warn!("Credential with invalid signature rejected"),
            other => debug!(error = %other, "Credential rejected"),
        }
    }
}
