//! Axum extractors for the four verification modes.
//!
//! Each extractor runs its check before the handler body, so a rejected request
//! never reaches the store. Refreshing extractors hand back the `Set-Cookie` for
//! the new credential; handlers put it in their response tuple.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::cookie::SetCookie;
use super::errors::AuthError;
use super::state::HasAuthService;

/// Credential must verify. No refresh, no CSRF. Yields the subject.
pub struct JwtOnly(pub String);

impl<S> FromRequestParts<S> for JwtOnly
where
    S: HasAuthService + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state.auth().verify_jwt_only(&parts.headers).map(JwtOnly)
    }
}

/// Credential must verify; a refreshed one is minted for the response.
pub struct JwtRefresh {
    pub subject: String,
    pub cookie: SetCookie,
}

impl<S> FromRequestParts<S> for JwtRefresh
where
    S: HasAuthService + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = state.auth();
        let (token, subject) = auth.verify_update_jwt(&parts.headers)?;
        Ok(JwtRefresh {
            subject,
            cookie: auth.session_cookie(&token),
        })
    }
}

/// CSRF pair must validate. Used by the session endpoints that run before a
/// credential exists (register, login) or that discard it (logout).
pub struct CsrfOnly;

impl<S> FromRequestParts<S> for CsrfOnly
where
    S: HasAuthService + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = state.auth();
        auth.verify_csrf(&auth.csrf_context(&parts.headers))?;
        Ok(CsrfOnly)
    }
}

/// Guard for mutating endpoints: CSRF, then credential, then refresh.
/// Yields the `Set-Cookie` for the refreshed credential.
pub struct CsrfJwtRefresh(pub SetCookie);

impl<S> FromRequestParts<S> for CsrfJwtRefresh
where
    S: HasAuthService + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = state.auth();
        let csrf = auth.csrf_context(&parts.headers);
        let token = auth.verify_csrf_update_jwt(&parts.headers, &csrf)?;
        Ok(CsrfJwtRefresh(auth.session_cookie(&token)))
    }
}
