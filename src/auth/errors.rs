//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::TokenError;

/// Why a request failed authentication.
///
/// Credential problems all surface as 401 and CSRF problems as 403, each with a
/// single generic message. The detail stays in the variant for logging and tests.
#[derive(Debug)]
pub enum AuthError {
    /// No access cookie, or one without the `Bearer` tag
    MissingCredential,
    /// Malformed, forged or expired credential
    InvalidCredential(TokenError),
    /// CSRF secret/token pair absent or not matching
    CsrfMismatch,
    /// Minting the refreshed credential failed
    TokenIssue(TokenError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::CsrfMismatch => StatusCode::FORBIDDEN,
            AuthError::TokenIssue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }

    pub fn is_forbidden(&self) -> bool {
        self.status_code() == StatusCode::FORBIDDEN
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => "Not authenticated",
            AuthError::CsrfMismatch => "CSRF token validation failed",
            AuthError::TokenIssue(_) => "Failed to issue token",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "No credential presented"),
            AuthError::InvalidCredential(e) => write!(f, "Credential rejected: {}", e),
            AuthError::CsrfMismatch => write!(f, "CSRF pair did not validate"),
            AuthError::TokenIssue(e) => write!(f, "Could not issue credential: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            detail: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                detail: self.message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_collapse_to_unauthorized() {
        for err in [
            AuthError::MissingCredential,
            AuthError::InvalidCredential(TokenError::Malformed),
            AuthError::InvalidCredential(TokenError::InvalidSignature),
            AuthError::InvalidCredential(TokenError::Expired),
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.message(), "Not authenticated");
        }
    }

    #[test]
    fn test_csrf_failure_is_forbidden() {
        assert_eq!(AuthError::CsrfMismatch.status_code(), StatusCode::FORBIDDEN);
        assert!(AuthError::CsrfMismatch.is_forbidden());
        assert!(!AuthError::CsrfMismatch.is_unauthorized());
    }
}
