//! Stateless session authentication.
//!
//! A session is an HMAC-signed JWT in the `access_key` cookie plus a CSRF
//! double-submit pair (secret cookie, derived header token). The server keeps no
//! session record. Mutating requests must pass the CSRF check before the
//! credential is examined, and every successful check on a refreshing route
//! returns a newly minted credential (sliding expiration).

mod cookie;
mod errors;
mod extractors;
mod ip;
mod service;
mod state;

pub use cookie::{
    ACCESS_COOKIE_NAME, BEARER_PREFIX, CookieSettings, SameSite, SetCookie, access_token,
    get_cookie,
};
pub use errors::AuthError;
pub use extractors::{CsrfJwtRefresh, CsrfOnly, JwtOnly, JwtRefresh};
pub use ip::extract_client_ip;
pub use service::{AuthService, CredentialBackend, CsrfBackend, CsrfContext};
pub use state::HasAuthService;
