//! JWT access credential encoding and validation.
//!
//! Credentials are stateless: a subject plus issue/expiry timestamps, signed with
//! an HMAC key held by the server. Expiry is checked here rather than by
//! `jsonwebtoken` so that `exp` is exclusive and leeway is always zero.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::{AuthConfig, SigningAlgorithm};

/// Default credential lifetime: 60 minutes
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

/// JWT claims carried by an access credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signs and verifies access credentials.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl_secs: u64,
}

impl TokenCodec {
    /// Create a codec with the given secret, algorithm and lifetime.
    pub fn new(secret: &[u8], algorithm: SigningAlgorithm, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: algorithm.into(),
            ttl_secs: ttl.as_secs(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_algorithm, config.jwt_ttl)
    }

    /// Credential lifetime in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a credential for `subject`, valid from now for the configured TTL.
    pub fn encode(&self, subject: &str) -> Result<String, TokenError> {
        self.encode_at(subject, now_secs()?)
    }

    /// Issue a credential as if the current time were `now`.
    pub fn encode_at(&self, subject: &str, now: u64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, now_secs()?)
    }

    /// Verify signature and expiry against the given current time.
    pub fn decode_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let claims = self.decode_allow_expired(token)?;
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Verify the signature only. An expired but authentic credential decodes fine,
    /// a forged one does not.
    pub fn decode_allow_expired(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from_decode)
    }
}

fn now_secs() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

/// Errors that can occur during credential operations.
#[derive(Debug)]
pub enum TokenError {
    /// Token structure, header or claims could not be parsed
    Malformed,
    /// Signature does not verify against the server key
    InvalidSignature,
    /// `now >= exp`
    Expired,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl TokenError {
    fn from_decode(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            // A token signed with another algorithm is not ours either.
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
