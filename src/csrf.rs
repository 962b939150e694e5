//! CSRF double-submit tokens.
//!
//! The secret travels in a cookie, the token in a request header. The token is
//! `HMAC-SHA256(server_key, secret)`, so a page that cannot read the cookie
//! cannot produce a matching header, and the server needs no session record.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes per CSRF secret.
pub const CSRF_SECRET_BYTES: usize = 32;

/// A freshly minted secret and the token derived from it.
#[derive(Debug, Clone)]
pub struct CsrfPair {
    /// Goes into the CSRF cookie
    pub secret: String,
    /// Returned to the client for the request header
    pub token: String,
}

#[derive(Clone)]
pub struct CsrfVerifier {
    mac: HmacSha256,
}

impl CsrfVerifier {
    pub fn new(key: &[u8]) -> Self {
        Self {
            mac: HmacSha256::new_from_slice(key).expect("HMAC can take key of any size"),
        }
    }

    pub fn generate_pair(&self) -> CsrfPair {
        let mut bytes = [0u8; CSRF_SECRET_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        let token = self.derive(&secret);
        CsrfPair { secret, token }
    }

    /// Check that `token` was derived from `secret` under this key.
    /// Empty inputs and undecodable tokens fail closed.
    pub fn validate(&self, secret: &str, token: &str) -> bool {
        if secret.is_empty() || token.is_empty() {
            return false;
        }
        let Ok(expected) = URL_SAFE_NO_PAD.decode(token) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(secret.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    fn derive(&self, secret: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(secret.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_pair_validates() {
        let csrf = CsrfVerifier::new(b"csrf-key");

        for _ in 0..16 {
            let pair = csrf.generate_pair();
            assert!(csrf.validate(&pair.secret, &pair.token));
        }
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let csrf = CsrfVerifier::new(b"csrf-key");

        let a = csrf.generate_pair();
        let b = csrf.generate_pair();

        assert_ne!(a.secret, b.secret);
        assert!(!csrf.validate(&a.secret, &b.token));
        assert!(!csrf.validate(&b.secret, &a.token));
    }

    #[test]
    fn test_other_key_rejected() {
        let csrf1 = CsrfVerifier::new(b"csrf-key-1");
        let csrf2 = CsrfVerifier::new(b"csrf-key-2");

        let pair = csrf1.generate_pair();

        assert!(!csrf2.validate(&pair.secret, &pair.token));
    }

    #[test]
    fn test_missing_values_fail_closed() {
        let csrf = CsrfVerifier::new(b"csrf-key");
        let pair = csrf.generate_pair();

        assert!(!csrf.validate("", &pair.token));
        assert!(!csrf.validate(&pair.secret, ""));
        assert!(!csrf.validate("", ""));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let csrf = CsrfVerifier::new(b"csrf-key");
        let pair = csrf.generate_pair();

        assert!(!csrf.validate(&pair.secret, "not base64 !!"));
        assert!(!csrf.validate(&pair.secret, "dW5yZWxhdGVk"));
        // Secret echoed back as the token
        assert!(!csrf.validate(&pair.secret, &pair.secret));
    }

    #[test]
    fn test_truncated_token_rejected() {
        let csrf = CsrfVerifier::new(b"csrf-key");
        let pair = csrf.generate_pair();

        let truncated = &pair.token[..pair.token.len() - 4];
        assert!(!csrf.validate(&pair.secret, truncated));
    }
}
