//! Signed session tokens for the admin principal.
//!
//! Tokens are a self-contained signed envelope (claims + expiry +
//! signature); verification never touches the database. The signing
//! strategy sits behind [`TokenSigner`] so the key, or the scheme itself,
//! can be swapped without touching call sites.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthError;

/// Claims carried by every issued token. Enough to authorise the single
/// admin principal without any per-request lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject; always "admin" — the site has exactly one privileged identity.
    pub sub: String,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,

    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// The admin identity established by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> Result<String, AuthError>;

    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 signer over a shared secret key.
pub struct HmacSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl HmacSigner {
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
        }
    }
}

impl TokenSigner for HmacSigner {
    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| {
            tracing::error!("Failed to sign token: {e}");
            AuthError::Internal("token signing failed".to_string())
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {e}");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::Malformed,
                }
            })
    }
}

#[derive(Clone)]
pub struct TokenService {
    signer: Arc<dyn TokenSigner>,
    ttl_hours: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(signer: Arc<dyn TokenSigner>, ttl_hours: i64) -> Self {
        Self { signer, ttl_hours }
    }

    /// Issue a fresh admin token valid for the configured TTL.
    pub fn issue(&self) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: "admin".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
        };

        self.signer.sign(&claims)
    }

    /// Stateless verification: signature + expiry only.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.signer.verify(token)?;
        Ok(Principal {
            subject: claims.sub,
        })
    }

    #[must_use]
    pub const fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl_hours: i64) -> TokenService {
        let signer = Arc::new(HmacSigner::new(b"test-signing-key-at-least-32-bytes!!"));
        TokenService::new(signer, ttl_hours)
    }

    #[test]
    fn issued_token_verifies() {
        let service = service(24);
        let token = service.issue().unwrap();

        let principal = service.verify(&token).unwrap();
        assert_eq!(principal.subject, "admin");
    }

    #[test]
    fn expired_token_rejected() {
        let signer = Arc::new(HmacSigner::new(b"test-signing-key-at-least-32-bytes!!"));
        let now = Utc::now();
        let claims = Claims {
            sub: "admin".to_string(),
            iat: (now - Duration::hours(25)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = signer.sign(&claims).unwrap();

        let service = TokenService::new(signer, 24);
        assert!(matches!(service.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn wrong_key_rejected() {
        let token = service(24).issue().unwrap();

        let other = TokenService::new(
            Arc::new(HmacSigner::new(b"a-completely-different-signing-key!!")),
            24,
        );
        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let service = service(24);
        assert!(matches!(
            service.verify("not-a-token"),
            Err(AuthError::Malformed)
        ));
    }
}
