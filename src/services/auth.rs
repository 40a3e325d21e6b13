//! Admin login and token verification.
//!
//! The site has a single privileged principal; the credential is one
//! configured secret checked against an Argon2id hash. The limiter is
//! consulted before the hash comparison so a locked address never spends
//! CPU on Argon2 work.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::services::limiter::{AttemptLimiter, AttemptPermission};
use crate::services::token::{Principal, TokenService};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credential")]
    InvalidCredential,

    #[error("too many failed attempts, retry in {retry_after:?}")]
    LockedOut { retry_after: Duration },

    #[error("token expired")]
    Expired,

    #[error("token signature invalid")]
    InvalidSignature,

    #[error("token malformed")]
    Malformed,

    #[error("{0}")]
    Internal(String),
}

pub struct AuthService {
    admin_password_hash: Arc<String>,
    tokens: TokenService,
    limiter: Arc<dyn AttemptLimiter>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        admin_password_hash: String,
        tokens: TokenService,
        limiter: Arc<dyn AttemptLimiter>,
    ) -> Self {
        Self {
            admin_password_hash: Arc::new(admin_password_hash),
            tokens,
            limiter,
        }
    }

    /// Validate the supplied secret for a client address and issue a token.
    ///
    /// Order matters: limiter first (locked addresses fail without touching
    /// the hash), then the Argon2 comparison, then limiter bookkeeping.
    pub async fn login(&self, supplied_secret: &str, addr: IpAddr) -> Result<String, AuthError> {
        if let AttemptPermission::LockedOut { retry_after } = self.limiter.check_allowed(addr).await
        {
            warn!(%addr, ?retry_after, "Login rejected: address locked out");
            return Err(AuthError::LockedOut { retry_after });
        }

        let is_valid = self.verify_secret(supplied_secret).await?;

        if !is_valid {
            self.limiter.record_failure(addr).await;
            return Err(AuthError::InvalidCredential);
        }

        self.limiter.record_success(addr).await;
        info!(%addr, "Admin login successful");

        self.tokens.issue()
    }

    /// Stateless bearer-token verification.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens.verify(token)
    }

    /// Argon2 verification runs on a blocking thread; it is CPU-bound and
    /// must not stall the runtime.
    async fn verify_secret(&self, supplied: &str) -> Result<bool, AuthError> {
        let hash = Arc::clone(&self.admin_password_hash);
        let supplied = supplied.to_string();

        task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| AuthError::Internal(format!("invalid stored password hash: {e}")))?;

            let argon2 = Argon2::default();
            Ok::<bool, AuthError>(
                argon2
                    .verify_password(supplied.as_bytes(), &parsed)
                    .is_ok(),
            )
        })
        .await
        .map_err(|e| AuthError::Internal(format!("credential check task panicked: {e}")))?
    }
}

/// Hash a secret with Argon2id using the configured cost parameters.
/// Used by the `hash-password` command and by startup bootstrap when only
/// a plaintext secret is configured.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random signing key (64 character hex string) for setups that
/// have not configured one. Tokens signed with it die with the process.
#[must_use]
pub fn generate_signing_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthThrottleConfig;
    use crate::services::limiter::InMemoryAttemptLimiter;
    use crate::services::token::HmacSigner;

    fn service(password: &str) -> AuthService {
        let hash = hash_password(password, None).unwrap();
        let tokens = TokenService::new(
            Arc::new(HmacSigner::new(b"unit-test-signing-key-32-bytes!!!!!!")),
            24,
        );
        let limiter = Arc::new(InMemoryAttemptLimiter::new(AuthThrottleConfig::default()));
        AuthService::new(hash, tokens, limiter)
    }

    fn addr(last: u8) -> IpAddr {
        IpAddr::from([192, 168, 1, last])
    }

    #[tokio::test]
    async fn correct_secret_yields_verifiable_token() {
        let auth = service("correct horse battery staple");

        let token = auth
            .login("correct horse battery staple", addr(1))
            .await
            .unwrap();

        let principal = auth.verify(&token).unwrap();
        assert_eq!(principal.subject, "admin");
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let auth = service("right-password");

        let err = auth.login("wrong-password", addr(2)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn sixth_attempt_locked_even_with_correct_secret() {
        let auth = service("right-password");

        for _ in 0..5 {
            let err = auth.login("wrong-password", addr(3)).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredential));
        }

        let err = auth.login("right-password", addr(3)).await.unwrap_err();
        assert!(matches!(err, AuthError::LockedOut { .. }));
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let auth = service("right-password");

        for _ in 0..4 {
            let _ = auth.login("wrong-password", addr(4)).await;
        }
        auth.login("right-password", addr(4)).await.unwrap();

        // Counter cleared: four more failures do not lock.
        for _ in 0..4 {
            let _ = auth.login("wrong-password", addr(4)).await;
        }
        auth.login("right-password", addr(4)).await.unwrap();
    }

    #[test]
    fn generated_signing_key_is_hex() {
        let key = generate_signing_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
