use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::auth::{self, AuthService};
use crate::services::files::FileService;
use crate::services::limiter::InMemoryAttemptLimiter;
use crate::services::token::{HmacSigner, TokenService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<AuthService>,

    pub file_service: FileService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        // A hash always wins over a plaintext secret; the plaintext path is
        // a dev convenience that gets hashed once at startup.
        let password_hash = if config.security.admin_password_hash.is_empty() {
            auth::hash_password(&config.security.admin_password, Some(&config.security))?
        } else {
            config.security.admin_password_hash.clone()
        };

        let signing_key = if config.security.token_signing_key.is_empty() {
            tracing::warn!(
                "No token signing key configured; using an ephemeral key. \
                 Tokens will not survive a restart."
            );
            auth::generate_signing_key()
        } else {
            config.security.token_signing_key.clone()
        };

        let tokens = TokenService::new(
            Arc::new(HmacSigner::new(signing_key.as_bytes())),
            config.security.token_ttl_hours,
        );

        let limiter = Arc::new(InMemoryAttemptLimiter::new(
            config.security.auth_throttle.clone(),
        ));

        let auth_service = Arc::new(AuthService::new(password_hash, tokens, limiter));

        let file_service = FileService::new(
            config.storage.uploads_path.clone(),
            config.storage.max_upload_bytes,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare uploads directory: {e}"))?;

        let config = Arc::new(RwLock::new(config));

        Ok(Self {
            config,
            store,
            auth_service,
            file_service,
        })
    }
}
