use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/algoshelf.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7080,
            cors_allowed_origins: vec![
                "http://localhost:7080".to_string(),
                "http://127.0.0.1:7080".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where uploaded files are published.
    pub uploads_path: String,

    /// Upload size ceiling in bytes (default: 2 GiB).
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_path: "./uploads".to_string(),
            max_upload_bytes: constants::uploads::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2id hash of the admin secret. Preferred over `admin_password`.
    /// Generate with `algoshelf hash-password <secret>`, or set the
    /// ALGOSHELF_ADMIN_PASSWORD_HASH environment variable instead.
    pub admin_password_hash: String,

    /// Plaintext admin secret; hashed at startup when no hash is set.
    /// Intended for local development only.
    pub admin_password: String,

    /// HS256 key for signing session tokens. Rotating it invalidates all
    /// outstanding tokens. Overridable via ALGOSHELF_TOKEN_SIGNING_KEY.
    pub token_signing_key: String,

    /// Token validity in hours (default: 24).
    pub token_ttl_hours: i64,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Login throttling and lockout policy.
    pub auth_throttle: AuthThrottleConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            admin_password_hash: String::new(),
            admin_password: String::new(),
            token_signing_key: String::new(),
            token_ttl_hours: constants::auth::TOKEN_TTL_HOURS,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auth_throttle: AuthThrottleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthThrottleConfig {
    /// Max failed attempts in the window before lockout.
    pub max_attempts: u32,

    /// Window for counting failures, anchored at the first failure.
    pub window_seconds: u64,

    /// Temporary lockout duration once max attempts is reached.
    pub lockout_seconds: u64,

    /// Trusted proxy IP addresses allowed to provide forwarded client IP headers.
    ///
    /// When empty, forwarded headers are ignored for rate-limiting identity and
    /// the socket peer address is used.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for AuthThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::auth::DEFAULT_MAX_ATTEMPTS,
            window_seconds: constants::auth::DEFAULT_LOCKOUT_SECONDS,
            lockout_seconds: constants::auth::DEFAULT_LOCKOUT_SECONDS,
            trusted_proxy_ips: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Secrets may live in a .env file next to the binary.
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over file values so deployments never
    /// need secrets inside config.toml.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(hash) = std::env::var("ALGOSHELF_ADMIN_PASSWORD_HASH") {
            self.security.admin_password_hash = hash;
        }
        if let Ok(password) = std::env::var("ALGOSHELF_ADMIN_PASSWORD") {
            self.security.admin_password = password;
        }
        if let Ok(key) = std::env::var("ALGOSHELF_TOKEN_SIGNING_KEY") {
            self.security.token_signing_key = key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("algoshelf").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".algoshelf").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.admin_password_hash.is_empty() && self.security.admin_password.is_empty() {
            anyhow::bail!(
                "No admin credential configured. Set security.admin_password_hash \
                 (see `algoshelf hash-password`) or ALGOSHELF_ADMIN_PASSWORD_HASH"
            );
        }

        if self.security.auth_throttle.max_attempts == 0 {
            anyhow::bail!("auth_throttle.max_attempts must be > 0");
        }

        if self.security.token_ttl_hours <= 0 {
            anyhow::bail!("token_ttl_hours must be > 0");
        }

        if self.storage.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be > 0");
        }

        Ok(())
    }
}
