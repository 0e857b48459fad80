use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_PASSWORD_PEPPER: &str = "change-me-password-pepper";
pub const DEFAULT_TOKEN_KEY: &str = "change-me-token-key";
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_SYNC_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_SYNC_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_SYNC_MAX_IN_FLIGHT: usize = 4;

/// Fully composed runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    /// `None` when no sync endpoint is configured.
    pub sync: Option<SyncConfig>,
    pub owner: Option<OwnerBootstrap>,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub password_pepper: Zeroizing<String>,
    pub token_key: Zeroizing<String>,
}

impl AuthConfig {
    pub fn is_default_pepper(&self) -> bool {
        self.password_pepper.as_str() == DEFAULT_PASSWORD_PEPPER
    }

    pub fn is_default_token_key(&self) -> bool {
        self.token_key.as_str() == DEFAULT_TOKEN_KEY
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password_pepper", &"<redacted>")
            .field("token_key", &"<redacted>")
            .finish()
    }
}

/// Password sync side channel settings.
#[derive(Clone)]
pub struct SyncConfig {
    pub endpoint: Url,
    /// Raw AES-256 key bytes.
    pub key: Zeroizing<Vec<u8>>,
    pub timeout: Duration,
    pub queue_capacity: usize,
    pub max_in_flight: usize,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("queue_capacity", &self.queue_capacity)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}

/// Owner account created at startup when the store has none.
#[derive(Clone)]
pub struct OwnerBootstrap {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for OwnerBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerBootstrap")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
