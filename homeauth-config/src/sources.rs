use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::{non_empty, parse_bool};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    pub sync: Option<FileSyncConfig>,
    pub owner: Option<FileOwnerConfig>,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_pepper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_key: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Base64 encoded 32 byte key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// Humantime string, e.g. `"10s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileOwnerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub auth_password_pepper: Option<String>,
    pub auth_token_key: Option<String>,
    pub sync_endpoint: Option<String>,
    pub sync_key: Option<String>,
    pub sync_key_file: Option<PathBuf>,
    pub sync_timeout: Option<String>,
    pub sync_queue_capacity: Option<usize>,
    pub sync_max_in_flight: Option<usize>,
    pub owner_username: Option<String>,
    pub owner_password_file: Option<PathBuf>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));
        let path = |name: &str| var(name).map(PathBuf::from);

        Self {
            config_path: path("HOMEAUTH_CONFIG"),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.parse().ok()),
            auth_password_pepper: var("AUTH_PASSWORD_PEPPER"),
            auth_token_key: var("AUTH_TOKEN_KEY"),
            sync_endpoint: var("HOMEAUTH_SYNC_ENDPOINT"),
            sync_key: var("HOMEAUTH_SYNC_KEY"),
            sync_key_file: path("HOMEAUTH_SYNC_KEY_FILE"),
            sync_timeout: var("HOMEAUTH_SYNC_TIMEOUT"),
            sync_queue_capacity: var("HOMEAUTH_SYNC_QUEUE_CAPACITY")
                .and_then(|s| s.parse().ok()),
            sync_max_in_flight: var("HOMEAUTH_SYNC_MAX_IN_FLIGHT")
                .and_then(|s| s.parse().ok()),
            owner_username: var("HOMEAUTH_OWNER_USERNAME"),
            owner_password_file: path("HOMEAUTH_OWNER_PASSWORD_FILE"),
            dev_mode: var("DEV_MODE").and_then(|raw| parse_bool(&raw)),
        }
    }
}
