use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use crate::models::{
    AuthConfig, Config, ConfigMetadata, DEFAULT_PASSWORD_PEPPER,
    DEFAULT_SYNC_MAX_IN_FLIGHT, DEFAULT_SYNC_QUEUE_CAPACITY, DEFAULT_SYNC_TIMEOUT,
    DEFAULT_TOKEN_KEY, MAX_SYNC_TIMEOUT, OwnerBootstrap, ServerConfig, SyncConfig,
};
use crate::sources::{EnvConfig, FileConfig, FileOwnerConfig, FileSyncConfig};
use crate::util::{non_empty, parse_duration};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["homeauth.toml", "config/homeauth.toml"];
const SYNC_KEY_LEN: usize = 32;

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` into the process environment, then compose from the
    /// config file and the environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose from an already gathered environment. Does not touch `.env`
    /// or the process environment.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path, false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|source| {
            ConfigLoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded configuration file");

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No homeauth.toml detected; falling back to environment variables",
            "Create homeauth.toml or point HOMEAUTH_CONFIG at a configuration file",
        );
    }

    let FileConfig {
        server: file_server,
        auth: file_auth,
        sync: file_sync,
        owner: file_owner,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(8123),
    };

    let auth = AuthConfig {
        password_pepper: Zeroizing::new(
            env.auth_password_pepper
                .clone()
                .or(non_empty(file_auth.password_pepper))
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
        ),
        token_key: Zeroizing::new(
            env.auth_token_key
                .clone()
                .or(non_empty(file_auth.token_key))
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
        ),
    };

    let sync = resolve_sync(&env, file_sync.unwrap_or_default())?;
    let owner = resolve_owner(&env, file_owner.unwrap_or_default())?;
    let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

    let config = Config {
        server,
        auth,
        sync,
        owner,
        dev_mode,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok((config, warnings))
}

fn resolve_sync(
    env: &EnvConfig,
    file: FileSyncConfig,
) -> Result<Option<SyncConfig>, ConfigLoadError> {
    let Some(raw_endpoint) = env.sync_endpoint.clone().or(non_empty(file.endpoint))
    else {
        return Ok(None);
    };
    let endpoint = Url::parse(&raw_endpoint)
        .map_err(|source| ConfigLoadError::InvalidSyncEndpoint { source })?;

    let encoded_key = match env.sync_key.clone() {
        Some(key) => Some(key),
        None => match env.sync_key_file.as_ref() {
            Some(path) => read_secret_file(path)?,
            None => match non_empty(file.key) {
                Some(key) => Some(key),
                None => match file.key_file.as_ref() {
                    Some(path) => read_secret_file(path)?,
                    None => None,
                },
            },
        },
    };
    let encoded_key = Zeroizing::new(encoded_key.ok_or(ConfigLoadError::MissingSyncKey)?);
    let key = Zeroizing::new(
        BASE64
            .decode(encoded_key.as_bytes())
            .map_err(|err| ConfigLoadError::InvalidSyncKey(err.to_string()))?,
    );
    if key.len() != SYNC_KEY_LEN {
        return Err(ConfigLoadError::InvalidSyncKey(format!(
            "expected {SYNC_KEY_LEN} bytes after base64 decoding, got {}",
            key.len()
        )));
    }

    let timeout = match env.sync_timeout.clone().or(non_empty(file.timeout)) {
        Some(raw) => parse_duration(&raw).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                field: "HOMEAUTH_SYNC_TIMEOUT",
                source,
            }
        })?,
        None => DEFAULT_SYNC_TIMEOUT,
    };
    if timeout.is_zero() || timeout > MAX_SYNC_TIMEOUT {
        return Err(ConfigLoadError::InvalidSyncSetting {
            field: "HOMEAUTH_SYNC_TIMEOUT",
            reason: format!(
                "must be non-zero and at most {}, got {}",
                humantime::format_duration(MAX_SYNC_TIMEOUT),
                humantime::format_duration(timeout)
            ),
        });
    }

    let queue_capacity = env
        .sync_queue_capacity
        .or(file.queue_capacity)
        .unwrap_or(DEFAULT_SYNC_QUEUE_CAPACITY);
    if queue_capacity == 0 {
        return Err(ConfigLoadError::InvalidSyncSetting {
            field: "HOMEAUTH_SYNC_QUEUE_CAPACITY",
            reason: "must be at least 1".to_string(),
        });
    }

    let max_in_flight = env
        .sync_max_in_flight
        .or(file.max_in_flight)
        .unwrap_or(DEFAULT_SYNC_MAX_IN_FLIGHT);
    if max_in_flight == 0 {
        return Err(ConfigLoadError::InvalidSyncSetting {
            field: "HOMEAUTH_SYNC_MAX_IN_FLIGHT",
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(Some(SyncConfig {
        endpoint,
        key,
        timeout,
        queue_capacity,
        max_in_flight,
    }))
}

fn resolve_owner(
    env: &EnvConfig,
    file: FileOwnerConfig,
) -> Result<Option<OwnerBootstrap>, ConfigLoadError> {
    let Some(username) = env.owner_username.clone().or(non_empty(file.username)) else {
        return Ok(None);
    };

    let password_file = env
        .owner_password_file
        .clone()
        .or(file.password_file)
        .ok_or(ConfigLoadError::MissingOwnerPassword)?;
    let password =
        read_secret_file(&password_file)?.ok_or(ConfigLoadError::MissingOwnerPassword)?;

    Ok(Some(OwnerBootstrap {
        username,
        password: Zeroizing::new(password),
    }))
}

fn read_secret_file(path: &Path) -> Result<Option<String>, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| {
        ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read secret file {path}")]
    SecretFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid password sync endpoint")]
    InvalidSyncEndpoint {
        #[source]
        source: url::ParseError,
    },
    #[error("password sync endpoint configured without HOMEAUTH_SYNC_KEY or HOMEAUTH_SYNC_KEY_FILE")]
    MissingSyncKey,
    #[error("invalid password sync key: {0}")]
    InvalidSyncKey(String),
    #[error("invalid duration for {field}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid {field}: {reason}")]
    InvalidSyncSetting { field: &'static str, reason: String },
    #[error("owner username configured without a readable HOMEAUTH_OWNER_PASSWORD_FILE")]
    MissingOwnerPassword,
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
