use thiserror::Error;

use crate::models::{AuthConfig, Config};

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
    #[error("password sync endpoint {endpoint} must use https when DEV_MODE is false")]
    InsecureSyncEndpoint { endpoint: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.dev_mode {
        if config.auth.is_default_pepper() || config.auth.is_default_token_key() {
            warnings.push_with_hint(
                "Using placeholder authentication secrets (DEV_MODE)",
                "Set AUTH_PASSWORD_PEPPER and AUTH_TOKEN_KEY before exposing the server",
            );
        }
    } else {
        enforce_secrets(&config.auth)?;
    }

    match &config.sync {
        Some(sync) if sync.endpoint.scheme() != "https" => {
            if !config.dev_mode {
                return Err(ConfigGuardRailError::InsecureSyncEndpoint {
                    endpoint: sync.endpoint.to_string(),
                });
            }
            warnings.push(format!(
                "Password sync endpoint {} is not https; passwords cross the wire unprotected",
                sync.endpoint
            ));
        }
        Some(_) => {}
        None => warnings.push_with_hint(
            "HOMEAUTH_SYNC_ENDPOINT not configured; password changes are not synced",
            "Set HOMEAUTH_SYNC_ENDPOINT and HOMEAUTH_SYNC_KEY to enable the sync channel",
        ),
    }

    if config.owner.is_none() {
        warnings.push_with_hint(
            "No owner bootstrap configured",
            "Set HOMEAUTH_OWNER_USERNAME and HOMEAUTH_OWNER_PASSWORD_FILE to create the owner on first start",
        );
    }

    Ok(warnings)
}

fn enforce_secrets(auth: &AuthConfig) -> Result<(), ConfigGuardRailError> {
    if auth.is_default_pepper() {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_PASSWORD_PEPPER",
            reason: "uses the default placeholder value".into(),
        });
    }

    if auth.password_pepper.len() < MIN_SECRET_LENGTH {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_PASSWORD_PEPPER",
            reason: format!("must be at least {MIN_SECRET_LENGTH} characters"),
        });
    }

    if auth.is_default_token_key() {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_TOKEN_KEY",
            reason: "uses the default placeholder value".into(),
        });
    }

    if auth.token_key.len() < MIN_SECRET_LENGTH {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_TOKEN_KEY",
            reason: format!("must be at least {MIN_SECRET_LENGTH} characters"),
        });
    }

    Ok(())
}
