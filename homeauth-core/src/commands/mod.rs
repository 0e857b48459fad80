//! Credential management commands and their wire envelope.

mod authz;
mod handler;

use std::fmt;

use homeauth_model::UserId;
use serde::{Deserialize, Serialize};

pub use authz::{Access, authorize};
pub use handler::{CredentialCommandHandler, Dispatched, MIN_PASSWORD_LENGTH};

use crate::error::CredentialCommandError;

/// One credential management request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CredentialCommand {
    /// Register a login and link it to an existing user.
    #[serde(rename = "auth_provider/local/create")]
    Create {
        user_id: UserId,
        username: String,
        password: String,
    },
    /// Remove a login and the credential linked to it.
    #[serde(rename = "auth_provider/local/delete")]
    Delete { username: String },
    /// Caller changes their own password.
    #[serde(rename = "auth_provider/local/change_password")]
    ChangePassword {
        current_password: String,
        new_password: String,
    },
    /// Owner resets another user's password.
    #[serde(rename = "auth_provider/local/admin_change_password")]
    AdminChangePassword { user_id: UserId, password: String },
    /// Owner renames another user's login.
    #[serde(rename = "auth_provider/local/admin_change_username")]
    AdminChangeUsername { user_id: UserId, username: String },
}

impl CredentialCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "auth_provider/local/create",
            Self::Delete { .. } => "auth_provider/local/delete",
            Self::ChangePassword { .. } => "auth_provider/local/change_password",
            Self::AdminChangePassword { .. } => {
                "auth_provider/local/admin_change_password"
            }
            Self::AdminChangeUsername { .. } => {
                "auth_provider/local/admin_change_username"
            }
        }
    }

}

impl fmt::Debug for CredentialCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create {
                user_id, username, ..
            } => f
                .debug_struct("Create")
                .field("user_id", user_id)
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Delete { username } => {
                f.debug_struct("Delete").field("username", username).finish()
            }
            Self::ChangePassword { .. } => {
                f.debug_struct("ChangePassword").finish_non_exhaustive()
            }
            Self::AdminChangePassword { user_id, .. } => f
                .debug_struct("AdminChangePassword")
                .field("user_id", user_id)
                .finish_non_exhaustive(),
            Self::AdminChangeUsername { user_id, username } => f
                .debug_struct("AdminChangeUsername")
                .field("user_id", user_id)
                .field("username", username)
                .finish(),
        }
    }
}

/// Request as it travels on the wire: `{ "id": 7, "type": "...", ...fields }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: u64,
    #[serde(flatten)]
    pub command: CredentialCommand,
}

impl CommandEnvelope {
    /// Decode an envelope, keeping the request id for the error reply when
    /// the rest of the message is unusable.
    pub fn decode(
        raw: serde_json::Value,
    ) -> std::result::Result<Self, (u64, CredentialCommandError)> {
        let id = raw.get("id").and_then(serde_json::Value::as_u64).unwrap_or(0);
        serde_json::from_value(raw)
            .map_err(|err| (id, CredentialCommandError::InvalidFormat(err.to_string())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&CredentialCommandError> for ErrorBody {
    fn from(err: &CredentialCommandError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Result,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Option<serde_json::Value>),
    Error(ErrorBody),
}

/// Reply to a [`CommandEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub success: bool,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl CommandResponse {
    pub fn ok(id: u64) -> Self {
        Self {
            id,
            kind: ResponseKind::Result,
            success: true,
            outcome: Outcome::Result(None),
        }
    }

    pub fn error(id: u64, err: &CredentialCommandError) -> Self {
        Self {
            id,
            kind: ResponseKind::Result,
            success: false,
            outcome: Outcome::Error(err.into()),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Error(body) => Some(&body.code),
            Outcome::Result(_) => None,
        }
    }
}
