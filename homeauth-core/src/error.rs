use homeauth_model::{CredentialId, UserId};
use thiserror::Error;

use crate::crypto::AuthCryptoError;

/// Failures reported by a [`UserCredentialStore`](crate::ports::UserCredentialStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("credential {0} not found")]
    CredentialNotFound(CredentialId),

    #[error("credential {credential_id} is already linked to user {user_id}")]
    AlreadyLinked {
        credential_id: CredentialId,
        user_id: UserId,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures reported by a [`LocalAuthProvider`](crate::ports::LocalAuthProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid username or password")]
    InvalidAuth,

    #[error("username already exists")]
    UsernameExists,

    #[error("no login registered for username")]
    UnknownUsername,

    #[error("password hashing failed: {0}")]
    Crypto(#[from] AuthCryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Structured failures of the credential commands.
///
/// Every variant maps to a stable machine-readable [`code`](Self::code) that
/// the transport sends back alongside the display message.
#[derive(Debug, Error)]
pub enum CredentialCommandError {
    #[error("User not found")]
    NotFound,

    #[error("Cannot add credentials to a system generated user.")]
    SystemGenerated,

    #[error("Password should be at least {min_length} characters")]
    InvalidPassword { min_length: usize },

    #[error("User not found")]
    UserNotFound,

    #[error("Credentials not found")]
    CredentialsNotFound,

    #[error("Invalid current password")]
    InvalidCurrentPassword,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Only the owner can change credentials of other users")]
    OwnerRequired,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Invalid request: {0}")]
    InvalidFormat(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CredentialCommandError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::SystemGenerated => "system_generated",
            Self::InvalidPassword { .. } => "invalid_password",
            Self::UserNotFound => "user_not_found",
            Self::CredentialsNotFound => "credentials_not_found",
            Self::InvalidCurrentPassword => "invalid_current_password",
            Self::AdminRequired => "forbidden",
            Self::OwnerRequired => "unauthorized",
            Self::UsernameExists => "username_exists",
            Self::InvalidFormat(_) => "invalid_format",
            Self::Internal(_) => "unknown_error",
        }
    }

    /// Authorization failures, as opposed to validation or lookup failures.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::AdminRequired | Self::OwnerRequired)
    }
}

impl From<StoreError> for CredentialCommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(_) => Self::UserNotFound,
            StoreError::CredentialNotFound(_) => Self::CredentialsNotFound,
            other => {
                tracing::error!(error = %other, "credential store failure");
                Self::Internal("Credential store failure".to_string())
            }
        }
    }
}

impl From<ProviderError> for CredentialCommandError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UsernameExists => Self::UsernameExists,
            ProviderError::UnknownUsername => Self::CredentialsNotFound,
            ProviderError::InvalidAuth => Self::InvalidCurrentPassword,
            ProviderError::Store(err) => Self::from(err),
            ProviderError::Crypto(err) => {
                tracing::error!(error = %err, "auth provider crypto failure");
                Self::Internal("Auth provider failure".to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CredentialCommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_failures_have_distinct_codes() {
        assert_eq!(CredentialCommandError::AdminRequired.code(), "forbidden");
        assert_eq!(CredentialCommandError::OwnerRequired.code(), "unauthorized");
        assert!(CredentialCommandError::OwnerRequired.is_authorization());
        assert!(!CredentialCommandError::NotFound.is_authorization());
    }

    #[test]
    fn store_backend_errors_are_not_leaked() {
        let err: CredentialCommandError =
            StoreError::Backend("disk on fire at /var/lib".into()).into();
        assert_eq!(err.code(), "unknown_error");
        assert!(!err.to_string().contains("/var/lib"));
    }

    #[test]
    fn password_error_mentions_minimum() {
        let err = CredentialCommandError::InvalidPassword { min_length: 6 };
        assert_eq!(err.to_string(), "Password should be at least 6 characters");
        assert_eq!(err.code(), "invalid_password");
    }
}
