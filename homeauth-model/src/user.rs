use chrono::{DateTime, Utc};

use crate::credential::Credential;
use crate::ids::UserId;

/// A platform user as seen by the credential commands.
///
/// Users are owned by the external user store; commands only read them and
/// ask the store to link or unlink credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    /// The single account that owns the installation.
    pub is_owner: bool,
    pub is_admin: bool,
    pub is_active: bool,
    /// Built-in accounts created by integrations. They never accept
    /// username/password credentials.
    pub system_generated: bool,
    pub credentials: Vec<Credential>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: Some(name.into()),
            is_owner: false,
            is_admin: false,
            is_active: true,
            system_generated: false,
            credentials: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn owner(name: impl Into<String>) -> Self {
        Self {
            is_owner: true,
            is_admin: true,
            ..Self::new(name)
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(name)
        }
    }

    pub fn system(name: impl Into<String>) -> Self {
        Self {
            system_generated: true,
            ..Self::new(name)
        }
    }

    /// First credential issued by `provider_type`, if any.
    pub fn credential_for(&self, provider_type: &str) -> Option<&Credential> {
        self.credentials
            .iter()
            .find(|credential| credential.is_from_provider(provider_type))
    }
}
