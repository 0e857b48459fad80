use chrono::{DateTime, Utc};

use crate::ids::CredentialId;

/// Provider-specific payload attached to a credential.
///
/// Only the local username/password provider is modelled, so the payload is
/// the login name the provider knows the credential by.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredentialData {
    pub username: String,
}

impl CredentialData {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// A credential issued by one authentication provider and linked to at most
/// one user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credential {
    pub id: CredentialId,
    pub auth_provider_type: String,
    pub auth_provider_id: Option<String>,
    pub data: CredentialData,
    pub created_at: DateTime<Utc>,
    /// True when the credential was minted by a provider lookup and has not
    /// been persisted by the store yet.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub is_new: bool,
}

impl Credential {
    /// Mint an unsaved credential for `provider_type`.
    pub fn new(
        provider_type: impl Into<String>,
        provider_id: Option<String>,
        data: CredentialData,
    ) -> Self {
        Self {
            id: CredentialId::new(),
            auth_provider_type: provider_type.into(),
            auth_provider_id: provider_id,
            data,
            created_at: Utc::now(),
            is_new: true,
        }
    }

    pub fn username(&self) -> &str {
        &self.data.username
    }

    pub fn is_from_provider(&self, provider_type: &str) -> bool {
        self.auth_provider_type == provider_type
    }

    /// Mark the credential as persisted.
    pub fn persisted(mut self) -> Self {
        self.is_new = false;
        self
    }
}
