use async_trait::async_trait;
use homeauth_model::Credential;

use crate::error::ProviderError;

/// The local username/password authentication provider.
///
/// The provider keeps its own registry of usernames and password hashes and
/// mints [`Credential`] records that the user store links to users.
#[async_trait]
pub trait LocalAuthProvider: Send + Sync {
    /// Provider type recorded on every credential this provider issues.
    fn provider_type(&self) -> &str;

    /// Register a username/password pair.
    ///
    /// Fails with [`ProviderError::UsernameExists`] when the username is
    /// already registered.
    async fn add_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ProviderError>;

    /// Drop a username/password registration.
    ///
    /// Fails with [`ProviderError::UnknownUsername`] when nothing is
    /// registered under `username`.
    async fn remove_auth(&self, username: &str) -> Result<(), ProviderError>;

    /// Return the stored credential for `username`, or mint an unsaved one
    /// (`is_new == true`) when none exists yet.
    async fn get_or_create_credentials(
        &self,
        username: &str,
    ) -> Result<Credential, ProviderError>;

    /// Check a username/password pair.
    ///
    /// Fails with [`ProviderError::InvalidAuth`] for unknown usernames and
    /// wrong passwords alike.
    async fn validate_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ProviderError>;

    async fn change_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;

    /// Rename the login behind `credential`, keeping the stored credential
    /// payload in step.
    async fn change_username(
        &self,
        credential: &Credential,
        new_username: &str,
    ) -> Result<(), ProviderError>;

    /// Hook invoked before the store deletes one of this provider's
    /// credentials. The default drops the matching registration and
    /// tolerates it already being gone.
    async fn will_remove_credentials(
        &self,
        credential: &Credential,
    ) -> Result<(), ProviderError> {
        match self.remove_auth(credential.username()).await {
            Ok(()) | Err(ProviderError::UnknownUsername) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
