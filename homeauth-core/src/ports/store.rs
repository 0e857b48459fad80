use async_trait::async_trait;
use homeauth_model::{Credential, CredentialData, CredentialId, User, UserId};

use crate::error::StoreError;

/// Repository trait for the authoritative user/credential store.
///
/// Implementations own persistence and their own concurrency discipline;
/// callers never hold locks across these calls.
#[async_trait]
pub trait UserCredentialStore: Send + Sync {
    /// Fetch a user with its linked credentials.
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    /// Persist `credential` (if new) and link it to the user.
    async fn link_user(
        &self,
        user_id: UserId,
        credential: Credential,
    ) -> Result<(), StoreError>;

    /// Delete a credential, unlinking it from whichever user holds it.
    async fn remove_credentials(
        &self,
        credential: &Credential,
    ) -> Result<(), StoreError>;

    /// Credentials linked to a user, in link order.
    async fn list_credentials(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Credential>, StoreError>;

    /// All stored credentials issued by one provider type.
    async fn credentials_for_provider(
        &self,
        provider_type: &str,
    ) -> Result<Vec<Credential>, StoreError>;

    /// Replace the provider payload of a stored credential.
    async fn update_credential_data(
        &self,
        credential_id: CredentialId,
        data: CredentialData,
    ) -> Result<(), StoreError>;

    /// Owner of a stored credential.
    async fn find_user_by_credential(
        &self,
        credential_id: CredentialId,
    ) -> Result<Option<User>, StoreError>;
}
