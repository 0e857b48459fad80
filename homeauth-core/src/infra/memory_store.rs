use std::collections::HashMap;

use async_trait::async_trait;
use homeauth_model::{Credential, CredentialData, CredentialId, User, UserId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::ports::UserCredentialStore;

/// Process-local user/credential store.
///
/// Backs the server when no external store is wired in and serves as the
/// reference implementation for tests. Every call takes the lock once, so
/// each operation is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record.
    pub async fn insert_user(&self, user: User) -> UserId {
        let id = user.id;
        self.users.write().await.insert(id, user);
        id
    }

    fn holder_of(
        users: &HashMap<UserId, User>,
        credential_id: CredentialId,
    ) -> Option<UserId> {
        users.values().find_map(|user| {
            user.credentials
                .iter()
                .any(|credential| credential.id == credential_id)
                .then_some(user.id)
        })
    }
}

#[async_trait]
impl UserCredentialStore for InMemoryUserStore {
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn link_user(
        &self,
        user_id: UserId,
        credential: Credential,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;

        if let Some(holder) = Self::holder_of(&users, credential.id) {
            if holder == user_id {
                return Ok(());
            }
            return Err(StoreError::AlreadyLinked {
                credential_id: credential.id,
                user_id: holder,
            });
        }

        let user = users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        debug!(
            user_id = %user_id,
            credential_id = %credential.id,
            provider = %credential.auth_provider_type,
            "linking credential"
        );
        user.credentials.push(credential.persisted());
        Ok(())
    }

    async fn remove_credentials(
        &self,
        credential: &Credential,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let holder = Self::holder_of(&users, credential.id)
            .ok_or(StoreError::CredentialNotFound(credential.id))?;

        if let Some(user) = users.get_mut(&holder) {
            user.credentials.retain(|stored| stored.id != credential.id);
        }
        debug!(
            user_id = %holder,
            credential_id = %credential.id,
            "credential removed"
        );
        Ok(())
    }

    async fn list_credentials(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Credential>, StoreError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .map(|user| user.credentials.clone())
            .ok_or(StoreError::UserNotFound(user_id))
    }

    async fn credentials_for_provider(
        &self,
        provider_type: &str,
    ) -> Result<Vec<Credential>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .flat_map(|user| user.credentials.iter())
            .filter(|credential| credential.is_from_provider(provider_type))
            .cloned()
            .collect())
    }

    async fn update_credential_data(
        &self,
        credential_id: CredentialId,
        data: CredentialData,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let credential = users
            .values_mut()
            .flat_map(|user| user.credentials.iter_mut())
            .find(|credential| credential.id == credential_id)
            .ok_or(StoreError::CredentialNotFound(credential_id))?;
        credential.data = data;
        Ok(())
    }

    async fn find_user_by_credential(
        &self,
        credential_id: CredentialId,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(Self::holder_of(&users, credential_id)
            .and_then(|id| users.get(&id).cloned()))
    }
}
