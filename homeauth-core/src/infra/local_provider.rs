use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use homeauth_model::{Credential, CredentialData};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::crypto::AuthCrypto;
use crate::error::ProviderError;
use crate::ports::{LocalAuthProvider, UserCredentialStore};

/// Provider type written on credentials minted by [`LocalPasswordProvider`].
pub const LOCAL_PROVIDER_TYPE: &str = "local";

/// Canonical form of a login name: surrounding whitespace trimmed and
/// lowercased.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Username/password provider with Argon2id hashes held in memory.
///
/// Credentials themselves live in the [`UserCredentialStore`]; this type only
/// owns the login registry and keeps credential payloads in step on rename.
pub struct LocalPasswordProvider {
    crypto: Arc<AuthCrypto>,
    store: Arc<dyn UserCredentialStore>,
    logins: RwLock<HashMap<String, String>>,
}

impl std::fmt::Debug for LocalPasswordProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPasswordProvider")
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}

impl LocalPasswordProvider {
    pub fn new(
        crypto: Arc<AuthCrypto>,
        store: Arc<dyn UserCredentialStore>,
    ) -> Self {
        Self {
            crypto,
            store,
            logins: RwLock::new(HashMap::new()),
        }
    }

    pub async fn is_registered(&self, username: &str) -> bool {
        self.logins
            .read()
            .await
            .contains_key(&normalize_username(username))
    }
}

#[async_trait]
impl LocalAuthProvider for LocalPasswordProvider {
    fn provider_type(&self) -> &str {
        LOCAL_PROVIDER_TYPE
    }

    async fn add_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        let username = normalize_username(username);
        if self.logins.read().await.contains_key(&username) {
            return Err(ProviderError::UsernameExists);
        }

        // Hash outside the lock; re-check on insert.
        let hash = self.crypto.hash_password(password)?;
        let mut logins = self.logins.write().await;
        if logins.contains_key(&username) {
            return Err(ProviderError::UsernameExists);
        }
        logins.insert(username.clone(), hash);
        debug!(username = %username, "local login registered");
        Ok(())
    }

    async fn remove_auth(&self, username: &str) -> Result<(), ProviderError> {
        let username = normalize_username(username);
        self.logins
            .write()
            .await
            .remove(&username)
            .map(|_| ())
            .ok_or(ProviderError::UnknownUsername)
    }

    async fn get_or_create_credentials(
        &self,
        username: &str,
    ) -> Result<Credential, ProviderError> {
        let username = normalize_username(username);
        let existing = self
            .store
            .credentials_for_provider(LOCAL_PROVIDER_TYPE)
            .await?
            .into_iter()
            .find(|credential| {
                normalize_username(credential.username()) == username
            });

        Ok(match existing {
            Some(credential) => credential.persisted(),
            None => Credential::new(
                LOCAL_PROVIDER_TYPE,
                None,
                CredentialData::new(username),
            ),
        })
    }

    async fn validate_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        let stored = self
            .logins
            .read()
            .await
            .get(&normalize_username(username))
            .cloned();

        let Some(hash) = stored else {
            // Spend comparable time on unknown usernames.
            let _ = self.crypto.hash_password(password);
            return Err(ProviderError::InvalidAuth);
        };

        if self.crypto.verify_password(password, &hash)? {
            Ok(())
        } else {
            Err(ProviderError::InvalidAuth)
        }
    }

    async fn change_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        let username = normalize_username(username);
        let hash = self.crypto.hash_password(new_password)?;
        let mut logins = self.logins.write().await;
        let slot = logins
            .get_mut(&username)
            .ok_or(ProviderError::UnknownUsername)?;
        *slot = hash;
        Ok(())
    }

    async fn change_username(
        &self,
        credential: &Credential,
        new_username: &str,
    ) -> Result<(), ProviderError> {
        let old = normalize_username(credential.username());
        let new = normalize_username(new_username);

        if old != new {
            let mut logins = self.logins.write().await;
            if logins.contains_key(&new) {
                return Err(ProviderError::UsernameExists);
            }
            let hash = logins
                .remove(&old)
                .ok_or(ProviderError::UnknownUsername)?;
            logins.insert(new.clone(), hash);
        }

        let updated = self
            .store
            .update_credential_data(credential.id, CredentialData::new(new.clone()))
            .await;

        if let Err(err) = updated {
            if old != new {
                let mut logins = self.logins.write().await;
                if let Some(hash) = logins.remove(&new) {
                    logins.insert(old, hash);
                }
            }
            warn!(
                credential_id = %credential.id,
                error = %err,
                "credential payload update failed; rename reverted"
            );
            return Err(err.into());
        }

        debug!(credential_id = %credential.id, username = %new, "local login renamed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use homeauth_model::User;

    use super::*;
    use crate::infra::InMemoryUserStore;

    async fn setup() -> (Arc<InMemoryUserStore>, LocalPasswordProvider) {
        let store = Arc::new(InMemoryUserStore::new());
        let crypto =
            Arc::new(AuthCrypto::insecure_for_tests("pepper", "token-key").unwrap());
        let provider = LocalPasswordProvider::new(crypto, store.clone());
        (store, provider)
    }

    #[test]
    fn usernames_are_normalized() {
        assert_eq!(normalize_username("  Alice "), "alice");
    }

    #[tokio::test]
    async fn add_then_validate() {
        let (_, provider) = setup().await;
        provider.add_auth("Alice", "secret1").await.unwrap();

        provider.validate_login("alice", "secret1").await.unwrap();
        assert!(matches!(
            provider.validate_login("alice", "wrong").await,
            Err(ProviderError::InvalidAuth)
        ));
        assert!(matches!(
            provider.validate_login("nobody", "secret1").await,
            Err(ProviderError::InvalidAuth)
        ));
        assert!(matches!(
            provider.add_auth(" ALICE", "other").await,
            Err(ProviderError::UsernameExists)
        ));
    }

    #[tokio::test]
    async fn get_or_create_finds_stored_credential() {
        let (store, provider) = setup().await;
        let minted = provider.get_or_create_credentials("alice").await.unwrap();
        assert!(minted.is_new);

        let user_id = store.insert_user(User::new("Alice")).await;
        store.link_user(user_id, minted.clone()).await.unwrap();

        let found = provider.get_or_create_credentials("Alice").await.unwrap();
        assert!(!found.is_new);
        assert_eq!(found.id, minted.id);
    }

    #[tokio::test]
    async fn rename_moves_login_and_payload() {
        let (store, provider) = setup().await;
        provider.add_auth("alice", "secret1").await.unwrap();
        let credential = provider.get_or_create_credentials("alice").await.unwrap();
        let user_id = store.insert_user(User::new("Alice")).await;
        store.link_user(user_id, credential.clone()).await.unwrap();

        provider.change_username(&credential, "Alicia").await.unwrap();

        provider.validate_login("alicia", "secret1").await.unwrap();
        assert!(!provider.is_registered("alice").await);
        let user = store.get_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.credential_for(LOCAL_PROVIDER_TYPE).unwrap().username(), "alicia");
    }

    #[tokio::test]
    async fn rename_is_reverted_when_store_update_fails() {
        let (_, provider) = setup().await;
        provider.add_auth("alice", "secret1").await.unwrap();
        // Never linked, so the store has nothing to update.
        let credential = provider.get_or_create_credentials("alice").await.unwrap();

        let err = provider
            .change_username(&credential, "alicia")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Store(_)));
        assert!(provider.is_registered("alice").await);
        assert!(!provider.is_registered("alicia").await);
    }

    #[tokio::test]
    async fn rename_onto_taken_username_fails() {
        let (_, provider) = setup().await;
        provider.add_auth("alice", "secret1").await.unwrap();
        provider.add_auth("bob", "secret2").await.unwrap();
        let credential = provider.get_or_create_credentials("alice").await.unwrap();

        assert!(matches!(
            provider.change_username(&credential, "Bob").await,
            Err(ProviderError::UsernameExists)
        ));
    }

    #[tokio::test]
    async fn change_password_requires_registration() {
        let (_, provider) = setup().await;
        assert!(matches!(
            provider.change_password("ghost", "secret1").await,
            Err(ProviderError::UnknownUsername)
        ));

        provider.add_auth("alice", "secret1").await.unwrap();
        provider.change_password("alice", "secret2").await.unwrap();
        provider.validate_login("alice", "secret2").await.unwrap();
    }
}
