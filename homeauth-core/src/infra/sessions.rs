use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use homeauth_model::UserId;
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;

use crate::crypto::AuthCrypto;
use crate::error::StoreError;
use crate::ports::SessionResolver;

const TOKEN_BYTES: usize = 32;

/// Opaque bearer tokens kept in memory, keyed by their HMAC digest so the
/// raw token never sits in the table.
#[derive(Debug)]
pub struct InMemorySessionStore {
    crypto: Arc<AuthCrypto>,
    sessions: RwLock<HashMap<String, UserId>>,
}

impl InMemorySessionStore {
    pub fn new(crypto: Arc<AuthCrypto>) -> Self {
        Self {
            crypto,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[async_trait]
impl SessionResolver for InMemorySessionStore {
    async fn issue_token(&self, user_id: UserId) -> Result<String, StoreError> {
        let token = Self::generate_token();
        self.sessions
            .write()
            .await
            .insert(self.crypto.hash_token(&token), user_id);
        debug!(user_id = %user_id, "issued access token");
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let digest = self.crypto.hash_token(token);
        Ok(self
            .sessions
            .read()
            .await
            .get(&digest)
            .copied())
    }

    async fn revoke_user_tokens(&self, user_id: UserId) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, holder| *holder != user_id);
        Ok(before - sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(Arc::new(
            AuthCrypto::insecure_for_tests("pepper", "token-key").unwrap(),
        ))
    }

    #[tokio::test]
    async fn issued_tokens_resolve_until_revoked() {
        let sessions = store();
        let user = UserId::new();
        let other = UserId::new();

        let first = sessions.issue_token(user).await.unwrap();
        let second = sessions.issue_token(user).await.unwrap();
        let foreign = sessions.issue_token(other).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(sessions.resolve(&first).await.unwrap(), Some(user));

        assert_eq!(sessions.revoke_user_tokens(user).await.unwrap(), 2);
        assert_eq!(sessions.resolve(&second).await.unwrap(), None);
        assert_eq!(sessions.resolve(&foreign).await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_none() {
        assert_eq!(store().resolve("nope").await.unwrap(), None);
    }
}
