#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use homeauth_core::AuthCrypto;
use homeauth_core::commands::CredentialCommandHandler;
use homeauth_core::infra::{InMemoryUserStore, LocalPasswordProvider};
use homeauth_core::ports::UserCredentialStore;
use homeauth_core::sync::{PasswordSyncSink, SyncError, SyncPayload};
use homeauth_model::{User, UserId};

/// Store, provider, and an owner account wired together for end-to-end tests.
pub struct CommandHarness {
    pub store: Arc<InMemoryUserStore>,
    pub provider: Arc<LocalPasswordProvider>,
    pub owner: User,
}

impl CommandHarness {
    pub async fn new() -> Result<Self> {
        let store = Arc::new(InMemoryUserStore::new());
        let crypto = Arc::new(AuthCrypto::insecure_for_tests(
            "test-pepper",
            "test-token-key",
        )?);
        let provider = Arc::new(LocalPasswordProvider::new(crypto, store.clone()));
        let owner = User::owner("Owner");
        store.insert_user(owner.clone()).await;

        Ok(Self {
            store,
            provider,
            owner,
        })
    }

    pub fn handler(&self) -> CredentialCommandHandler {
        CredentialCommandHandler::new(self.store.clone(), self.provider.clone())
    }

    pub async fn add_user(&self, user: User) -> UserId {
        self.store.insert_user(user).await
    }

    /// Fresh copy of a user, including linked credentials.
    pub async fn reload(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {user_id} vanished"))
    }
}

/// Sink that records every payload it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub payloads: Mutex<Vec<SyncPayload>>,
}

#[async_trait]
impl PasswordSyncSink for RecordingSink {
    async fn push(&self, payload: &SyncPayload) -> Result<(), SyncError> {
        self.payloads
            .lock()
            .expect("recording sink poisoned")
            .push(payload.clone());
        Ok(())
    }
}

/// Sink whose endpoint refuses every payload.
pub struct RejectingSink;

#[async_trait]
impl PasswordSyncSink for RejectingSink {
    async fn push(&self, _payload: &SyncPayload) -> Result<(), SyncError> {
        Err(SyncError::Rejected {
            status: 500,
            body: "sync backend down".to_string(),
        })
    }
}
