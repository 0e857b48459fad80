use std::sync::Arc;

use homeauth_core::AuthCrypto;
use homeauth_core::commands::CredentialCommandHandler;
use homeauth_core::infra::{InMemorySessionStore, InMemoryUserStore, LocalPasswordProvider};
use homeauth_core::ports::{LocalAuthProvider, SessionResolver, UserCredentialStore};
use homeauth_core::sync::SyncQueue;

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CredentialCommandHandler>,
    pub store: Arc<dyn UserCredentialStore>,
    pub provider: Arc<dyn LocalAuthProvider>,
    pub sessions: Arc<dyn SessionResolver>,
    pub sync: Option<SyncQueue>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("commands", &self.commands)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

/// State wired to the in-memory store, provider, and session table.
#[derive(Debug, Clone)]
pub struct InMemoryBackends {
    pub state: AppState,
    pub store: Arc<InMemoryUserStore>,
    pub provider: Arc<LocalPasswordProvider>,
}

impl AppState {
    pub fn in_memory(crypto: Arc<AuthCrypto>, sync: Option<SyncQueue>) -> InMemoryBackends {
        let store = Arc::new(InMemoryUserStore::new());
        let provider = Arc::new(LocalPasswordProvider::new(crypto.clone(), store.clone()));
        let sessions = Arc::new(InMemorySessionStore::new(crypto));

        let mut handler = CredentialCommandHandler::new(store.clone(), provider.clone());
        if let Some(queue) = sync.clone() {
            handler = handler.with_sync(queue);
        }

        let state = AppState {
            commands: Arc::new(handler),
            store: store.clone(),
            provider: provider.clone(),
            sessions,
            sync,
        };

        InMemoryBackends {
            state,
            store,
            provider,
        }
    }
}
