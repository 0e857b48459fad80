use std::sync::Arc;

use homeauth_model::{User, UserId};
use tracing::{debug, info, instrument, warn};

use super::{Access, CommandEnvelope, CommandResponse, CredentialCommand, authorize};
use crate::error::{CredentialCommandError, ProviderError, Result};
use crate::ports::{LocalAuthProvider, UserCredentialStore};
use crate::sync::{PasswordSyncJob, SyncQueue};

/// Shortest accepted self-service password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Outcome of one dispatched envelope.
#[derive(Debug)]
pub struct Dispatched {
    pub request_id: u64,
    /// User whose password was reset by the owner, set only on success.
    pub password_reset: Option<UserId>,
    pub result: Result<()>,
}

impl Dispatched {
    pub fn response(&self) -> CommandResponse {
        match &self.result {
            Ok(()) => CommandResponse::ok(self.request_id),
            Err(err) => CommandResponse::error(self.request_id, err),
        }
    }
}

/// Executes credential commands against the store and the local provider.
///
/// Every operation authorizes the caller before touching either
/// collaborator. Self-service password changes are handed to the sync queue
/// after the provider has been updated; sync never affects the reply.
pub struct CredentialCommandHandler {
    store: Arc<dyn UserCredentialStore>,
    provider: Arc<dyn LocalAuthProvider>,
    sync: Option<SyncQueue>,
}

impl std::fmt::Debug for CredentialCommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCommandHandler")
            .field("provider", &self.provider.provider_type())
            .field("sync", &self.sync.is_some())
            .finish_non_exhaustive()
    }
}

impl CredentialCommandHandler {
    pub fn new(
        store: Arc<dyn UserCredentialStore>,
        provider: Arc<dyn LocalAuthProvider>,
    ) -> Self {
        Self {
            store,
            provider,
            sync: None,
        }
    }

    pub fn with_sync(mut self, queue: SyncQueue) -> Self {
        self.sync = Some(queue);
        self
    }

    /// Decode a raw envelope and run it.
    ///
    /// This is the single entry point transports use; the request id is kept
    /// even when the envelope itself is malformed.
    pub async fn dispatch(
        &self,
        caller: Option<&User>,
        raw: serde_json::Value,
    ) -> Dispatched {
        let envelope = match CommandEnvelope::decode(raw) {
            Ok(envelope) => envelope,
            Err((request_id, err)) => {
                debug!(request_id, error = %err, "rejecting malformed command");
                return Dispatched {
                    request_id,
                    password_reset: None,
                    result: Err(err),
                };
            }
        };

        let request_id = envelope.id;
        let kind = envelope.command.kind();
        let reset_target = match &envelope.command {
            CredentialCommand::AdminChangePassword { user_id, .. } => Some(*user_id),
            _ => None,
        };

        let result = self.execute(caller, envelope.command).await;
        if let Err(err) = &result {
            if err.is_authorization() {
                warn!(
                    request_id,
                    command = kind,
                    caller = ?caller.map(|user| user.id),
                    code = err.code(),
                    "credential command denied"
                );
            } else {
                debug!(
                    request_id,
                    command = kind,
                    code = err.code(),
                    "credential command failed"
                );
            }
        }

        Dispatched {
            request_id,
            password_reset: reset_target.filter(|_| result.is_ok()),
            result,
        }
    }

    async fn execute(
        &self,
        caller: Option<&User>,
        command: CredentialCommand,
    ) -> Result<()> {
        match command {
            CredentialCommand::Create {
                user_id,
                username,
                password,
            } => self.create(caller, user_id, &username, &password).await,
            CredentialCommand::Delete { username } => {
                self.delete(caller, &username).await
            }
            CredentialCommand::ChangePassword {
                current_password,
                new_password,
            } => {
                self.change_password(caller, &current_password, &new_password)
                    .await
            }
            CredentialCommand::AdminChangePassword { user_id, password } => {
                self.admin_change_password(caller, user_id, &password).await
            }
            CredentialCommand::AdminChangeUsername { user_id, username } => {
                self.admin_change_username(caller, user_id, &username).await
            }
        }
    }

    /// Register `username` with the local provider and link the resulting
    /// credential to `user_id`.
    #[instrument(skip(self, caller, user_id, password), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        caller: Option<&User>,
        user_id: UserId,
        username: &str,
        password: &str,
    ) -> Result<()> {
        authorize(caller, Access::Admin)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(CredentialCommandError::NotFound)?;
        if user.system_generated {
            return Err(CredentialCommandError::SystemGenerated);
        }

        self.provider.add_auth(username, password).await?;

        let linked = async {
            let credential = self.provider.get_or_create_credentials(username).await?;
            self.store.link_user(user.id, credential).await?;
            Ok::<_, CredentialCommandError>(())
        }
        .await;

        if let Err(err) = linked {
            if let Err(cleanup) = self.provider.remove_auth(username).await {
                warn!(error = %cleanup, "failed to roll back login after link failure");
            }
            return Err(err);
        }

        info!(username, "local credential created");
        Ok(())
    }

    /// Drop the login for `username` and the credential linked to it, if any.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: Option<&User>, username: &str) -> Result<()> {
        authorize(caller, Access::Admin)?;

        let credential = self.provider.get_or_create_credentials(username).await?;

        if !credential.is_new {
            self.store.remove_credentials(&credential).await?;
            self.provider.will_remove_credentials(&credential).await?;
            info!(credential_id = %credential.id, "local credential removed");
            return Ok(());
        }

        match self.provider.remove_auth(username).await {
            Ok(()) => info!("unlinked local login removed"),
            Err(ProviderError::UnknownUsername) => {
                debug!("delete for unregistered username; nothing to remove")
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// Change the caller's own password after re-checking the current one.
    #[instrument(skip_all, fields(user_id = ?caller.map(|user| user.id)))]
    pub async fn change_password(
        &self,
        caller: Option<&User>,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = authorize(caller, Access::Authenticated)?;

        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CredentialCommandError::InvalidPassword {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }

        let username = user
            .credential_for(self.provider.provider_type())
            .map(|credential| credential.username().to_owned())
            .ok_or(CredentialCommandError::CredentialsNotFound)?;

        self.provider
            .validate_login(&username, current_password)
            .await?;
        self.provider.change_password(&username, new_password).await?;
        info!("password changed");

        if let Some(queue) = &self.sync {
            queue.enqueue(PasswordSyncJob::new(
                username,
                current_password,
                new_password,
            ));
        }
        Ok(())
    }

    /// Reset another user's password. Owner only.
    #[instrument(skip(self, caller, user_id, password), fields(user_id = %user_id))]
    pub async fn admin_change_password(
        &self,
        caller: Option<&User>,
        user_id: UserId,
        password: &str,
    ) -> Result<()> {
        authorize(caller, Access::Owner)?;

        let username = self
            .local_credential(user_id)
            .await?
            .username()
            .to_owned();
        self.provider.change_password(&username, password).await?;
        info!("password reset by owner");
        Ok(())
    }

    /// Rename another user's login. Owner only.
    #[instrument(skip(self, caller, user_id), fields(user_id = %user_id))]
    pub async fn admin_change_username(
        &self,
        caller: Option<&User>,
        user_id: UserId,
        username: &str,
    ) -> Result<()> {
        authorize(caller, Access::Owner)?;

        let credential = self.local_credential(user_id).await?;
        self.provider.change_username(&credential, username).await?;
        info!(username, "username changed by owner");
        Ok(())
    }

    async fn local_credential(
        &self,
        user_id: UserId,
    ) -> Result<homeauth_model::Credential> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(CredentialCommandError::UserNotFound)?;
        user.credential_for(self.provider.provider_type())
            .cloned()
            .ok_or(CredentialCommandError::CredentialsNotFound)
    }
}
