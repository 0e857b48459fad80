use async_trait::async_trait;
use homeauth_model::UserId;

use crate::error::StoreError;

/// Resolves bearer tokens presented to the transport into user ids.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Issue a new opaque access token for `user_id`.
    async fn issue_token(&self, user_id: UserId) -> Result<String, StoreError>;

    /// Resolve a presented token; `None` when unknown or revoked.
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, StoreError>;

    /// Revoke every token issued to `user_id`.
    async fn revoke_user_tokens(&self, user_id: UserId) -> Result<usize, StoreError>;
}
