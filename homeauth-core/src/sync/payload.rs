use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SyncError;

/// Body posted to the remote account service.
///
/// `new_password` is always the [`PasswordCipher`](super::PasswordCipher)
/// output, never plaintext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

impl fmt::Debug for SyncPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncPayload")
            .field("email", &self.email)
            .field("current_password", &"<redacted>")
            .field("new_password", &"<encrypted>")
            .finish()
    }
}

/// Destination for password sync payloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordSyncSink: Send + Sync {
    async fn push(&self, payload: &SyncPayload) -> Result<(), SyncError>;
}
