//! Password sync side channel.
//!
//! Self-service password changes are forwarded to a remote account service so
//! that both sides keep accepting the same password. Delivery is best effort:
//! jobs are queued by [`SyncQueue::enqueue`], encrypted and posted by the
//! [`SyncDispatcher`] worker, and failures only show up in [`SyncStats`] and
//! the logs.

mod cipher;
mod dispatcher;
mod http;
mod payload;

use thiserror::Error;

pub use cipher::PasswordCipher;
pub use dispatcher::{
    DispatcherSettings, PasswordSyncJob, SyncDispatcher, SyncQueue, SyncStats,
};
pub use http::HttpPasswordSync;
pub use payload::{PasswordSyncSink, SyncPayload};

#[cfg(test)]
pub use payload::MockPasswordSyncSink;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid sync key: {0}")]
    InvalidKey(String),

    #[error("failed to encrypt sync payload")]
    Encrypt,

    #[error("failed to decrypt sync payload")]
    Decrypt,

    #[error("sync endpoint rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("sync transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
