//! Credential command core for homeauth.
//!
//! The [`commands::CredentialCommandHandler`] runs the five local-provider
//! credential commands (create, delete, change password, and the two owner
//! overrides) against a [`ports::UserCredentialStore`] and a
//! [`ports::LocalAuthProvider`]. Self-service password changes are forwarded
//! through the [`sync`] side channel.
//!
//! In-memory implementations of the ports live in [`infra`].

#![allow(missing_docs)]

pub mod commands;
pub mod crypto;
pub mod error;
pub mod infra;
pub mod ports;
pub mod sync;

pub use commands::{
    CommandEnvelope, CommandResponse, CredentialCommand, CredentialCommandHandler,
};
pub use crypto::{AuthCrypto, AuthCryptoError};
pub use error::{CredentialCommandError, ProviderError, StoreError};
