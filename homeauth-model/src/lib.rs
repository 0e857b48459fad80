//! Core data model definitions shared across homeauth crates.
#![allow(missing_docs)]

pub mod credential;
pub mod ids;
pub mod user;

pub use credential::{Credential, CredentialData};
pub use ids::{CredentialId, UserId};
pub use user::User;
