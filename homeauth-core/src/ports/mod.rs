//! Trait surfaces for the collaborators the credential commands depend on.
//!
//! The user store and the local auth provider are authoritative external
//! systems; the command handler only talks to them through these traits.

pub mod provider;
pub mod sessions;
pub mod store;

pub use provider::LocalAuthProvider;
pub use sessions::SessionResolver;
pub use store::UserCredentialStore;
