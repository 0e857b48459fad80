//! In-memory implementations of the collaborator ports.

mod local_provider;
mod memory_store;
mod sessions;

pub use local_provider::{LOCAL_PROVIDER_TYPE, LocalPasswordProvider, normalize_username};
pub use memory_store::InMemoryUserStore;
pub use sessions::InMemorySessionStore;
