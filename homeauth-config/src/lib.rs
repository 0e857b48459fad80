//! Configuration for homeauth.
//!
//! Values are layered from a `.env` file, an optional TOML file, and the
//! process environment, in increasing order of precedence. The composed
//! [`Config`] is checked by [`validation::apply_guard_rails`] before it is
//! handed out.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AuthConfig, Config, ConfigMetadata, OwnerBootstrap, ServerConfig, SyncConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
