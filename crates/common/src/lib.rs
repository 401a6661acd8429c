//! modemsim Common Library
//!
//! Modem definitions, fixture lookup and discovery shared by the mock server
//! and its tooling.

pub mod config;
pub mod crypto;
pub mod discovery;
pub mod error;
pub mod fixtures;
pub mod types;

// Re-export commonly used types
pub use config::{list_modem_fixtures, AuthConfig, Credentials, ModemConfig, PageConfig};
pub use crypto::HmacAlgorithm;
pub use discovery::{discover_descriptors, discover_modems, find_modem};
pub use error::{Error, Result};
pub use fixtures::{Fixture, FixtureStore};
pub use types::*;

/// modemsim version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default modem definitions directory, relative to the working directory
pub fn default_modems_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("modems")
}
