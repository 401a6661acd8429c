//! Error types for modemsim

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using modemsim Error
pub type Result<T> = std::result::Result<T, Error>;

/// modemsim error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid modem configuration at {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("Unsupported auth type: {0}")]
    UnsupportedAuthType(String),

    #[error("Fixture not found: {0}")]
    FixtureNotFound(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] failure.
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
