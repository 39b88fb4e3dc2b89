//! Error types for the archive store.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing the archive.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A git invocation exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("failed to serialize solution metadata: {0}")]
    Marshal(#[from] toml::ser::Error),

    /// A stored solution file could not be parsed.
    #[error("invalid solution file {}: {reason}", path.display())]
    Unmarshal { path: PathBuf, reason: String },

    /// Stored data is inconsistent with the registry.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A thread panicked while holding an archive lock.
    #[error("archive lock poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::Poisoned
    }
}
