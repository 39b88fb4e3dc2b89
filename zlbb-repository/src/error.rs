//! Error types for the submission pipeline.

use thiserror::Error;
use zlbb_core::CoreError;

use crate::validation::ValidationError;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Operational errors. Rejected submissions are not errors; they are
/// reported through [`crate::SubmitResult`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Reading, committing or pushing the archive failed. The staged
    /// frontier has been discarded.
    #[error("archive persistence failed: {0}")]
    Persistence(#[from] zlbb_archive::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The batch as a whole was refused before any item was validated.
    #[error("batch rejected: {0}")]
    BatchRejected(ValidationError),

    #[error("leaderboard publishing failed: {0}")]
    Publish(#[from] PublishError),
}

/// Errors of the external wiki page.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("wiki page unavailable: {0}")]
    Unavailable(String),

    /// The page refused the edit.
    #[error("wiki page update rejected: {0}")]
    Rejected(String),
}
