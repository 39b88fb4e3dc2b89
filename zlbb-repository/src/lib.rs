//! Submission pipeline for zlbb.
//!
//! Turns raw submissions into frontier changes persisted in the archive:
//!
//! - [`validation`] - the seam to the external validator and claimed-score checks
//! - [`SolutionRepository`] - single and batch submissions, holder queries
//! - [`leaderboard`] - wiki block rendering and publishing

pub mod error;
pub mod leaderboard;
pub mod repository;
pub mod validation;

pub use error::{PublishError, RepositoryError, Result};
pub use leaderboard::{LeaderboardPublisher, MemoryWikiPage, WikiPage, render_block, replace_block};
pub use repository::{SolutionRepository, SubmitResult};
pub use validation::{
    MAX_BATCH_SIZE, Validated, ValidationError, ValidationResult, Validator, validate_submission,
    validate_submissions,
};
