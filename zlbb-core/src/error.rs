//! Error types for zlbb-core

use thiserror::Error;

/// Errors raised by registry lookups and score parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown puzzle: {0}")]
    UnknownPuzzle(String),

    #[error("puzzle name \"{query}\" is ambiguous, it matches: {matches}")]
    AmbiguousPuzzle { query: String, matches: String },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("invalid score \"{text}\": {reason}")]
    InvalidScore { text: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
