//! Core model and frontier engine for zlbb.
//!
//! A game is described by static descriptor tables: [`Metric`]s that extract
//! values from a score, [`Category`]s that rank eligible scores, and the
//! [`Puzzle`]s the categories apply to. The [`Frontier`] keeps, per puzzle,
//! the set of mutually non-dominating [`Solution`]s and decides which of them
//! hold each category.
//!
//! # Key Types
//!
//! - [`Game`] - Registry surface tying metrics, categories and puzzles together
//! - [`Frontier`] - Pareto frontier with staged, non-mutating insertion
//! - [`DuplicatePolicy`] - Pluggable rule for resubmissions of a known score

pub mod category;
pub mod error;
pub mod frontier;
pub mod game;
pub mod metric;
pub mod puzzle;
pub mod score;
pub mod solution;

pub use category::{Category, Eligibility, build_comparator, compare_by};
pub use error::{CoreError, Result};
pub use frontier::{
    ArchiveRules, DefaultDuplicatePolicy, Dominance, DuplicatePolicy, DuplicateResolution,
    Frontier, Insertion, dominance,
};
pub use game::Game;
pub use metric::{Metric, MetricRole, Preference, Value};
pub use puzzle::{Puzzle, Variant};
pub use score::{Score, StringFormat, format_score, parse_values};
pub use solution::{CategoryRecord, Record, Solution, Submission};
