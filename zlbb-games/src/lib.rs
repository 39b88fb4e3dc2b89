//! Static registries of the supported games.
//!
//! Each module implements [`zlbb_core::Game`] for one game. Nothing here
//! knows about storage or submissions.

pub mod forbidden_path;
pub mod infinifactory;

pub use forbidden_path::{FpScore, ForbiddenPath};
pub use infinifactory::{IfScore, Infinifactory};

/// Reads a non-negative integer metric value.
pub(crate) fn int_value(value: &zlbb_core::Value) -> Option<u32> {
    match value {
        zlbb_core::Value::Int(n) => u32::try_from(*n).ok(),
        zlbb_core::Value::Bool(_) => None,
    }
}
