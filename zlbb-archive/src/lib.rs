//! Version-controlled archive store for zlbb.
//!
//! The archive of every puzzle is a directory of solution files in a git
//! repository that doubles as the public record. This crate provides:
//!
//! - [`ArchiveStore`] - lock-free snapshots plus one exclusive [`WriteSession`]
//! - [`GitArchiveStore`] - the production store, shelling out to `git`
//! - [`MemoryArchiveStore`] - an in-memory store with failure injection
//! - [`marshal`] - the file format of a frontier

pub mod config;
pub mod error;
pub mod git;
pub mod marshal;
pub mod memory;
pub mod store;

pub use config::ArchiveConfig;
pub use error::{Error, Result};
pub use git::{GitArchiveStore, GitSession, GitSnapshot};
pub use memory::{MemoryArchiveStore, MemorySession, MemorySnapshot};
pub use store::{ArchiveStore, Snapshot, WriteSession};
