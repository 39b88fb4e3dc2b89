//! Store traits.
//!
//! The archive is a tree of text files under version control. Readers take a
//! [`Snapshot`] of the last committed state without any locking. Writers go
//! through [`ArchiveStore::write_access`], which hands out at most one
//! [`WriteSession`] at a time.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Read access to one state of the archive tree.
///
/// Paths are relative to the archive root.
pub trait Snapshot {
    /// Files directly below `dir`, as paths relative to the archive root, in
    /// lexicographic order. A missing directory is empty.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Contents of the file at `path`, or `None` if there is none.
    fn read(&self, path: &Path) -> Result<Option<String>>;

    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.read(path)?.is_some())
    }
}

/// Exclusive write access to the archive.
///
/// Reads through a session observe its own uncommitted writes. Dropping the
/// session releases the writer lock after pushing any commit not pushed yet;
/// a failure of that push is logged, not returned. Call [`WriteSession::push`]
/// to observe push errors.
pub trait WriteSession: Snapshot {
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;

    /// Removes the file at `path`. Removing a missing file is not an error.
    fn remove(&mut self, path: &Path) -> Result<()>;

    /// Commits every pending change as one commit.
    ///
    /// Returns `false` when there was nothing to commit. On failure the
    /// working state is reset to the previous commit, so no partial change
    /// survives.
    fn commit(&mut self, message: &str) -> Result<bool>;

    /// Publishes local commits to the store of record.
    fn push(&mut self) -> Result<()>;

    /// Discards uncommitted changes and every commit not pushed yet.
    fn rollback(&mut self) -> Result<()>;
}

/// A version-controlled archive.
pub trait ArchiveStore: Send + Sync {
    type Snapshot: Snapshot;
    type Session<'a>: WriteSession
    where
        Self: 'a;

    /// Lock-free view of the last committed state. It may trail an in-flight
    /// write session.
    fn snapshot(&self) -> Result<Self::Snapshot>;

    /// Blocks until no other session is active, synchronizes with the store
    /// of record and returns the session.
    fn write_access(&self) -> Result<Self::Session<'_>>;

    /// Public link to the committed file at `path`.
    fn raw_link(&self, path: &Path) -> String;
}

/// Joins path components with `/` regardless of platform.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_path_joins_components() {
        assert_eq!(slash_path(Path::new("g1/p1/100c.txt")), "g1/p1/100c.txt");
        assert_eq!(slash_path(Path::new("top.txt")), "top.txt");
    }
}
