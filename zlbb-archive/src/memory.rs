//! In-memory archive store for testing.
//!
//! Commits replace the visible tree atomically. Pushes only count, since
//! there is no remote. Both can be made to fail once to exercise rollback
//! paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::warn;

use crate::error::{Error, Result};
use crate::store::{ArchiveStore, Snapshot, WriteSession};

type Tree = BTreeMap<PathBuf, String>;

/// In-memory implementation of [`ArchiveStore`].
#[derive(Default)]
pub struct MemoryArchiveStore {
    /// Last committed tree
    head: RwLock<Arc<Tree>>,
    /// Last pushed tree
    pushed: RwLock<Arc<Tree>>,
    writer: Mutex<()>,
    messages: Mutex<Vec<String>>,
    commits: AtomicUsize,
    pushes: AtomicUsize,
    fail_next_commit: AtomicBool,
    fail_next_push: AtomicBool,
}

impl MemoryArchiveStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose initial, already pushed state holds `files`.
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<PathBuf>,
        C: Into<String>,
    {
        let tree: Arc<Tree> = Arc::new(
            files
                .into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        );
        Self {
            head: RwLock::new(Arc::clone(&tree)),
            pushed: RwLock::new(tree),
            ..Self::default()
        }
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of successful pushes.
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Messages of successful commits, oldest first.
    pub fn commit_messages(&self) -> Result<Vec<String>> {
        Ok(self.messages.lock()?.clone())
    }

    /// The tree as last pushed.
    pub fn pushed_files(&self) -> Result<BTreeMap<PathBuf, String>> {
        Ok((**self.pushed.read()?).clone())
    }

    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_push(&self) {
        self.fail_next_push.store(true, Ordering::SeqCst);
    }
}

impl ArchiveStore for MemoryArchiveStore {
    type Snapshot = MemorySnapshot;
    type Session<'a> = MemorySession<'a>;

    fn snapshot(&self) -> Result<MemorySnapshot> {
        Ok(MemorySnapshot {
            tree: Arc::clone(&*self.head.read()?),
        })
    }

    fn write_access(&self) -> Result<MemorySession<'_>> {
        let guard = self.writer.lock()?;
        // Pull: a previous session may have left unpushed commits behind.
        let pushed = Arc::clone(&*self.pushed.read()?);
        *self.head.write()? = Arc::clone(&pushed);
        Ok(MemorySession {
            store: self,
            _guard: guard,
            working: (*pushed).clone(),
            base: pushed,
            unpushed: 0,
        })
    }

    fn raw_link(&self, path: &Path) -> String {
        format!("memory:///{}", crate::store::slash_path(path))
    }
}

/// Immutable view of a committed tree.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    tree: Arc<Tree>,
}

impl Snapshot for MemorySnapshot {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(list_tree(&self.tree, dir))
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.tree.get(path).cloned())
    }
}

/// Write session over a [`MemoryArchiveStore`].
pub struct MemorySession<'a> {
    store: &'a MemoryArchiveStore,
    _guard: MutexGuard<'a, ()>,
    /// Tree at acquisition or last push
    base: Arc<Tree>,
    working: Tree,
    unpushed: usize,
}

impl Snapshot for MemorySession<'_> {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(list_tree(&self.working, dir))
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.working.get(path).cloned())
    }
}

impl WriteSession for MemorySession<'_> {
    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.working.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.working.remove(path);
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<bool> {
        let head = Arc::clone(&*self.store.head.read()?);
        if *head == self.working {
            return Ok(false);
        }
        if self.store.fail_next_commit.swap(false, Ordering::SeqCst) {
            self.working = (*head).clone();
            return Err(Error::InvalidData("injected commit failure".to_string()));
        }

        *self.store.head.write()? = Arc::new(self.working.clone());
        self.store.messages.lock()?.push(message.to_string());
        self.store.commits.fetch_add(1, Ordering::SeqCst);
        self.unpushed += 1;
        Ok(true)
    }

    fn push(&mut self) -> Result<()> {
        if self.unpushed == 0 {
            return Ok(());
        }
        if self.store.fail_next_push.swap(false, Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("injected push failure")));
        }

        let head = Arc::clone(&*self.store.head.read()?);
        *self.store.pushed.write()? = Arc::clone(&head);
        self.base = head;
        self.unpushed = 0;
        self.store.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        *self.store.head.write()? = Arc::clone(&self.base);
        self.working = (*self.base).clone();
        if self.unpushed > 0 {
            let mut messages = self.store.messages.lock()?;
            let keep = messages.len().saturating_sub(self.unpushed);
            messages.truncate(keep);
            self.store.commits.fetch_sub(self.unpushed, Ordering::SeqCst);
        }
        self.unpushed = 0;
        Ok(())
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.push() {
            warn!(error = %e, "push on release failed");
        }
    }
}

fn list_tree(tree: &Tree, dir: &Path) -> Vec<PathBuf> {
    tree.keys()
        .filter(|path| path.parent() == Some(dir))
        .cloned()
        .collect()
}
