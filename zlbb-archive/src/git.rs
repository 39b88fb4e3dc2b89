//! Git-backed archive store.
//!
//! Shells out to the `git` binary. The writer works in the checkout's
//! working tree; snapshots pin a commit id and read through the object
//! database, so they never block on or observe an in-flight session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use tracing::{debug, info, instrument, warn};

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use crate::store::{ArchiveStore, Snapshot, WriteSession, slash_path};

fn run(repo: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new("git").arg("-C").arg(repo).args(args).output()?)
}

fn failed(args: &[&str], output: &Output) -> Error {
    Error::Git {
        command: args.join(" "),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Runs `git -C <repo> <args>` and returns its stdout.
fn git(repo: &Path, args: &[&str]) -> Result<String> {
    let output = run(repo, args)?;
    if !output.status.success() {
        return Err(failed(args, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Commit id of `HEAD`, or `None` while `HEAD` is unborn.
///
/// `rev-parse --verify -q` exits 1 without a message only when the ref does
/// not resolve; a broken repository fails loudly and is reported.
fn head(repo: &Path) -> Result<Option<String>> {
    let args = ["rev-parse", "--verify", "-q", "HEAD"];
    let output = run(repo, &args)?;
    if output.status.success() {
        let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return Ok(Some(rev));
    }
    if output.status.code() == Some(1) && output.stderr.is_empty() {
        return Ok(None);
    }
    Err(failed(&args, &output))
}

/// Writer locks shared by every store opened on the same checkout.
fn writer_lock(checkout: &Path) -> Result<Arc<Mutex<()>>> {
    static WRITERS: OnceLock<Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>> = OnceLock::new();

    let key = std::fs::canonicalize(checkout)?;
    let mut writers = WRITERS.get_or_init(Default::default).lock()?;
    writers.retain(|_, lock| lock.strong_count() > 0);
    if let Some(lock) = writers.get(&key).and_then(Weak::upgrade) {
        return Ok(lock);
    }
    let lock = Arc::new(Mutex::new(()));
    writers.insert(key, Arc::downgrade(&lock));
    Ok(lock)
}

/// Archive stored in a git repository.
///
/// Stores opened on the same checkout within one process share a single
/// writer lock.
pub struct GitArchiveStore {
    config: ArchiveConfig,
    writer: Arc<Mutex<()>>,
}

impl GitArchiveStore {
    /// Opens the checkout, cloning the remote or initializing an empty
    /// repository if it does not exist yet.
    #[instrument(skip(config), fields(checkout = %config.checkout_dir.display()))]
    pub fn open(config: ArchiveConfig) -> Result<Self> {
        let repo = &config.checkout_dir;
        if !repo.join(".git").exists() {
            std::fs::create_dir_all(repo)?;
            match &config.remote {
                Some(remote) => {
                    info!(%remote, "cloning archive");
                    git(
                        repo,
                        &["clone", "-q", "--branch", &config.branch, remote, "."],
                    )?;
                }
                None => {
                    info!("initializing local archive");
                    git(repo, &["init", "-q", "-b", &config.branch])?;
                }
            }
        }

        let writer = writer_lock(repo)?;
        Ok(Self { config, writer })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    fn repo(&self) -> &Path {
        &self.config.checkout_dir
    }

    /// Brings the working tree to the state of the store of record. Local
    /// commits that never made it to the remote are dropped.
    fn sync(&self) -> Result<()> {
        let repo = self.repo();
        if head(repo)?.is_some() {
            git(repo, &["reset", "-q", "--hard", "HEAD"])?;
        }
        git(repo, &["clean", "-q", "-fd"])?;

        if self.config.remote.is_some() {
            let upstream = format!("origin/{}", self.config.branch);
            git(repo, &["fetch", "-q", "origin", &self.config.branch])?;
            git(repo, &["reset", "-q", "--hard", &upstream])?;
        }
        Ok(())
    }
}

impl ArchiveStore for GitArchiveStore {
    type Snapshot = GitSnapshot;
    type Session<'a> = GitSession<'a>;

    fn snapshot(&self) -> Result<GitSnapshot> {
        Ok(GitSnapshot {
            repo: self.repo().to_path_buf(),
            rev: head(self.repo())?,
        })
    }

    #[instrument(skip(self), level = "debug")]
    fn write_access(&self) -> Result<GitSession<'_>> {
        let guard = self.writer.lock()?;
        self.sync()?;
        debug!("write access acquired");
        Ok(GitSession {
            store: self,
            _guard: guard,
            base: head(self.repo())?,
            unpushed: false,
        })
    }

    fn raw_link(&self, path: &Path) -> String {
        format!("{}/{}", self.config.link_base(), slash_path(path))
    }
}

/// Committed tree at a fixed commit.
#[derive(Debug, Clone)]
pub struct GitSnapshot {
    repo: PathBuf,
    rev: Option<String>,
}

impl GitSnapshot {
    /// Commit the snapshot reads from.
    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }
}

impl Snapshot for GitSnapshot {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let Some(rev) = &self.rev else {
            return Ok(Vec::new());
        };
        let prefix = format!("{}/", slash_path(dir));
        let listing = git(&self.repo, &["ls-tree", rev, "--", &prefix])?;

        // Lines read "<mode> <type> <object>\t<path>".
        let mut files: Vec<PathBuf> = listing
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .filter(|(meta, _)| meta.split_whitespace().nth(1) == Some("blob"))
            .map(|(_, path)| PathBuf::from(path))
            .collect();
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        let Some(rev) = &self.rev else {
            return Ok(None);
        };
        let path = slash_path(path);
        let entry = git(&self.repo, &["ls-tree", rev, "--", &path])?;
        // Absent or not a file; a failing lookup is an error.
        if entry.split_whitespace().nth(1) != Some("blob") {
            return Ok(None);
        }
        let object = format!("{rev}:{path}");
        git(&self.repo, &["cat-file", "blob", &object]).map(Some)
    }
}

/// Write session over a git checkout.
pub struct GitSession<'a> {
    store: &'a GitArchiveStore,
    _guard: MutexGuard<'a, ()>,
    /// Commit at acquisition or last push
    base: Option<String>,
    unpushed: bool,
}

impl GitSession<'_> {
    fn repo(&self) -> &Path {
        self.store.repo()
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.repo().join(path)
    }

    /// Resets the working tree and index to `rev`, or empties them.
    fn reset_to(&self, rev: Option<&str>) -> Result<()> {
        let repo = self.repo();
        match rev {
            Some(rev) => {
                git(repo, &["reset", "-q", "--hard", rev])?;
            }
            None => {
                if head(repo)?.is_some() {
                    git(repo, &["update-ref", "-d", "HEAD"])?;
                }
                git(repo, &["read-tree", "--empty"])?;
            }
        }
        git(repo, &["clean", "-q", "-fd"])?;
        Ok(())
    }
}

impl Snapshot for GitSession<'_> {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(self.full_path(dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(dir.join(entry.file_name()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(self.full_path(path)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl WriteSession for GitSession<'_> {
    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, contents)?;
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        match std::fs::remove_file(self.full_path(path)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self), level = "debug")]
    fn commit(&mut self, message: &str) -> Result<bool> {
        let config = &self.store.config;
        let name = format!("user.name={}", config.committer_name);
        let email = format!("user.email={}", config.committer_email);

        let result = git(self.repo(), &["add", "-A", "--", "."]).and_then(|_| {
            let status = git(self.repo(), &["status", "--porcelain"])?;
            if status.trim().is_empty() {
                return Ok(false);
            }
            git(
                self.repo(),
                &[
                    "-c",
                    &name,
                    "-c",
                    &email,
                    "-c",
                    "commit.gpgsign=false",
                    "commit",
                    "-q",
                    "-m",
                    message,
                ],
            )?;
            Ok(true)
        });

        match result {
            Ok(committed) => {
                self.unpushed |= committed;
                Ok(committed)
            }
            Err(e) => {
                // Without a readable HEAD the checkout is left alone.
                let reset = head(self.repo()).and_then(|last| self.reset_to(last.as_deref()));
                if let Err(reset) = reset {
                    warn!(error = %reset, "reset after failed commit failed");
                }
                Err(e)
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    fn push(&mut self) -> Result<()> {
        if !self.unpushed {
            return Ok(());
        }
        let config = &self.store.config;
        if config.pushes() {
            git(self.repo(), &["push", "-q", "origin", &config.branch])?;
            info!(branch = %config.branch, "pushed archive");
        }
        self.base = head(self.repo())?;
        self.unpushed = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let base = self.base.clone();
        self.reset_to(base.as_deref())?;
        self.unpushed = false;
        Ok(())
    }
}

impl Drop for GitSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.push() {
            warn!(error = %e, "push on release failed");
        }
    }
}
