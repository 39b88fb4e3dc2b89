//! Configuration for the git-backed archive.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the archive lives and how commits are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Local checkout of the leaderboard repository.
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: PathBuf,

    /// Remote to clone from and push to. Without one the archive is a local
    /// repository and pushing does nothing.
    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Whether commits are pushed to the remote.
    #[serde(default = "default_push")]
    pub push: bool,

    #[serde(default = "default_committer_name")]
    pub committer_name: String,

    #[serde(default = "default_committer_email")]
    pub committer_email: String,

    /// Base URL of raw file links, e.g. a raw.githubusercontent.com branch
    /// root. Defaults to a `file://` URL of the checkout.
    #[serde(default)]
    pub raw_link_base: Option<String>,
}

fn default_checkout_dir() -> PathBuf {
    zlbb_paths::data_dir().join("archive")
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_push() -> bool {
    true
}

fn default_committer_name() -> String {
    "zlbb".to_string()
}

fn default_committer_email() -> String {
    "zlbb@localhost".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            checkout_dir: default_checkout_dir(),
            remote: None,
            branch: default_branch(),
            push: default_push(),
            committer_name: default_committer_name(),
            committer_email: default_committer_email(),
            raw_link_base: None,
        }
    }
}

impl ArchiveConfig {
    /// Defaults for one game, checked out under the zlbb data directory.
    pub fn for_game(game_id: &str) -> Self {
        Self::default().with_checkout_dir(zlbb_paths::checkout_dir(game_id))
    }

    /// Reads a TOML file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn with_checkout_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkout_dir = path.into();
        self
    }

    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    #[must_use]
    pub fn with_push(mut self, push: bool) -> Self {
        self.push = push;
        self
    }

    #[must_use]
    pub fn with_raw_link_base(mut self, base: impl Into<String>) -> Self {
        self.raw_link_base = Some(base.into());
        self
    }

    /// Base of public file links, without a trailing slash.
    pub fn link_base(&self) -> String {
        match &self.raw_link_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("file://{}", self.checkout_dir.display()),
        }
    }

    /// Whether commits leave the machine.
    pub fn pushes(&self) -> bool {
        self.push && self.remote.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = ArchiveConfig::default();

        assert_eq!(config.branch, "master");
        assert!(config.push);
        assert!(config.remote.is_none());
        assert!(!config.pushes());
        assert!(config.checkout_dir.ends_with("zlbb/archive"));
    }

    #[test]
    fn config_builder_pattern() {
        let config = ArchiveConfig::for_game("infinifactory")
            .with_remote("https://example.com/lb.git")
            .with_branch("main")
            .with_raw_link_base("https://raw.example.com/lb/main/");

        assert!(config.checkout_dir.ends_with("zlbb/infinifactory"));
        assert!(config.pushes());
        assert_eq!(config.branch, "main");
        assert_eq!(config.link_base(), "https://raw.example.com/lb/main");
    }

    #[test]
    fn link_base_defaults_to_checkout() {
        let config = ArchiveConfig::default().with_checkout_dir("/srv/lb");
        assert_eq!(config.link_base(), "file:///srv/lb");
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.toml");
        std::fs::write(
            &path,
            "checkout_dir = \"/srv/lb\"\nremote = \"git@example.com:lb.git\"\npush = false\n",
        )
        .unwrap();

        let config = ArchiveConfig::load(&path).unwrap();

        assert_eq!(config.checkout_dir, PathBuf::from("/srv/lb"));
        assert_eq!(config.branch, "master");
        assert!(!config.pushes());
    }

    #[test]
    fn load_reports_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.toml");
        std::fs::write(&path, "push = \"sometimes\"").unwrap();

        let err = ArchiveConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
