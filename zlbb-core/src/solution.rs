//! Solutions held by a frontier, their persisted record projection, and
//! unvalidated submissions.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::puzzle::Puzzle;

/// A solution retained in a puzzle's frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution<S> {
    pub score: S,
    pub author: String,
    /// Links supplied by the author (gifs, videos).
    pub display_links: Vec<String>,
    /// Canonicalized solution data. `None` marks a score-only placeholder.
    pub content: Option<String>,
    /// Ids of the categories this solution currently holds. Always fully
    /// recomputed by the frontier, never patched.
    pub categories: BTreeSet<&'static str>,
}

impl<S> Solution<S> {
    pub fn new(score: S, author: impl Into<String>, content: Option<String>) -> Self {
        Self {
            score,
            author: author.into(),
            display_links: Vec::new(),
            content,
            categories: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_display_link(mut self, link: impl Into<String>) -> Self {
        self.display_links.push(link.into());
        self
    }

    /// A known achievable score without downloadable data.
    pub fn is_placeholder(&self) -> bool {
        self.content.is_none()
    }

    pub fn holds(&self, category_id: &str) -> bool {
        self.categories.contains(category_id)
    }
}

impl<S: Clone> Solution<S> {
    /// Projects this solution to a record.
    ///
    /// `archive_link` and `data_path` locate the stored content file and are
    /// dropped for placeholders, which have none.
    pub fn to_record(
        &self,
        puzzle: &Puzzle,
        archive_link: Option<String>,
        data_path: Option<PathBuf>,
    ) -> Record<S> {
        let stored = !self.is_placeholder();
        Record {
            puzzle: puzzle.id,
            score: self.score.clone(),
            author: self.author.clone(),
            display_links: self.display_links.clone(),
            archive_link: archive_link.filter(|_| stored),
            data_path: data_path.filter(|_| stored),
        }
    }
}

/// Persisted projection of a winning solution, regenerated on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record<S> {
    pub puzzle: &'static str,
    pub score: S,
    pub author: String,
    pub display_links: Vec<String>,
    /// Public link to the stored content file.
    pub archive_link: Option<String>,
    /// Location of the stored content file inside the archive.
    pub data_path: Option<PathBuf>,
}

impl<S> Record<S> {
    /// The preferred link to show next to the score: the archived file if
    /// there is one, otherwise the first author-supplied link.
    pub fn link(&self) -> Option<&str> {
        self.archive_link
            .as_deref()
            .or_else(|| self.display_links.first().map(String::as_str))
    }
}

/// A record together with the categories it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord<S> {
    pub record: Record<S>,
    pub categories: BTreeSet<&'static str>,
}

/// Unvalidated external input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission<S> {
    pub puzzle: String,
    /// Score claimed by the submitter. When content is also given, the score
    /// recovered by validation must match it.
    pub claimed_score: Option<S>,
    pub author: String,
    pub display_link: Option<String>,
    pub content: Option<String>,
}

impl<S> Submission<S> {
    pub fn new(puzzle: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            puzzle: puzzle.into(),
            claimed_score: None,
            author: author.into(),
            display_link: None,
            content: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: S) -> Self {
        self.claimed_score = Some(score);
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_display_link(mut self, link: impl Into<String>) -> Self {
        self.display_link = Some(link.into());
        self
    }
}
