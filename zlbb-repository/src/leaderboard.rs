//! Wiki leaderboard rendering and publishing.
//!
//! Every puzzle owns a block of table rows on an externally hosted page. The
//! first row starts with the puzzle's name and carries one cell per column of
//! [`Game::leaderboard_layout`]; later rows only repeat a column when its
//! category is held by a different record than the first row's.
//!
//! ```text
//! | [Training Routine 1](link) | [(**100c**/10f/5b)](a) | ... |
//! |  | [(**101c**/10f/4b)](b) |  | ... |
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};
use zlbb_core::{Category, Game, Puzzle, Record, StringFormat, format_score};

use crate::error::PublishError;

/// Externally hosted page holding the leaderboard.
pub trait WikiPage: Send + Sync {
    fn fetch(&self) -> Result<String, PublishError>;

    fn update(&self, text: &str, message: &str) -> Result<(), PublishError>;
}

/// In-memory [`WikiPage`] for tests.
#[derive(Debug, Default)]
pub struct MemoryWikiPage {
    text: Mutex<String>,
    messages: Mutex<Vec<String>>,
    fail_next_update: AtomicBool,
}

impl MemoryWikiPage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            ..Self::default()
        }
    }

    /// Current page text.
    pub fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Messages of every successful update, oldest first.
    pub fn update_messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }
}

impl WikiPage for MemoryWikiPage {
    fn fetch(&self) -> Result<String, PublishError> {
        self.text.lock().map(|t| t.clone()).map_err(poisoned)
    }

    fn update(&self, text: &str, message: &str) -> Result<(), PublishError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(PublishError::Unavailable("injected update failure".to_string()));
        }
        *self.text.lock().map_err(poisoned)? = text.to_string();
        self.messages.lock().map_err(poisoned)?.push(message.to_string());
        Ok(())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PublishError {
    PublishError::Unavailable("page lock poisoned".to_string())
}

fn render_cell<G: Game>(category: &Category<G::Score>, record: &Record<G::Score>) -> String {
    let score = format_score(
        &record.score,
        G::metrics(),
        StringFormat::Markdown,
        category.primary_metric(),
    );
    match record.link() {
        Some(link) => format!("[({score})]({link})"),
        None => score,
    }
}

/// Renders the leaderboard block of `puzzle`.
///
/// `holders` maps category ids to the record holding them; a category
/// without a holder renders as an empty cell.
pub fn render_block<G: Game>(
    puzzle: &Puzzle,
    holders: &BTreeMap<&str, Record<G::Score>>,
) -> String {
    let layout = G::leaderboard_layout();
    let Some(first_row) = layout.first() else {
        return String::new();
    };

    let mut lines = Vec::with_capacity(layout.len());
    for (row_index, row) in layout.iter().enumerate() {
        let mut line = String::from("| ");
        if row_index == 0 {
            match puzzle.link {
                Some(link) => line.push_str(&format!("[{}]({link})", puzzle.display_name)),
                None => line.push_str(puzzle.display_name),
            }
        }

        let mut useful = row_index == 0;
        for (column, category) in row.iter().enumerate() {
            line.push_str(" | ");
            let record = holders.get(category.id);
            let above = first_row.get(column).and_then(|c| holders.get(c.id));
            if row_index > 0 && record == above {
                continue;
            }
            if let Some(record) = record {
                line.push_str(&render_cell::<G>(category, record));
                useful = true;
            }
        }

        if useful {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Whether `line` opens the block of the puzzle called `display_name`.
fn opens_block(line: &str, display_name: &str) -> bool {
    let Some(rest) = line.strip_prefix("| ") else {
        return false;
    };
    let rest = rest.strip_prefix('[').unwrap_or(rest);
    rest.strip_prefix(display_name)
        .is_some_and(|after| after.is_empty() || after.starts_with([']', ' ', '|']))
}

/// Replaces the block of `display_name` in `page` with `block`.
///
/// The block spans from its opening line up to, not including, the next
/// blank line or lone `|` line. A page without the block is returned as is.
pub fn replace_block(page: &str, display_name: &str, block: &str) -> String {
    let lines: Vec<&str> = page.split('\n').collect();
    let Some(start) = lines
        .iter()
        .position(|line| opens_block(line.trim_end_matches('\r'), display_name))
    else {
        warn!(puzzle = %display_name, "no leaderboard block found on the page");
        return page.to_string();
    };

    let end = lines[start + 1..]
        .iter()
        .map(|line| line.trim_end_matches('\r'))
        .position(|line| line.trim().is_empty() || line == "|")
        .map_or(lines.len(), |offset| start + 1 + offset);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..start]);
    out.extend(block.split('\n'));
    out.extend_from_slice(&lines[end..]);
    out.join("\n")
}

/// Publishes rendered blocks to a [`WikiPage`].
pub struct LeaderboardPublisher<G> {
    page: Arc<dyn WikiPage>,
    _game: PhantomData<fn() -> G>,
}

impl<G: Game> LeaderboardPublisher<G> {
    pub fn new(page: Arc<dyn WikiPage>) -> Self {
        Self {
            page,
            _game: PhantomData,
        }
    }

    /// Re-renders the block of `puzzle` and updates the page if it changed.
    ///
    /// Returns whether the page was updated.
    #[instrument(skip_all, fields(puzzle = %puzzle.id), level = "debug")]
    pub fn publish(
        &self,
        puzzle: &Puzzle,
        holders: &BTreeMap<&str, Record<G::Score>>,
        message: &str,
    ) -> Result<bool, PublishError> {
        let block = render_block::<G>(puzzle, holders);
        let page = self.page.fetch()?;
        let updated = replace_block(&page, puzzle.display_name, &block);
        if updated == page {
            debug!("leaderboard unchanged");
            return Ok(false);
        }

        self.page.update(&updated, message)?;
        info!(puzzle = %puzzle.id, "leaderboard updated");
        Ok(true)
    }
}
