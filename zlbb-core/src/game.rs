//! Registry surface of a supported game.
//!
//! Adding a game means supplying its descriptor tables through [`Game`]; the
//! frontier engine and the archive are generic over it.

use std::cmp::Ordering;

use crate::category::{Category, compare_by};
use crate::error::{CoreError, Result};
use crate::metric::{Metric, Value};
use crate::puzzle::Puzzle;
use crate::score::{Score, parse_values};

/// Static metric, category and puzzle tables of one game.
pub trait Game: Send + Sync + 'static {
    type Score: Score;

    /// Stable identifier, used for directories and configuration sections.
    const ID: &'static str;
    const DISPLAY_NAME: &'static str;

    /// Every metric of the score, in display order. This list also defines
    /// dominance and the canonical archive order.
    fn metrics() -> &'static [&'static Metric<Self::Score>];

    fn categories() -> &'static [&'static Category<Self::Score>];

    fn puzzles() -> &'static [Puzzle];

    /// Rows of categories rendered per puzzle on the wiki leaderboard. Each
    /// inner slice is one row, with one column per entry.
    fn leaderboard_layout() -> &'static [&'static [&'static Category<Self::Score>]];

    /// Builds a score from one value per entry of [`Game::metrics`].
    fn score_from_values(values: &[Value]) -> Option<Self::Score>;

    /// Parses a user-supplied score such as `100/10/5`.
    fn parse_score(text: &str) -> Result<Self::Score> {
        let values = parse_values(text, Self::metrics())?;
        Self::score_from_values(&values).ok_or_else(|| CoreError::InvalidScore {
            text: text.to_string(),
            reason: "values out of range".to_string(),
        })
    }

    /// Categories applying to the variant of `puzzle`, in registry order.
    fn supported_categories(puzzle: &Puzzle) -> Vec<&'static Category<Self::Score>> {
        Self::categories()
            .iter()
            .copied()
            .filter(|c| c.supports_variant(puzzle.variant))
            .collect()
    }

    fn find_puzzle(id: &str) -> Result<&'static Puzzle> {
        Self::puzzles()
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::UnknownPuzzle(id.to_string()))
    }

    /// Looks a puzzle up by a case-insensitive fragment of its display name.
    ///
    /// An exact name match wins over fragment matches; several fragment
    /// matches are ambiguous.
    fn find_puzzle_by_name(query: &str) -> Result<&'static Puzzle> {
        let needle = query.trim().to_lowercase();
        let puzzles = Self::puzzles();
        if let Some(exact) = puzzles
            .iter()
            .find(|p| p.display_name.to_lowercase() == needle)
        {
            return Ok(exact);
        }

        let matches: Vec<&'static Puzzle> = puzzles
            .iter()
            .filter(|p| p.display_name.to_lowercase().contains(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(CoreError::UnknownPuzzle(query.to_string())),
            [single] => Ok(*single),
            many => Err(CoreError::AmbiguousPuzzle {
                query: query.to_string(),
                matches: many
                    .iter()
                    .map(|p| p.display_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn find_category(name: &str) -> Result<&'static Category<Self::Score>> {
        Self::categories()
            .iter()
            .copied()
            .find(|c| {
                c.id.eq_ignore_ascii_case(name) || c.display_name.eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| CoreError::UnknownCategory(name.to_string()))
    }

    /// Canonical archive order: lexicographic over every metric.
    fn archive_compare(a: &Self::Score, b: &Self::Score) -> Ordering {
        compare_by(Self::metrics(), a, b)
    }
}
