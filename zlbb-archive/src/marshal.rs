//! On-store representation of a frontier.
//!
//! A puzzle lives in `<group>/<puzzle id>/`. Each solution is one file named
//! after its score, holding a TOML front-matter block between `+++` lines
//! followed by the raw solution content:
//!
//! ```text
//! +++
//! author = "someone"
//! display_links = ["https://example.com/run.gif"]
//!
//! [score]
//! cycles = 100
//! footprint = 10
//! blocks = 5
//! +++
//! <solution content>
//! ```
//!
//! A placeholder has nothing after the closing `+++` line. Category
//! membership is not stored; it is recomputed when the frontier is loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zlbb_core::{ArchiveRules, Frontier, Game, Puzzle, Solution, StringFormat, format_score};

use crate::error::{Error, Result};
use crate::store::{Snapshot, WriteSession};

const DELIMITER: &str = "+++";
const EXTENSION: &str = "txt";

// Tables must follow plain values in TOML, so the score comes last.
#[derive(Serialize)]
struct HeaderRef<'a, S> {
    author: &'a str,
    display_links: &'a [String],
    score: &'a S,
}

#[derive(Deserialize)]
struct Header<S> {
    author: String,
    #[serde(default)]
    display_links: Vec<String>,
    score: S,
}

/// Directory holding the solutions of `puzzle`.
pub fn puzzle_dir(puzzle: &Puzzle) -> PathBuf {
    Path::new(puzzle.group).join(puzzle.id)
}

/// File name of a solution, derived from its score alone.
pub fn solution_file_name<G: Game>(score: &G::Score) -> String {
    let stem = format_score(score, G::metrics(), StringFormat::FileName, None);
    format!("{stem}.{EXTENSION}")
}

pub fn solution_path<G: Game>(puzzle: &Puzzle, score: &G::Score) -> PathBuf {
    puzzle_dir(puzzle).join(solution_file_name::<G>(score))
}

/// Renders a solution file.
///
/// Empty content is refused: it would read back as a placeholder.
pub fn marshal_solution<G: Game>(solution: &Solution<G::Score>) -> Result<String> {
    if solution.content.as_deref() == Some("") {
        return Err(Error::InvalidData(format!(
            "solution by {} has empty content",
            solution.author
        )));
    }
    let header = toml::to_string(&HeaderRef {
        author: &solution.author,
        display_links: &solution.display_links,
        score: &solution.score,
    })?;

    let mut text = format!("{DELIMITER}\n{header}{DELIMITER}\n");
    if let Some(content) = &solution.content {
        text.push_str(content);
    }
    Ok(text)
}

/// Parses a solution file. `path` is only used in error messages.
///
/// An empty body parses as a placeholder.
pub fn unmarshal_solution<G: Game>(path: &Path, text: &str) -> Result<Solution<G::Score>> {
    let invalid = |reason: &str| Error::Unmarshal {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let (header, body) =
        split_front_matter(text).ok_or_else(|| invalid("missing +++ front matter"))?;
    let header: Header<G::Score> =
        toml::from_str(header).map_err(|e| invalid(&e.to_string()))?;

    let mut solution = Solution::new(
        header.score,
        header.author,
        (!body.is_empty()).then(|| body.to_string()),
    );
    solution.display_links = header.display_links;
    Ok(solution)
}

fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(DELIMITER)?.strip_prefix('\n')?;
    let mut offset = 0;
    loop {
        let end = offset + rest[offset..].find(DELIMITER)?;
        let at_line_start = end == 0 || rest.as_bytes()[end - 1] == b'\n';
        let after = &rest[end + DELIMITER.len()..];
        if at_line_start {
            if after.is_empty() {
                return Some((&rest[..end], after));
            }
            if let Some(body) = after.strip_prefix('\n') {
                return Some((&rest[..end], body));
            }
        }
        offset = end + DELIMITER.len();
    }
}

/// Reads the frontier of `puzzle` from a snapshot or session.
///
/// Every solution file is reparsed and categories are recomputed. A file
/// whose name does not match its embedded score is rejected.
pub fn read_frontier<G: Game>(
    snapshot: &impl Snapshot,
    puzzle: &Puzzle,
    rules: &ArchiveRules<'_, G::Score>,
) -> Result<Frontier<G::Score>> {
    let dir = puzzle_dir(puzzle);
    let mut solutions = Vec::new();
    for path in snapshot.list(&dir)? {
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        let Some(text) = snapshot.read(&path)? else {
            continue;
        };
        let solution = unmarshal_solution::<G>(&path, &text)?;
        let expected = solution_file_name::<G>(&solution.score);
        if path.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
            return Err(Error::InvalidData(format!(
                "{} holds a score that belongs in {expected}",
                path.display()
            )));
        }
        solutions.push(solution);
    }

    debug!(puzzle = %puzzle.id, solutions = solutions.len(), "read frontier");
    Ok(Frontier::from_solutions(solutions, rules))
}

/// Stages the files of `next` in place of those of `previous`.
///
/// Files of solutions that left the frontier are removed; files whose
/// contents changed are rewritten. Nothing is committed.
pub fn write_frontier<G: Game>(
    session: &mut impl WriteSession,
    puzzle: &Puzzle,
    previous: &Frontier<G::Score>,
    next: &Frontier<G::Score>,
) -> Result<()> {
    for gone in previous
        .solutions()
        .iter()
        .filter(|s| next.get(&s.score).is_none())
    {
        session.remove(&solution_path::<G>(puzzle, &gone.score))?;
    }

    for solution in next.solutions() {
        let path = solution_path::<G>(puzzle, &solution.score);
        let text = marshal_solution::<G>(solution)?;
        if session.read(&path)?.as_deref() != Some(text.as_str()) {
            session.write(&path, &text)?;
        }
    }
    Ok(())
}
