//! Puzzle registry entries.

use std::fmt;

/// Variant of a puzzle, deciding which categories apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variant(pub &'static str);

impl Variant {
    pub const STANDARD: Variant = Variant("standard");
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A static puzzle of a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Puzzle {
    /// Stable identifier, also the directory name in the archive.
    pub id: &'static str,
    pub display_name: &'static str,
    /// Chapter or world the puzzle belongs to, the parent directory in the archive.
    pub group: &'static str,
    /// External page describing the puzzle.
    pub link: Option<&'static str>,
    pub variant: Variant,
}

impl Puzzle {
    pub const fn new(
        id: &'static str,
        display_name: &'static str,
        group: &'static str,
        variant: Variant,
    ) -> Self {
        Self {
            id,
            display_name,
            group,
            link: None,
            variant,
        }
    }

    #[must_use]
    pub const fn with_link(mut self, link: &'static str) -> Self {
        self.link = Some(link);
        self
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}
