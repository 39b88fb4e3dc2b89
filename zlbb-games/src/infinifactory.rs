//! Infinifactory.
//!
//! Scores are cycles, footprint and blocks, all lower-is-better, plus two
//! eligibility flags: use of gravity-reversal arrows (GRA) and building out
//! of bounds. Flagged scores still compete in the plain categories.

use serde::{Deserialize, Serialize};
use zlbb_core::{Category, Eligibility, Game, Metric, Puzzle, Value, Variant};

use crate::int_value;

/// Puzzles with a restricted build area. Flag-sensitive categories other
/// than GRA do not apply to them.
pub const RESTRICTED: Variant = Variant("restricted");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IfScore {
    pub cycles: u32,
    pub footprint: u32,
    pub blocks: u32,
    #[serde(default)]
    pub gra: bool,
    #[serde(default)]
    pub out_of_bounds: bool,
}

impl IfScore {
    pub fn new(cycles: u32, footprint: u32, blocks: u32) -> Self {
        Self {
            cycles,
            footprint,
            blocks,
            gra: false,
            out_of_bounds: false,
        }
    }

    #[must_use]
    pub fn with_gra(mut self) -> Self {
        self.gra = true;
        self
    }

    #[must_use]
    pub fn with_out_of_bounds(mut self) -> Self {
        self.out_of_bounds = true;
        self
    }

    fn flagged(&self) -> bool {
        self.gra || self.out_of_bounds
    }
}

pub static CYCLES: Metric<IfScore> =
    Metric::directional("cycles", "Cycles", "c", |s: &IfScore| Value::from(s.cycles));
pub static FOOTPRINT: Metric<IfScore> =
    Metric::directional("footprint", "Footprint", "f", |s: &IfScore| {
        Value::from(s.footprint)
    });
pub static BLOCKS: Metric<IfScore> =
    Metric::directional("blocks", "Blocks", "b", |s: &IfScore| Value::from(s.blocks));
pub static GRA: Metric<IfScore> = Metric::flag("gra", "GRA", "G", |s: &IfScore| Value::from(s.gra));
pub static OUT_OF_BOUNDS: Metric<IfScore> =
    Metric::flag("out_of_bounds", "Out of bounds", "O", |s: &IfScore| {
        Value::from(s.out_of_bounds)
    });

static METRICS: &[&Metric<IfScore>] = &[&CYCLES, &FOOTPRINT, &BLOCKS, &GRA, &OUT_OF_BOUNDS];

const ALL_VARIANTS: &[Variant] = &[Variant::STANDARD, RESTRICTED];
const STANDARD_ONLY: &[Variant] = &[Variant::STANDARD];

// Struct literals keep the metric slices in static storage.
macro_rules! category {
    ($id:literal, [$($metric:expr),+], $eligibility:expr, $variants:expr $(,)?) => {
        Category {
            id: $id,
            display_name: $id,
            metrics: &[$(&$metric),+],
            eligibility: $eligibility,
            variants: $variants,
        }
    };
}

pub static CF: Category<IfScore> =
    category!("CF", [CYCLES, FOOTPRINT, BLOCKS], Eligibility::Any, ALL_VARIANTS);
pub static CB: Category<IfScore> =
    category!("CB", [CYCLES, BLOCKS, FOOTPRINT], Eligibility::Any, ALL_VARIANTS);
pub static CFNG: Category<IfScore> =
    category!("CFNG", [CYCLES, FOOTPRINT, BLOCKS], Eligibility::Unless(&GRA), ALL_VARIANTS);
pub static CBNG: Category<IfScore> =
    category!("CBNG", [CYCLES, BLOCKS, FOOTPRINT], Eligibility::Unless(&GRA), ALL_VARIANTS);
pub static FC: Category<IfScore> =
    category!("FC", [FOOTPRINT, CYCLES, BLOCKS], Eligibility::Any, ALL_VARIANTS);
pub static FB: Category<IfScore> =
    category!("FB", [FOOTPRINT, BLOCKS, CYCLES], Eligibility::Any, ALL_VARIANTS);
pub static FIC: Category<IfScore> = category!(
    "FIC",
    [FOOTPRINT, CYCLES, BLOCKS],
    Eligibility::Unless(&OUT_OF_BOUNDS),
    ALL_VARIANTS,
);
pub static FIB: Category<IfScore> = category!(
    "FIB",
    [FOOTPRINT, BLOCKS, CYCLES],
    Eligibility::Unless(&OUT_OF_BOUNDS),
    ALL_VARIANTS,
);
pub static BC: Category<IfScore> =
    category!("BC", [BLOCKS, CYCLES, FOOTPRINT], Eligibility::Any, ALL_VARIANTS);
pub static BF: Category<IfScore> =
    category!("BF", [BLOCKS, FOOTPRINT, CYCLES], Eligibility::Any, ALL_VARIANTS);
pub static BNC: Category<IfScore> = category!(
    "BNC",
    [BLOCKS, CYCLES, FOOTPRINT],
    Eligibility::Predicate(|s: &IfScore| !s.flagged()),
    STANDARD_ONLY,
);
pub static BNF: Category<IfScore> = category!(
    "BNF",
    [BLOCKS, FOOTPRINT, CYCLES],
    Eligibility::Predicate(|s: &IfScore| !s.flagged()),
    STANDARD_ONLY,
);

static CATEGORIES: &[&Category<IfScore>] =
    &[&CF, &CB, &CFNG, &CBNG, &FC, &FB, &FIC, &FIB, &BC, &BF, &BNC, &BNF];

static LAYOUT: &[&[&Category<IfScore>]] = &[&[&CF, &CFNG, &FC, &BC], &[&CB, &CBNG, &FB, &BF]];

const fn puzzle(id: &'static str, name: &'static str, group: &'static str) -> Puzzle {
    Puzzle::new(id, name, group, Variant::STANDARD)
}

static PUZZLES: &[Puzzle] = &[
    puzzle("1-1", "Training Routine 1", "training"),
    puzzle("1-2", "Training Routine 2", "training"),
    puzzle("1-3", "Training Routine 3", "training"),
    puzzle("2-1", "Belt Maintenance", "resource-processing"),
    puzzle("2-2", "Stack Loader", "resource-processing"),
    puzzle("2-3", "Component Forge", "resource-processing"),
    Puzzle::new("2-4", "Sealed Chamber", "resource-processing", RESTRICTED),
    puzzle("3-1", "Sensor Array", "defense-systems"),
    puzzle("3-2", "Turret Assembly", "defense-systems"),
];

/// Registry of Infinifactory.
pub struct Infinifactory;

impl Game for Infinifactory {
    type Score = IfScore;

    const ID: &'static str = "infinifactory";
    const DISPLAY_NAME: &'static str = "Infinifactory";

    fn metrics() -> &'static [&'static Metric<IfScore>] {
        METRICS
    }

    fn categories() -> &'static [&'static Category<IfScore>] {
        CATEGORIES
    }

    fn puzzles() -> &'static [Puzzle] {
        PUZZLES
    }

    fn leaderboard_layout() -> &'static [&'static [&'static Category<IfScore>]] {
        LAYOUT
    }

    fn score_from_values(values: &[Value]) -> Option<IfScore> {
        match values {
            [cycles, footprint, blocks, gra, oob] => Some(IfScore {
                cycles: int_value(cycles)?,
                footprint: int_value(footprint)?,
                blocks: int_value(blocks)?,
                gra: gra.as_bool()?,
                out_of_bounds: oob.as_bool()?,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zlbb_core::{StringFormat, format_score};

    #[test]
    fn parses_claimed_score_with_flags() {
        let score = Infinifactory::parse_score("100c/10f/5bGO").unwrap();
        assert_eq!(score, IfScore::new(100, 10, 5).with_gra().with_out_of_bounds());
    }

    #[test]
    fn file_name_format_keeps_flags() {
        let score = IfScore::new(100, 10, 5).with_gra();
        let name = format_score(
            &score,
            Infinifactory::metrics(),
            StringFormat::FileName,
            None,
        );
        assert_eq!(name, "100c-10f-5bG");
    }

    #[test]
    fn markdown_format_bolds_primary_metric() {
        let score = IfScore::new(100, 10, 5);
        let text = format_score(
            &score,
            Infinifactory::metrics(),
            StringFormat::Markdown,
            FC.primary_metric(),
        );
        assert_eq!(text, "100c/**10f**/5b");
    }

    #[test]
    fn restricted_puzzles_drop_flagless_block_categories() {
        let restricted = Infinifactory::find_puzzle("2-4").unwrap();
        let ids: Vec<_> = Infinifactory::supported_categories(restricted)
            .iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids.len(), 10);
        assert!(!ids.contains(&"BNC"));
        assert!(ids.contains(&"CFNG"));
    }

    #[test]
    fn flags_gate_eligibility() {
        let gra = IfScore::new(1, 1, 1).with_gra();
        let oob = IfScore::new(1, 1, 1).with_out_of_bounds();

        assert!(CF.supports_score(&gra));
        assert!(!CFNG.supports_score(&gra));
        assert!(FIC.supports_score(&gra));
        assert!(!FIC.supports_score(&oob));
        assert!(!BNC.supports_score(&gra));
        assert!(!BNC.supports_score(&oob));
        assert!(BNC.supports_score(&IfScore::new(1, 1, 1)));
    }

    #[test]
    fn layout_columns_share_families() {
        for row in Infinifactory::leaderboard_layout() {
            assert_eq!(row.len(), 4);
        }
        let first = Infinifactory::leaderboard_layout()[0];
        let second = Infinifactory::leaderboard_layout()[1];
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.family_id(), b.family_id());
        }
    }

    #[test]
    fn score_serializes_with_flags_defaulting_to_false() {
        let parsed: IfScore =
            serde_json::from_str(r#"{"cycles":3,"footprint":4,"blocks":5}"#).unwrap();
        assert_eq!(parsed, IfScore::new(3, 4, 5));
    }
}
