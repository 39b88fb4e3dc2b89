//! The Forbidden Path.
//!
//! Scores are rules, conditional rules and frames, lower-is-better, plus
//! `waste`, which has no preferred direction: two scores with different
//! waste never dominate each other.

use serde::{Deserialize, Serialize};
use zlbb_core::{Category, Eligibility, Game, Metric, Puzzle, Value, Variant};

use crate::int_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FpScore {
    pub rules: u32,
    pub conditional_rules: u32,
    pub frames: u32,
    pub waste: u32,
}

impl FpScore {
    pub fn new(rules: u32, conditional_rules: u32, frames: u32, waste: u32) -> Self {
        Self {
            rules,
            conditional_rules,
            frames,
            waste,
        }
    }
}

pub static RULES: Metric<FpScore> =
    Metric::directional("rules", "Rules", "R", |s: &FpScore| Value::from(s.rules));
pub static CONDITIONAL_RULES: Metric<FpScore> =
    Metric::directional("conditional_rules", "Conditional rules", "C", |s: &FpScore| {
        Value::from(s.conditional_rules)
    });
pub static FRAMES: Metric<FpScore> =
    Metric::directional("frames", "Frames", "F", |s: &FpScore| Value::from(s.frames));
pub static WASTE: Metric<FpScore> =
    Metric::undirected("waste", "Waste", "W", |s: &FpScore| Value::from(s.waste));

static METRICS: &[&Metric<FpScore>] = &[&RULES, &CONDITIONAL_RULES, &FRAMES, &WASTE];

const STANDARD: &[Variant] = &[Variant::STANDARD];

macro_rules! category {
    ($id:literal, [$($metric:expr),+]) => {
        Category {
            id: $id,
            display_name: $id,
            metrics: &[$(&$metric),+],
            eligibility: Eligibility::Any,
            variants: STANDARD,
        }
    };
}

pub static RCF: Category<FpScore> = category!("RCF", [RULES, CONDITIONAL_RULES, FRAMES]);
pub static RFC: Category<FpScore> = category!("RFC", [RULES, FRAMES, CONDITIONAL_RULES]);
pub static CRF: Category<FpScore> = category!("CRF", [CONDITIONAL_RULES, RULES, FRAMES]);
pub static CFR: Category<FpScore> = category!("CFR", [CONDITIONAL_RULES, FRAMES, RULES]);
pub static FRC: Category<FpScore> = category!("FRC", [FRAMES, RULES, CONDITIONAL_RULES]);
pub static FCR: Category<FpScore> = category!("FCR", [FRAMES, CONDITIONAL_RULES, RULES]);

static CATEGORIES: &[&Category<FpScore>] = &[&RCF, &RFC, &CRF, &CFR, &FRC, &FCR];

static LAYOUT: &[&[&Category<FpScore>]] = &[&[&RCF, &CRF, &FRC], &[&RFC, &CFR, &FCR]];

static PUZZLES: &[Puzzle] = &[
    Puzzle::new("1-1", "Threshold", "volume-1", Variant::STANDARD),
    Puzzle::new("1-2", "Split Paths", "volume-1", Variant::STANDARD),
    Puzzle::new("1-3", "Crossing", "volume-1", Variant::STANDARD),
    Puzzle::new("2-1", "Mirror Hall", "volume-2", Variant::STANDARD),
    Puzzle::new("2-2", "The Sealed Door", "volume-2", Variant::STANDARD),
];

/// Registry of The Forbidden Path.
pub struct ForbiddenPath;

impl Game for ForbiddenPath {
    type Score = FpScore;

    const ID: &'static str = "forbidden-path";
    const DISPLAY_NAME: &'static str = "The Forbidden Path";

    fn metrics() -> &'static [&'static Metric<FpScore>] {
        METRICS
    }

    fn categories() -> &'static [&'static Category<FpScore>] {
        CATEGORIES
    }

    fn puzzles() -> &'static [Puzzle] {
        PUZZLES
    }

    fn leaderboard_layout() -> &'static [&'static [&'static Category<FpScore>]] {
        LAYOUT
    }

    fn score_from_values(values: &[Value]) -> Option<FpScore> {
        match values {
            [rules, conditional_rules, frames, waste] => Some(FpScore {
                rules: int_value(rules)?,
                conditional_rules: int_value(conditional_rules)?,
                frames: int_value(frames)?,
                waste: int_value(waste)?,
            }),
            _ => None,
        }
    }
}
