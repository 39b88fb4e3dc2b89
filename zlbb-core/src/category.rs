//! Categories: named total orders over the eligible scores of a puzzle.

use std::cmp::Ordering;
use std::fmt;

use crate::metric::Metric;
use crate::puzzle::Variant;

/// Condition a score must satisfy to compete in a category.
pub enum Eligibility<S: 'static> {
    /// Every score is eligible.
    Any,
    /// Eligible unless the given flag is raised.
    Unless(&'static Metric<S>),
    /// Eligible when the predicate holds.
    Predicate(fn(&S) -> bool),
}

impl<S> Eligibility<S> {
    pub fn allows(&self, score: &S) -> bool {
        match self {
            Eligibility::Any => true,
            Eligibility::Unless(flag) => !flag.is_raised(score),
            Eligibility::Predicate(predicate) => predicate(score),
        }
    }
}

/// Static descriptor of a category.
pub struct Category<S: 'static> {
    /// Stable identifier, unique within a game.
    pub id: &'static str,
    pub display_name: &'static str,
    /// Priority order of the comparator, first metric is the primary key.
    pub metrics: &'static [&'static Metric<S>],
    pub eligibility: Eligibility<S>,
    /// Puzzle variants this category applies to.
    pub variants: &'static [Variant],
}

impl<S> Category<S> {
    pub fn supports_score(&self, score: &S) -> bool {
        self.eligibility.allows(score)
    }

    pub fn supports_variant(&self, variant: Variant) -> bool {
        self.variants.contains(&variant)
    }

    /// Lexicographic comparison over [`Category::metrics`]. `Less` means `a` ranks better.
    pub fn compare(&self, a: &S, b: &S) -> Ordering {
        compare_by(self.metrics, a, b)
    }

    /// The metric this category is primarily sorted by.
    pub fn primary_metric(&self) -> Option<&'static Metric<S>> {
        self.metrics.first().copied()
    }

    /// Categories sharing a primary metric form a family: only one member of
    /// a family can hold the top value of that metric at a time.
    pub fn family_id(&self) -> Option<&'static str> {
        self.primary_metric().map(|m| m.id)
    }
}

impl<S> PartialEq for Category<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Category<S> {}

impl<S> fmt::Debug for Category<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Category")
            .field("id", &self.id)
            .field("metrics", &self.metrics.iter().map(|m| m.id).collect::<Vec<_>>())
            .finish()
    }
}

/// Compares two scores metric by metric and returns the first non-equal result.
pub fn compare_by<S>(metrics: &[&Metric<S>], a: &S, b: &S) -> Ordering {
    metrics
        .iter()
        .map(|metric| metric.compare(a, b))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Builds a lexicographic comparator over `metrics`, in priority order.
pub fn build_comparator<S>(
    metrics: &'static [&'static Metric<S>],
) -> impl Fn(&S, &S) -> Ordering + Send + Sync + Copy {
    move |a, b| compare_by(metrics, a, b)
}
