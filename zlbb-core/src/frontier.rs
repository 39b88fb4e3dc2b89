//! Pareto frontier maintenance.
//!
//! A [`Frontier`] holds the solutions of one puzzle such that no member
//! dominates another. [`Frontier::insert`] never mutates the frontier it is
//! called on: it returns the staged next state, which the caller swaps in
//! once persistence succeeded. Dropping the staged state is the rollback.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use crate::category::{Category, compare_by};
use crate::metric::{Metric, MetricRole};
use crate::score::Score;
use crate::solution::Solution;

/// Outcome of comparing two distinct scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// The first score is no worse anywhere and better somewhere.
    Dominates,
    /// The second score dominates the first.
    DominatedBy,
    Incomparable,
}

/// Dominance between two scores of the same puzzle.
///
/// Every undirected metric must be equal for the scores to be comparable at
/// all. Directional metrics and flags are compared by their preference.
///
/// Two equal scores report [`Dominance::Dominates`]: the arithmetic cannot
/// tell "equal" from "weakly better". Callers must intercept equality before
/// asking, as [`Frontier::insert`] does with its duplicate check.
pub fn dominance<S>(a: &S, b: &S, metrics: &[&Metric<S>]) -> Dominance {
    let mut a_worse = false;
    let mut b_worse = false;
    for metric in metrics {
        match metric.role {
            MetricRole::Undirected => {
                if metric.value(a) != metric.value(b) {
                    return Dominance::Incomparable;
                }
            }
            MetricRole::Directional | MetricRole::Flag => match metric.compare(a, b) {
                Ordering::Less => b_worse = true,
                Ordering::Greater => a_worse = true,
                Ordering::Equal => {}
            },
        }
    }

    match (a_worse, b_worse) {
        (false, _) => Dominance::Dominates,
        (true, false) => Dominance::DominatedBy,
        (true, true) => Dominance::Incomparable,
    }
}

/// What to do with a candidate whose score is already in the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateResolution {
    /// Keep the existing entry, report the candidate as a duplicate.
    Reject,
    /// Replace the existing entry in place with the candidate.
    Upgrade,
}

/// Pluggable "already present" rule, consulted only for equal scores.
pub trait DuplicatePolicy<S>: Send + Sync {
    fn resolve(&self, candidate: &Solution<S>, existing: &Solution<S>) -> DuplicateResolution;
}

/// Upgrades an equal-score entry when the candidate brings something it lacks.
///
/// - a placeholder is upgraded by a candidate with content;
/// - an entry without display links is upgraded by a candidate with one;
/// - an author may replace their own entry with different content.
///
/// Anything else is a duplicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDuplicatePolicy;

impl<S> DuplicatePolicy<S> for DefaultDuplicatePolicy {
    fn resolve(&self, candidate: &Solution<S>, existing: &Solution<S>) -> DuplicateResolution {
        let fills_placeholder = existing.is_placeholder() && !candidate.is_placeholder();
        let adds_link = existing.display_links.is_empty() && !candidate.display_links.is_empty();
        let refreshes_own = candidate.author == existing.author
            && candidate.content.is_some()
            && candidate.content != existing.content;

        if fills_placeholder || adds_link || refreshes_own {
            DuplicateResolution::Upgrade
        } else {
            DuplicateResolution::Reject
        }
    }
}

/// Everything the frontier needs to know about a puzzle to maintain it.
pub struct ArchiveRules<'a, S: 'static> {
    /// Dominance metrics, also the canonical archive order.
    pub metrics: &'a [&'static Metric<S>],
    /// Categories supported by the puzzle.
    pub categories: &'a [&'static Category<S>],
    pub policy: &'a dyn DuplicatePolicy<S>,
}

impl<'a, S> ArchiveRules<'a, S> {
    pub fn new(
        metrics: &'a [&'static Metric<S>],
        categories: &'a [&'static Category<S>],
        policy: &'a dyn DuplicatePolicy<S>,
    ) -> Self {
        Self {
            metrics,
            categories,
            policy,
        }
    }
}

/// Staged result of [`Frontier::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<S> {
    /// The candidate entered the frontier, evicting what it dominates.
    Accepted {
        frontier: Frontier<S>,
        accepted: Solution<S>,
        evicted: Vec<Solution<S>>,
    },
    /// An entry with the same score was replaced in place.
    Upgraded {
        frontier: Frontier<S>,
        accepted: Solution<S>,
        replaced: Solution<S>,
    },
    /// The same score is already present and the candidate adds nothing.
    Duplicate { existing: Solution<S> },
    /// At least one member dominates the candidate.
    Dominated { by: Vec<Solution<S>> },
}

impl<S> Insertion<S> {
    /// The staged frontier, if the insertion changes anything.
    pub fn frontier(&self) -> Option<&Frontier<S>> {
        match self {
            Insertion::Accepted { frontier, .. } | Insertion::Upgraded { frontier, .. } => {
                Some(frontier)
            }
            Insertion::Duplicate { .. } | Insertion::Dominated { .. } => None,
        }
    }

    /// The candidate as stored in the staged frontier, with its categories.
    pub fn accepted(&self) -> Option<&Solution<S>> {
        match self {
            Insertion::Accepted { accepted, .. } | Insertion::Upgraded { accepted, .. } => {
                Some(accepted)
            }
            Insertion::Duplicate { .. } | Insertion::Dominated { .. } => None,
        }
    }

    /// Entries that leave the frontier when the staged state is committed.
    pub fn removed(&self) -> Vec<&Solution<S>> {
        match self {
            Insertion::Accepted { evicted, .. } => evicted.iter().collect(),
            Insertion::Upgraded { replaced, .. } => vec![replaced],
            Insertion::Duplicate { .. } | Insertion::Dominated { .. } => Vec::new(),
        }
    }
}

/// The mutually non-dominating solutions of one puzzle, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontier<S> {
    solutions: Vec<Solution<S>>,
}

impl<S> Default for Frontier<S> {
    fn default() -> Self {
        Self {
            solutions: Vec::new(),
        }
    }
}

impl<S: Score> Frontier<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a frontier from stored solutions.
    ///
    /// Solutions are put in canonical order and category membership is
    /// recomputed; whatever categories the input carried are discarded.
    pub fn from_solutions(mut solutions: Vec<Solution<S>>, rules: &ArchiveRules<'_, S>) -> Self {
        solutions.sort_by(|a, b| compare_by(rules.metrics, &a.score, &b.score));
        let mut frontier = Self { solutions };
        frontier.recompute_categories(rules.categories);
        frontier
    }

    pub fn solutions(&self) -> &[Solution<S>] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<Solution<S>> {
        self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn get(&self, score: &S) -> Option<&Solution<S>> {
        self.solutions.iter().find(|s| &s.score == score)
    }

    /// The solution currently holding `category_id`.
    pub fn holder(&self, category_id: &str) -> Option<&Solution<S>> {
        self.solutions.iter().find(|s| s.holds(category_id))
    }

    /// Solutions holding at least one category.
    pub fn category_holders(&self) -> impl Iterator<Item = &Solution<S>> {
        self.solutions.iter().filter(|s| !s.categories.is_empty())
    }

    /// Whether no member dominates another.
    pub fn is_non_dominated(&self, metrics: &[&Metric<S>]) -> bool {
        self.solutions.iter().enumerate().all(|(i, a)| {
            self.solutions[i + 1..].iter().all(|b| {
                a.score != b.score
                    && dominance(&a.score, &b.score, metrics) == Dominance::Incomparable
            })
        })
    }

    /// Stages the insertion of a validated candidate.
    ///
    /// 1. an equal score goes through the duplicate policy, and is either
    ///    rejected or replaced in place;
    /// 2. a candidate dominated by any member is rejected;
    /// 3. members the candidate dominates are evicted;
    /// 4. the candidate is inserted at its canonical position;
    /// 5. category membership is recomputed from scratch.
    pub fn insert(&self, candidate: Solution<S>, rules: &ArchiveRules<'_, S>) -> Insertion<S> {
        if let Some(pos) = self.solutions.iter().position(|s| s.score == candidate.score) {
            let existing = &self.solutions[pos];
            return match rules.policy.resolve(&candidate, existing) {
                DuplicateResolution::Reject => Insertion::Duplicate {
                    existing: existing.clone(),
                },
                DuplicateResolution::Upgrade => {
                    let mut next = self.clone();
                    let replaced =
                        std::mem::replace(&mut next.solutions[pos], upgrade(candidate, existing));
                    next.recompute_categories(rules.categories);
                    debug!(position = pos, "upgraded equal-score entry in place");
                    Insertion::Upgraded {
                        accepted: next.solutions[pos].clone(),
                        frontier: next,
                        replaced,
                    }
                }
            };
        }

        let dominators: Vec<Solution<S>> = self
            .solutions
            .iter()
            .filter(|s| dominance(&s.score, &candidate.score, rules.metrics) == Dominance::Dominates)
            .cloned()
            .collect();
        if !dominators.is_empty() {
            return Insertion::Dominated { by: dominators };
        }

        let (evicted, mut kept): (Vec<_>, Vec<_>) =
            self.solutions.iter().cloned().partition(|s| {
                dominance(&candidate.score, &s.score, rules.metrics) == Dominance::Dominates
            });

        let pos = kept.partition_point(|s| {
            compare_by(rules.metrics, &s.score, &candidate.score) == Ordering::Less
        });
        kept.insert(pos, candidate);

        let mut next = Self { solutions: kept };
        next.recompute_categories(rules.categories);
        debug!(evicted = evicted.len(), size = next.len(), "candidate accepted");

        Insertion::Accepted {
            accepted: next.solutions[pos].clone(),
            frontier: next,
            evicted,
        }
    }

    /// Assigns every category to its best eligible member.
    ///
    /// Ties under a category's comparator go to the member that comes first in
    /// canonical order.
    fn recompute_categories(&mut self, categories: &[&'static Category<S>]) {
        for solution in &mut self.solutions {
            solution.categories.clear();
        }

        for category in categories {
            let best = self
                .solutions
                .iter()
                .enumerate()
                .filter(|(_, s)| category.supports_score(&s.score))
                .min_by(|(_, a), (_, b)| category.compare(&a.score, &b.score))
                .map(|(i, _)| i);
            if let Some(i) = best {
                self.solutions[i].categories.insert(category.id);
            }
        }
    }
}

/// The candidate with whatever the existing equal-score entry had that it lacks.
fn upgrade<S: Clone>(candidate: Solution<S>, existing: &Solution<S>) -> Solution<S> {
    let mut merged = candidate;
    for link in &existing.display_links {
        if !merged.display_links.contains(link) {
            merged.display_links.push(link.clone());
        }
    }
    if merged.content.is_none() {
        merged.content = existing.content.clone();
        merged.author = existing.author.clone();
    }
    merged.categories = BTreeSet::new();
    merged
}
