//! Metric descriptors.
//!
//! A [`Metric`] is a static, typed extraction of one [`Value`] from a score,
//! together with how that value takes part in ranking and dominance.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single value extracted from a score.
///
/// Booleans order `false < true`. A given metric always yields the same
/// variant, so cross-variant ordering never matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Which end of a metric's natural order is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    /// Smaller values are better (`false` before `true` for booleans).
    Lower,
    /// Larger values are better.
    Higher,
}

/// How a metric takes part in dominance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricRole {
    /// Ranked: one score can be strictly better than another on it.
    Directional,
    /// Values only differ, with no preference. Scores with different values
    /// are never comparable.
    Undirected,
    /// Boolean eligibility marker. Dominance treats it as a directional
    /// boolean with `false` preferred, so an eligible score is never evicted
    /// by an ineligible one.
    Flag,
}

/// Static descriptor of one metric of a game's score type `S`.
pub struct Metric<S: 'static> {
    /// Stable identifier, unique within a game.
    pub id: &'static str,
    /// Human readable name.
    pub display_name: &'static str,
    /// Short suffix used when rendering scores, e.g. `c` in `100c`.
    pub symbol: &'static str,
    pub role: MetricRole,
    pub preference: Preference,
    pub extract: fn(&S) -> Value,
}

impl<S> Metric<S> {
    /// A ranked metric where lower values are better.
    pub const fn directional(
        id: &'static str,
        display_name: &'static str,
        symbol: &'static str,
        extract: fn(&S) -> Value,
    ) -> Self {
        Self {
            id,
            display_name,
            symbol,
            role: MetricRole::Directional,
            preference: Preference::Lower,
            extract,
        }
    }

    /// A metric with no preferred direction.
    pub const fn undirected(
        id: &'static str,
        display_name: &'static str,
        symbol: &'static str,
        extract: fn(&S) -> Value,
    ) -> Self {
        Self {
            id,
            display_name,
            symbol,
            role: MetricRole::Undirected,
            preference: Preference::Lower,
            extract,
        }
    }

    /// A boolean eligibility flag, `true` meaning the flag is raised.
    pub const fn flag(
        id: &'static str,
        display_name: &'static str,
        symbol: &'static str,
        extract: fn(&S) -> Value,
    ) -> Self {
        Self {
            id,
            display_name,
            symbol,
            role: MetricRole::Flag,
            preference: Preference::Lower,
            extract,
        }
    }

    pub fn value(&self, score: &S) -> Value {
        (self.extract)(score)
    }

    /// Compares two scores on this metric. `Less` means `a` is better.
    pub fn compare(&self, a: &S, b: &S) -> Ordering {
        let ord = self.value(a).cmp(&self.value(b));
        match self.preference {
            Preference::Lower => ord,
            Preference::Higher => ord.reverse(),
        }
    }

    /// Whether the flag is raised on `score`. Non-boolean metrics are never raised.
    pub fn is_raised(&self, score: &S) -> bool {
        self.value(score).as_bool().unwrap_or(false)
    }
}

impl<S> PartialEq for Metric<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Metric<S> {}

impl<S> fmt::Debug for Metric<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("preference", &self.preference)
            .finish()
    }
}
