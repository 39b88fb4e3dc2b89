//! Score trait plus rendering and parsing of scores through their metrics.

use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, Result};
use crate::metric::{Metric, MetricRole, Value};

/// An immutable tuple of metric values for one solution of a puzzle.
///
/// Implementors must make equality coincide with equality of every metric
/// value the game declares, so that the game's full metric list is a total
/// order over distinct scores.
pub trait Score:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Score for T where
    T: Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Target format when rendering a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    /// `100c/10f/5bG`
    Plain,
    /// Like plain, with the highlighted metric in bold.
    Markdown,
    /// `100c-10f-5bG`, safe to use as a file name.
    FileName,
}

/// Renders `score` as its metric values in `metrics` order.
///
/// Numeric values print as `<value><symbol>`. Boolean values are appended as
/// their symbol after the numeric part when raised, and omitted otherwise.
pub fn format_score<S>(
    score: &S,
    metrics: &[&Metric<S>],
    format: StringFormat,
    highlight: Option<&Metric<S>>,
) -> String {
    let separator = match format {
        StringFormat::FileName => "-",
        StringFormat::Plain | StringFormat::Markdown => "/",
    };

    let mut parts = Vec::with_capacity(metrics.len());
    let mut flags = String::new();
    for metric in metrics {
        match metric.value(score) {
            Value::Bool(raised) => {
                if raised {
                    flags.push_str(metric.symbol);
                }
            }
            Value::Int(v) => {
                let cell = format!("{v}{}", metric.symbol);
                let bold = format == StringFormat::Markdown && highlight == Some(*metric);
                parts.push(if bold { format!("**{cell}**") } else { cell });
            }
        }
    }

    let mut out = parts.join(separator);
    out.push_str(&flags);
    out
}

/// Parses user-supplied score text into one value per entry of `metrics`.
///
/// Accepts the shape produced by [`format_score`]: non-flag metrics as
/// `/`-separated numbers, each optionally followed by its symbol, and raised
/// flags as trailing symbols (`100/10/5`, `100c/10f/5bG`). Flags that are not
/// mentioned parse as `false`.
pub fn parse_values<S>(text: &str, metrics: &[&Metric<S>]) -> Result<Vec<Value>> {
    let invalid = |reason: String| CoreError::InvalidScore {
        text: text.to_string(),
        reason,
    };

    let ranked: Vec<usize> = metrics
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role != MetricRole::Flag)
        .map(|(i, _)| i)
        .collect();
    let parts: Vec<&str> = text.trim().split('/').map(str::trim).collect();
    if parts.len() != ranked.len() {
        return Err(invalid(format!(
            "expected {} parts separated by '/', found {}",
            ranked.len(),
            parts.len()
        )));
    }

    let mut values: Vec<Value> = metrics
        .iter()
        .map(|m| match m.role {
            MetricRole::Flag => Value::Bool(false),
            MetricRole::Directional | MetricRole::Undirected => Value::Int(0),
        })
        .collect();

    let mut trailing = "";
    for (n, (&idx, part)) in ranked.iter().zip(&parts).enumerate() {
        let metric = metrics[idx];
        let digits = part.len() - part.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return Err(invalid(format!("\"{part}\" does not start with a number")));
        }
        let number: i64 = part[..digits]
            .parse()
            .map_err(|e| invalid(format!("{}: {e}", metric.display_name)))?;
        values[idx] = Value::Int(number);

        let suffix = &part[digits..];
        let suffix = suffix.strip_prefix(metric.symbol).unwrap_or(suffix);
        if n + 1 < ranked.len() {
            if !suffix.is_empty() {
                return Err(invalid(format!(
                    "unexpected \"{suffix}\" after {}",
                    metric.display_name
                )));
            }
        } else {
            trailing = suffix;
        }
    }

    while !trailing.is_empty() {
        let Some((idx, flag)) = metrics.iter().enumerate().find(|(_, m)| {
            m.role == MetricRole::Flag && !m.symbol.is_empty() && trailing.starts_with(m.symbol)
        }) else {
            return Err(invalid(format!("unknown flag \"{trailing}\"")));
        };
        values[idx] = Value::Bool(true);
        trailing = &trailing[flag.symbol.len()..];
    }

    Ok(values)
}
