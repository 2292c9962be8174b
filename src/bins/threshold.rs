use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// How interior bin edges default when the user hasn't overridden them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Interior edge `i` defaults to `i * step` (the dashboard's spinner
    /// default, step 25 for student counts).
    Linear { step: f64 },
    /// Interior edge `i` defaults to the `i/(division-1)` quantile of the
    /// series, linearly interpolated.
    Quantile,
}

/// An ordered sequence of bin edges for one attribute column.
///
/// Edge `i` and `i+1` delimit bucket `i`: half-open `[e[i], e[i+1])`, with
/// the top bucket closed. Generated sets pin the first and last edge to the
/// series' floor(min) and ceil(max); explicitly constructed sets carry
/// whatever the caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    edges: Vec<f64>,
}

impl ThresholdSet {
    /// Wrap explicit user-chosen edges (the dashboard hardcodes
    /// `[0, 30, 35, 40, 45, 50, 55, 70]` for average age).
    pub fn from_edges(edges: Vec<f64>) -> Result<Self, Error> {
        if edges.len() < 2 {
            return Err(Error::TooFewEdges(edges.len()));
        }
        let set = Self { edges };
        if !set.is_monotonic() {
            warn!(edges = ?set.edges, "threshold edges are out of order; affected buckets will be empty");
        }
        Ok(set)
    }

    #[inline] pub fn edges(&self) -> &[f64] { &self.edges }

    /// Number of edges (the division count).
    #[inline] pub fn division(&self) -> usize { self.edges.len() }

    /// Number of buckets the edges delimit.
    #[inline] pub fn buckets(&self) -> usize { self.edges.len() - 1 }

    /// False when an override put an interior edge out of order. The
    /// classifier tolerates this (the inverted bucket is simply empty), but
    /// the UI should surface it.
    pub fn is_monotonic(&self) -> bool {
        self.edges.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Compute `division` bin edges over a series of present values.
///
/// Edge 0 is floor(min) and edge `division-1` is ceil(max) — never
/// overridden, so the outermost buckets always cover the observed range and
/// edges stay integral for integral series. Interior edges take the override
/// for their index if present, otherwise the mode's default.
pub fn generate(
    series: &[f64],
    division: usize,
    overrides: &BTreeMap<usize, f64>,
    mode: ThresholdMode,
) -> Result<ThresholdSet, Error> {
    if division < 2 {
        return Err(Error::InvalidDivision { division, min: 2 });
    }
    let mut values = series.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
    if values.is_empty() {
        return Err(Error::EmptySeries);
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));

    let min = values[0];
    let max = values[values.len() - 1];

    let mut edges = Vec::with_capacity(division);
    edges.push(min.floor());
    for i in 1..division - 1 {
        let edge = match overrides.get(&i) {
            Some(&v) => v,
            None => match mode {
                ThresholdMode::Linear { step } => i as f64 * step,
                ThresholdMode::Quantile => quantile(&values, i as f64 / (division - 1) as f64),
            },
        };
        edges.push(edge);
    }
    edges.push(max.ceil());

    let set = ThresholdSet { edges };
    if !set.is_monotonic() {
        warn!(edges = ?set.edges(), "override produced non-monotonic edges; affected buckets will be empty");
    }
    Ok(set)
}

/// Linear-interpolated quantile of a sorted slice, `q` in `[0, 1]`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
