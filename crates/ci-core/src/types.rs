//! Common data types for the causal impact engine

use std::ops::Range;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Minimum number of pre-period records (two points determine a line).
pub const MIN_PRE_LEN: usize = 2;

/// Minimum number of post-period records.
pub const MIN_POST_LEN: usize = 1;

/// Single `(timestamp, covariate, outcome)` record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Record timestamp (date-only sources land at midnight).
    pub timestamp: NaiveDateTime,
    /// Control series value.
    pub covariate: f64,
    /// Metric the intervention is expected to move.
    pub outcome: f64,
}

/// Ordered, immutable time series.
///
/// Rows are sorted ascending by timestamp at construction. Ties keep their
/// file order; duplicate timestamps are only rejected when the loader is
/// configured to do so.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesTable {
    rows: Vec<Observation>,
}

impl TimeSeriesTable {
    /// Build a table from rows in arbitrary order (stable sort by timestamp).
    pub fn from_unsorted(mut rows: Vec<Observation>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        Self { rows }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All records in timestamp order.
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Record at index `i`.
    pub fn get(&self, i: usize) -> Option<&Observation> {
        self.rows.get(i)
    }

    /// Timestamps in order.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    /// Covariate column in order.
    pub fn covariates(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.covariate).collect()
    }

    /// Outcome column in order.
    pub fn outcomes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.outcome).collect()
    }

    /// Timestamps that occur more than once (each reported once).
    pub fn duplicate_timestamps(&self) -> Vec<NaiveDateTime> {
        let mut out: Vec<NaiveDateTime> = Vec::new();
        for w in self.rows.windows(2) {
            if w[0].timestamp == w[1].timestamp && out.last() != Some(&w[0].timestamp) {
                out.push(w[0].timestamp);
            }
        }
        out
    }
}

/// Half-open index range `[start, end)` over a [`TimeSeriesTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// First index (inclusive).
    pub start: usize,
    /// Last index (exclusive).
    pub end: usize,
}

impl Period {
    /// Create a period; `start` is clamped to `end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start: start.min(end), end }
    }

    /// Number of records covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the period covers no records.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Index range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Records of `table` covered by this period (empty if out of bounds).
    pub fn slice<'a>(&self, table: &'a TimeSeriesTable) -> &'a [Observation] {
        table.rows().get(self.range()).unwrap_or(&[])
    }
}

/// How the table is partitioned into pre/post periods.
///
/// Serialized externally tagged: `{fixed_count: 40}` or `{proportional: 0.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Pre = first `k` records.
    FixedCount(usize),
    /// Pre = first `ceil(n * r)` records.
    Proportional(f64),
}

impl SplitPolicy {
    /// Historical default pre-period length.
    pub const DEFAULT_PRE_COUNT: usize = 40;
    /// Default ratio for the proportional policy.
    pub const DEFAULT_RATIO: f64 = 0.5;
}

impl Default for SplitPolicy {
    fn default() -> Self {
        SplitPolicy::FixedCount(Self::DEFAULT_PRE_COUNT)
    }
}

/// Effect estimate over the post-period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    /// `actual[i] - predicted[i]` per post record, in order.
    pub pointwise_effect: Vec<f64>,
    /// Mean of `pointwise_effect`.
    pub average_lift: f64,
    /// Sum of `pointwise_effect`.
    pub cumulative_lift: f64,
    /// Sample standard deviation of the effect divided by `sqrt(n)`.
    pub standard_error: f64,
    /// `average_lift - 1.96 * standard_error`.
    pub ci_low: f64,
    /// `average_lift + 1.96 * standard_error`.
    pub ci_high: f64,
}
