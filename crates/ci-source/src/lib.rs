//! # ci-source
//!
//! Source loader for the causal impact engine.
//!
//! A location string (local path, CSV export link, cloud-drive share link)
//! is resolved to a directly fetchable endpoint, read exactly once, and
//! parsed into a [`TimeSeriesTable`] of `(timestamp, covariate, outcome)`
//! records.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Column selection (named lookup, positional fallback).
pub mod columns;
/// Single bounded read of a resolved location.
pub mod fetch;
/// Location resolution and URL rewriting.
pub mod location;
/// CSV and spreadsheet parsing into untyped cells.
pub mod parse;
/// Timestamp parsing.
pub mod timestamp;

use ci_core::{Error, MIN_POST_LEN, MIN_PRE_LEN, Observation, Result, TimeSeriesTable};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use columns::ColumnSelection;
pub use fetch::{DuplicatePolicy, SourceConfig, fetch_bytes};
pub use location::{Location, SourceFormat, resolve_location};
pub use parse::{Cell, RawTable};

/// Names of the columns a table was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    /// Header of the timestamp column.
    pub timestamp: String,
    /// Header of the covariate column, or `None` when the row position was used.
    pub covariate: Option<String>,
    /// Header of the outcome column.
    pub outcome: String,
}

/// Table plus provenance of the read that produced it.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// Parsed, sorted table.
    pub table: TimeSeriesTable,
    /// Endpoint actually read (after URL rewriting).
    pub endpoint: String,
    /// Number of bytes read.
    pub n_bytes: usize,
    /// SHA-256 of the bytes read (lowercase hex).
    pub sha256: String,
    /// Columns the table was built from.
    pub columns: ResolvedColumns,
}

/// Resolve, fetch and parse `location` into a table.
pub fn load_table(
    location: &str,
    selection: &ColumnSelection,
    config: &SourceConfig,
) -> Result<LoadedSource> {
    config.validate()?;
    let loc = resolve_location(location)?;
    tracing::info!(endpoint = %loc.endpoint(), format = ?loc.format(), "loading source");

    let bytes = fetch_bytes(&loc, config)?;
    let n_bytes = bytes.len();
    let sha256 = sha256_hex(&bytes);
    tracing::debug!(bytes = n_bytes, sha256 = %sha256, "source read");

    let raw = parse::read_table(bytes, loc.format())?;
    let (table, columns) = build_table(&raw, selection, config.duplicates)?;
    tracing::info!(
        rows = table.len(),
        covariate = columns.covariate.as_deref().unwrap_or("<row index>"),
        outcome = %columns.outcome,
        "source parsed"
    );

    Ok(LoadedSource { table, endpoint: loc.endpoint(), n_bytes, sha256, columns })
}

/// Convert an untyped table into a sorted [`TimeSeriesTable`].
///
/// The first column is always the timestamp. Value columns are chosen by
/// [`ColumnSelection`]; with a single value column the covariate is the row
/// position after sorting.
pub fn build_table(
    raw: &RawTable,
    selection: &ColumnSelection,
    duplicates: DuplicatePolicy,
) -> Result<(TimeSeriesTable, ResolvedColumns)> {
    let plan = columns::plan_columns(&raw.headers, selection)?;

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        // Header is line 1.
        let line = i + 2;
        let first = row.first().unwrap_or(&Cell::Empty);
        let timestamp = first.as_timestamp().ok_or_else(|| {
            Error::SchemaInvalid(format!(
                "row {line}: first column value {:?} is not a date",
                first.to_string()
            ))
        })?;
        let outcome = numeric_cell(raw, row, plan.outcome, line)?;
        let covariate = match plan.covariate {
            Some(j) => numeric_cell(raw, row, j, line)?,
            None => f64::NAN,
        };
        rows.push(Observation { timestamp, covariate, outcome });
    }

    let min_rows = MIN_PRE_LEN + MIN_POST_LEN;
    if rows.len() < min_rows {
        return Err(Error::SchemaInvalid(format!(
            "need at least {min_rows} data rows, found {}",
            rows.len()
        )));
    }

    if plan.covariate.is_none() {
        rows.sort_by_key(|r| r.timestamp);
        for (i, r) in rows.iter_mut().enumerate() {
            r.covariate = i as f64;
        }
    }
    let table = TimeSeriesTable::from_unsorted(rows);

    let dups = table.duplicate_timestamps();
    if !dups.is_empty() {
        match duplicates {
            DuplicatePolicy::Reject => {
                return Err(Error::SchemaInvalid(format!(
                    "{} duplicate timestamp(s), first at {}",
                    dups.len(),
                    dups[0]
                )));
            }
            DuplicatePolicy::Accept => {
                for ts in &dups {
                    tracing::warn!(timestamp = %ts, "duplicate timestamp passed through");
                }
            }
        }
    }

    let header = |j: usize| raw.headers.get(j).cloned().unwrap_or_default();
    let columns = ResolvedColumns {
        timestamp: header(0),
        covariate: plan.covariate.map(header),
        outcome: header(plan.outcome),
    };
    Ok((table, columns))
}

fn numeric_cell(raw: &RawTable, row: &[Cell], j: usize, line: usize) -> Result<f64> {
    let cell = row.get(j).unwrap_or(&Cell::Empty);
    match cell.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Error::SchemaInvalid(format!(
            "row {line}: column {:?} value {:?} is not a finite number",
            raw.headers.get(j).map(String::as_str).unwrap_or(""),
            cell.to_string()
        ))),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{:02x}", b));
    }
    s
}
