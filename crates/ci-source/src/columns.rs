use ci_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Header pairs tried, in order, by [`ColumnSelection::Auto`].
const NAMED_PAIRS: &[(&str, &str)] = &[("covariate", "outcome"), ("control", "conversions")];

/// How the covariate and outcome columns are located.
///
/// Column 0 is always the timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelection {
    /// `covariate`/`outcome`, then `control`/`conversions` by header, then
    /// positional.
    #[default]
    Auto,
    /// Explicit header names (case-insensitive).
    Named {
        /// Covariate header.
        covariate: String,
        /// Outcome header.
        outcome: String,
    },
    /// Covariate = column 1, outcome = column 2.
    Positional,
}

/// Column indices chosen for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnPlan {
    /// `None` for a univariate table: the row position stands in.
    pub covariate: Option<usize>,
    pub outcome: usize,
}

pub(crate) fn plan_columns(headers: &[String], selection: &ColumnSelection) -> Result<ColumnPlan> {
    // Trailing blank headers come from trailing delimiters.
    let width = headers.iter().rposition(|h| !h.trim().is_empty()).map_or(0, |i| i + 1);
    if width < 2 {
        return Err(Error::SchemaInvalid(format!(
            "expected a date column and at least one value column, found {width} column(s)"
        )));
    }

    match selection {
        ColumnSelection::Named { covariate, outcome } => {
            let cov = find(headers, covariate)
                .ok_or_else(|| Error::SchemaInvalid(format!("no column named {covariate:?}")))?;
            let out = find(headers, outcome)
                .ok_or_else(|| Error::SchemaInvalid(format!("no column named {outcome:?}")))?;
            if cov == out {
                return Err(Error::SchemaInvalid(
                    "covariate and outcome must be different columns".into(),
                ));
            }
            Ok(ColumnPlan { covariate: Some(cov), outcome: out })
        }
        ColumnSelection::Auto => {
            for (c, o) in NAMED_PAIRS {
                if let (Some(cov), Some(out)) = (find(headers, c), find(headers, o)) {
                    return Ok(ColumnPlan { covariate: Some(cov), outcome: out });
                }
            }
            Ok(positional(width))
        }
        ColumnSelection::Positional => Ok(positional(width)),
    }
}

fn positional(width: usize) -> ColumnPlan {
    if width == 2 {
        ColumnPlan { covariate: None, outcome: 1 }
    } else {
        ColumnPlan { covariate: Some(1), outcome: 2 }
    }
}

/// Index of `name` among the value columns (never column 0).
fn find(headers: &[String], name: &str) -> Option<usize> {
    let name = name.trim();
    headers.iter().skip(1).position(|h| h.trim().eq_ignore_ascii_case(name)).map(|i| i + 1)
}
