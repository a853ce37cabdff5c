//! Pre/post period partitioning.

use chrono::NaiveDateTime;
use ci_core::{Error, MIN_POST_LEN, MIN_PRE_LEN, Period, Result, SplitPolicy, TimeSeriesTable};

/// Split `table` into `(pre, post)` according to `policy`.
///
/// The periods are contiguous, disjoint and cover the whole table. Fails with
/// [`Error::InsufficientData`] when `pre` would hold fewer than
/// [`MIN_PRE_LEN`] records or `post` fewer than [`MIN_POST_LEN`].
pub fn split_periods(table: &TimeSeriesTable, policy: &SplitPolicy) -> Result<(Period, Period)> {
    let n = table.len();
    let k = pre_len(n, policy)?;

    if k < MIN_PRE_LEN {
        return Err(Error::InsufficientData(format!(
            "pre-period has {k} record(s), need at least {MIN_PRE_LEN}"
        )));
    }
    let n_post = n.saturating_sub(k);
    if n_post < MIN_POST_LEN {
        return Err(Error::InsufficientData(format!(
            "post-period has {n_post} record(s), need at least {MIN_POST_LEN} (table has {n}, pre takes {k})"
        )));
    }

    Ok((Period::new(0, k), Period::new(k, n)))
}

fn pre_len(n: usize, policy: &SplitPolicy) -> Result<usize> {
    match *policy {
        SplitPolicy::FixedCount(k) => Ok(k),
        SplitPolicy::Proportional(r) => {
            if !(r.is_finite() && r > 0.0 && r < 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "proportional split ratio must lie in (0, 1), got {r}"
                )));
            }
            // Absorb rounding noise so that e.g. 50 * 0.3 does not round up to 16.
            let raw = n as f64 * r;
            let k = if (raw - raw.round()).abs() < 1e-9 { raw.round() } else { raw.ceil() };
            Ok(k as usize)
        }
    }
}

/// Timestamp of the last pre-period record (where the intervention marker sits).
pub fn intervention_boundary(table: &TimeSeriesTable, pre: &Period) -> Result<NaiveDateTime> {
    pre.end
        .checked_sub(1)
        .filter(|_| !pre.is_empty())
        .and_then(|i| table.get(i))
        .map(|r| r.timestamp)
        .ok_or_else(|| Error::InsufficientData("pre-period is empty".into()))
}

/// Timestamp of the first post-period record.
pub fn post_start(table: &TimeSeriesTable, post: &Period) -> Result<NaiveDateTime> {
    table
        .get(post.start)
        .filter(|_| !post.is_empty())
        .map(|r| r.timestamp)
        .ok_or_else(|| Error::InsufficientData("post-period is empty".into()))
}
