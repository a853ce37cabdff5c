//! Splitter, model and estimator chained over one table.

use chrono::NaiveDateTime;
use ci_core::{ImpactSummary, Period, Result, SplitPolicy, TimeSeriesTable};

use crate::impact::estimate_impact;
use crate::regression::{FittedModel, fit_ols};
use crate::split::{intervention_boundary, split_periods};

/// Everything computed between loading a table and rendering a report.
#[derive(Debug, Clone)]
pub struct CounterfactualAnalysis {
    /// Fitting period.
    pub pre: Period,
    /// Evaluation period.
    pub post: Period,
    /// Timestamp of the last pre-period record.
    pub boundary: NaiveDateTime,
    /// Line fitted on `pre`.
    pub model: FittedModel,
    /// Counterfactual outcome for each `post` record, in order.
    pub predicted: Vec<f64>,
    /// Effect of the intervention over `post`.
    pub summary: ImpactSummary,
}

/// Split `table`, fit on the pre-period and estimate the post-period impact.
///
/// The model never sees post-period outcomes.
pub fn run_counterfactual(
    table: &TimeSeriesTable,
    policy: &SplitPolicy,
) -> Result<CounterfactualAnalysis> {
    let (pre, post) = split_periods(table, policy)?;
    let boundary = intervention_boundary(table, &pre)?;
    tracing::info!(n_pre = pre.len(), n_post = post.len(), boundary = %boundary, "periods split");

    let pre_rows = pre.slice(table);
    let x: Vec<f64> = pre_rows.iter().map(|r| r.covariate).collect();
    let y: Vec<f64> = pre_rows.iter().map(|r| r.outcome).collect();
    let model = fit_ols(&x, &y)?;
    tracing::info!(intercept = model.intercept, slope = model.slope, r_squared = model.r_squared, "model fitted");

    let post_rows = post.slice(table);
    let post_x: Vec<f64> = post_rows.iter().map(|r| r.covariate).collect();
    let actual: Vec<f64> = post_rows.iter().map(|r| r.outcome).collect();
    let predicted = model.predict_many(&post_x);

    let summary = estimate_impact(&actual, &predicted)?;
    tracing::info!(
        average_lift = summary.average_lift,
        cumulative_lift = summary.cumulative_lift,
        standard_error = summary.standard_error,
        "impact estimated"
    );

    Ok(CounterfactualAnalysis { pre, post, boundary, model, predicted, summary })
}
