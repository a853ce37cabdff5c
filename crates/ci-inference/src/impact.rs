//! Effect and uncertainty over the post-period.

use ci_core::{Error, ImpactSummary, Result};

/// Two-sided 95% normal quantile used for the lift interval.
///
/// No small-sample (Student-t) correction is applied; short post-periods
/// get an interval that is too narrow.
pub const Z_95: f64 = 1.96;

/// Compare post-period `actual` against the counterfactual `predicted`.
///
/// `standard_error` is the sample standard deviation (`n - 1`) of the
/// pointwise effect divided by `sqrt(n)`. Fails with
/// [`Error::InsufficientData`] for fewer than two points and with
/// [`Error::Computation`] on length mismatch or a non-finite statistic.
pub fn estimate_impact(actual: &[f64], predicted: &[f64]) -> Result<ImpactSummary> {
    if actual.len() != predicted.len() {
        return Err(Error::Computation(format!(
            "actual/predicted length mismatch: {} vs {}",
            actual.len(),
            predicted.len()
        )));
    }
    let n = actual.len();
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "post-period has {n} record(s); at least 2 are needed for a standard deviation"
        )));
    }

    let pointwise_effect: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    let cumulative_lift: f64 = pointwise_effect.iter().sum();
    let average_lift = cumulative_lift / n as f64;

    let var = pointwise_effect.iter().map(|e| (e - average_lift).powi(2)).sum::<f64>()
        / (n - 1) as f64;
    let standard_error = var.sqrt() / (n as f64).sqrt();

    let ci_low = average_lift - Z_95 * standard_error;
    let ci_high = average_lift + Z_95 * standard_error;

    if ![average_lift, cumulative_lift, standard_error, ci_low, ci_high].iter().all(|v| v.is_finite())
    {
        return Err(Error::Computation("impact statistics are not finite".into()));
    }

    Ok(ImpactSummary {
        pointwise_effect,
        average_lift,
        cumulative_lift,
        standard_error,
        ci_low,
        ci_high,
    })
}
