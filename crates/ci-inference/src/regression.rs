//! Ordinary least squares of outcome on a single covariate.
//!
//! The fit runs on the centered design `[1, x - x̄]`, which keeps `XᵀX`
//! diagonal and well-conditioned even when the covariate sits far from zero
//! (row indices in the thousands, raw spend figures). Coefficients are
//! de-centered before they are returned.

use ci_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Fitted line `outcome ≈ intercept + slope · covariate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    /// Intercept `a`.
    pub intercept: f64,
    /// Slope `b`.
    pub slope: f64,
    /// Number of observations the model was fit on.
    pub n_obs: usize,
    /// `sqrt(SSR / (n - 2))`; zero when `n == 2`.
    pub residual_std_error: f64,
    /// Coefficient of determination on the fitting sample.
    pub r_squared: f64,
}

impl FittedModel {
    /// Evaluate the line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Evaluate the line at each `x`, preserving order.
    pub fn predict_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }
}

/// Fit `y = a + b·x` by least squares.
///
/// Errors:
/// - [`Error::Computation`] on length mismatch or non-finite input;
/// - [`Error::InsufficientData`] with fewer than two points;
/// - [`Error::DegenerateFit`] when `x` is constant.
pub fn fit_ols(x: &[f64], y: &[f64]) -> Result<FittedModel> {
    let n = x.len();
    if y.len() != n {
        return Err(Error::Computation(format!(
            "covariate/outcome length mismatch: {n} vs {}",
            y.len()
        )));
    }
    if n < 2 {
        return Err(Error::InsufficientData(format!("need at least 2 points to fit, got {n}")));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(Error::Computation("non-finite value in regression input".into()));
    }

    let (lo, hi) = x.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    if hi == lo {
        return Err(Error::DegenerateFit(format!(
            "covariate is constant ({lo}) across all {n} pre-period records"
        )));
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] - x_mean });
    let yv = DVector::from_column_slice(y);

    let xtx = design.transpose() * &design;
    let xty = design.transpose() * &yv;
    let beta = xtx
        .lu()
        .solve(&xty)
        .ok_or_else(|| Error::Computation("OLS solve failed (singular XtX)".to_string()))?;

    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;

    let resid = &yv - &design * &beta;
    let ssr = resid.norm_squared();
    let y_mean = beta[0];
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 1.0 };
    let residual_std_error = if n > 2 { (ssr / (n - 2) as f64).sqrt() } else { 0.0 };

    if !(intercept.is_finite() && slope.is_finite()) {
        return Err(Error::Computation("OLS produced non-finite coefficients".into()));
    }

    tracing::debug!(n, intercept, slope, r_squared, "ols fit");
    Ok(FittedModel { intercept, slope, n_obs: n, residual_std_error, r_squared })
}
