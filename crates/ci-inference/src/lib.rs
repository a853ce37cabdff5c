//! # ci-inference
//!
//! Counterfactual inference for the causal impact engine.
//!
//! - [`split`]: partition a table into pre/post periods.
//! - [`regression`]: OLS of outcome on covariate over the pre-period.
//! - [`impact`]: pointwise effect, lift statistics and the 95% interval.
//! - [`analysis`]: the three stages chained over one table.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod impact;
pub mod regression;
pub mod split;

pub use analysis::{CounterfactualAnalysis, run_counterfactual};
pub use impact::{Z_95, estimate_impact};
pub use regression::{FittedModel, fit_ols};
pub use split::{intervention_boundary, post_start, split_periods};
