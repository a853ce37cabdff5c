//! # ci-viz
//!
//! Visualization data artifacts for causal impact reports.
//!
//! This crate only shapes numbers into plot-friendly JSON structures
//! (parallel arrays instead of nested objects); drawing lives in
//! `ci-viz-render`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Actual vs. counterfactual chart artifact.
pub mod impact;

pub use impact::{IMPACT_CHART_SCHEMA, ImpactChartArtifact, impact_chart_artifact};
