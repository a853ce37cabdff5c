//! # ci-core
//!
//! Core types for the causal impact engine.
//!
//! This crate defines the data model shared by every stage of the
//! pipeline (loader, splitter, model, estimator, renderer) and the error
//! taxonomy each stage fails with. It has no I/O and no numerics.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error taxonomy.
pub mod error;
/// Time series, periods, split policy and impact summary.
pub mod types;

pub use error::{Error, Result};
pub use types::{
    ImpactSummary, MIN_POST_LEN, MIN_PRE_LEN, Observation, Period, SplitPolicy, TimeSeriesTable,
};

/// Workspace version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
