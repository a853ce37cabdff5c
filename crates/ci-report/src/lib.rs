//! # ci-report
//!
//! The end-to-end causal impact pipeline and the documents it produces.
//!
//! [`Engine::run`] chains loader, splitter, model, estimator and renderer
//! for one source and returns a [`Report`]. [`ReportKind`] is the fixed set
//! of analysis variants a dispatcher can select by tag.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Engine configuration and its file loader.
pub mod config;
/// The pipeline.
pub mod engine;
/// Static report-kind registry.
pub mod kinds;
/// Report documents (HTML, JSON, raw chart).
pub mod report;

pub use config::EngineConfig;
pub use engine::Engine;
pub use kinds::ReportKind;
pub use report::{Chart, ModelSummary, Report, SourceSummary};
