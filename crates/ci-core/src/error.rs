//! Error types for the causal impact engine

use thiserror::Error;

/// Engine error type.
///
/// Every variant is terminal for the invocation that raised it; no stage
/// retries or falls back internally.
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch/read failed or timed out.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Table shape does not match the date + covariate (+ outcome) layout.
    #[error("schema invalid: {0}")]
    SchemaInvalid(String),

    /// A period or statistic lacks the minimum sample size.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Covariate has no variance over the pre-period.
    #[error("degenerate fit: {0}")]
    DegenerateFit(String),

    /// A caller-supplied configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Any other numeric or rendering failure.
    #[error("computation error: {0}")]
    Computation(String),
}

impl Error {
    /// Stable snake_case tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SourceUnavailable(_) => "source_unavailable",
            Error::SchemaInvalid(_) => "schema_invalid",
            Error::InsufficientData(_) => "insufficient_data",
            Error::DegenerateFit(_) => "degenerate_fit",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Computation(_) => "computation",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
