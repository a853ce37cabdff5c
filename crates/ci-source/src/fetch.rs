use std::io::Read;
use std::time::Duration;

use ci_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// What to do when two records share a timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep both (file order preserved), log a warning.
    #[default]
    Accept,
    /// Fail with a schema error.
    Reject,
}

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Upper bound on the whole remote read, in seconds.
    pub timeout_secs: u64,
    /// Duplicate timestamp handling.
    pub duplicates: DuplicatePolicy,
    /// `User-Agent` sent with remote reads.
    pub user_agent: String,
    /// Refuse payloads larger than this many bytes.
    pub max_bytes: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            duplicates: DuplicatePolicy::Accept,
            user_agent: concat!("causalimpact/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

impl SourceConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig("source.timeout_secs must be > 0".into()));
        }
        if self.max_bytes == 0 {
            return Err(Error::InvalidConfig("source.max_bytes must be > 0".into()));
        }
        Ok(())
    }

    /// Read timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Read the full contents behind `loc` once.
///
/// Local files go through `std::fs`; remote endpoints through a blocking
/// HTTP client bounded by [`SourceConfig::timeout`]. Any failure, including
/// a non-2xx status, surfaces as [`Error::SourceUnavailable`].
pub fn fetch_bytes(loc: &Location, config: &SourceConfig) -> Result<Vec<u8>> {
    let bytes = match loc {
        Location::LocalFile { path, .. } => std::fs::read(path).map_err(|e| {
            Error::SourceUnavailable(format!("failed to read {}: {e}", path.display()))
        })?,
        Location::Remote { url, .. } => fetch_remote(url, config)?,
    };
    if bytes.len() as u64 > config.max_bytes {
        return Err(Error::SourceUnavailable(format!(
            "source is {} bytes, limit is {}",
            bytes.len(),
            config.max_bytes
        )));
    }
    Ok(bytes)
}

fn fetch_remote(url: &str, config: &SourceConfig) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| Error::Computation(format!("failed to build HTTP client: {e}")))?;

    let resp = client.get(url).send().map_err(|e| remote_error(url, &e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::SourceUnavailable(format!("GET {url} returned HTTP {status}")));
    }

    let mut out = Vec::new();
    // One byte past the limit is enough to detect oversize bodies.
    resp.take(config.max_bytes.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| Error::SourceUnavailable(format!("failed to read body of {url}: {e}")))?;
    Ok(out)
}

fn remote_error(url: &str, e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::SourceUnavailable(format!("GET {url} timed out"))
    } else {
        Error::SourceUnavailable(format!("GET {url} failed: {e}"))
    }
}
