//! Shared application state for the report server.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use ci_report::EngineConfig;

/// Shared state available to all request handlers.
pub struct AppState {
    /// Config every request starts from before its report kind is applied.
    pub base_config: EngineConfig,

    /// Server start time (for uptime reporting).
    pub started_at: Instant,

    /// In-flight request counter (for /health).
    pub inflight: AtomicU64,

    /// Total requests served (for /health).
    pub total_requests: AtomicU64,
}

impl AppState {
    pub fn new(base_config: EngineConfig) -> Self {
        Self {
            base_config,
            started_at: Instant::now(),
            inflight: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
        }
    }
}

/// Type alias used in axum handlers.
pub type SharedState = Arc<AppState>;
