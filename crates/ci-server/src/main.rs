//! causalimpact server: causal impact reports over HTTP.
//!
//! # Endpoints
//!
//! - `POST /v1/run-analysis` : `{report_type, file_url, title?, format?}` → HTML or JSON report
//! - `GET  /v1/kinds`        : registered report kinds
//! - `GET  /v1/health`       : server status, version, counters

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use ci_report::EngineConfig;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use state::AppState;

/// Causal impact report server.
#[derive(Parser, Debug)]
#[command(name = "causalimpact-server", version = ci_core::VERSION, about)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Engine config applied to every request (YAML, or JSON by extension).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum request body size in MiB.
    #[arg(long, default_value = "1")]
    max_body_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    let base_config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let state = Arc::new(AppState::new(base_config));

    let app = Router::new()
        .merge(routes::router())
        .layer(DefaultBodyLimit::max(mb_to_bytes(cli.max_body_mb)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    tracing::info!(%addr, version = ci_core::VERSION, "causalimpact-server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn mb_to_bytes(mb: usize) -> usize {
    mb.saturating_mul(1024).saturating_mul(1024)
}
