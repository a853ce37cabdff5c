//! HTTP route handlers for the report server.
//!
//! All endpoints live under `/v1/`.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ci_report::{Engine, ReportKind};
use serde::{Deserialize, Serialize};

use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/v1/run-analysis", post(run_analysis_handler))
        .route("/v1/kinds", get(kinds_handler))
        .route("/v1/health", get(health_handler))
}

// ---------------------------------------------------------------------------
// POST /v1/run-analysis
// ---------------------------------------------------------------------------

/// Request body for `/v1/run-analysis`.
#[derive(Debug, Deserialize)]
struct RunRequest {
    /// Report kind tag; `causal_impact` when absent.
    #[serde(default)]
    report_type: Option<String>,

    /// Data source location.
    #[serde(default)]
    file_url: Option<String>,

    /// Display title; the kind's title when absent.
    #[serde(default)]
    title: Option<String>,

    /// `html` (default) or `json`.
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseFormat {
    Html,
    Json,
}

async fn run_analysis_handler(
    State(state): State<SharedState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    state.inflight.fetch_add(1, Ordering::Relaxed);
    let _dec = DecrementOnDrop(&state.inflight);
    state.total_requests.fetch_add(1, Ordering::Relaxed);

    let Json(req) = payload.map_err(|e| AppError::bad_request(format!("invalid JSON: {e}")))?;

    let file_url = req
        .file_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("`file_url` is required".into()))?;
    let kind = match req.report_type.as_deref() {
        Some(tag) => ReportKind::from_tag(tag)
            .ok_or_else(|| AppError::bad_request(format!("unknown report type: {tag}")))?,
        None => ReportKind::default(),
    };
    let format = match req.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("html") => ResponseFormat::Html,
        Some("json") => ResponseFormat::Json,
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "unknown format {other:?} (expected html or json)"
            )));
        }
    };
    let title = req.title.unwrap_or_else(|| kind.default_title().to_string());
    let engine = Engine::new(kind.engine_config(&state.base_config))?;
    tracing::info!(kind = %kind, file_url = %file_url, "run-analysis");

    // Fetch, fit and render are blocking.
    let report = tokio::task::spawn_blocking(move || engine.run(&file_url, &title))
        .await
        .map_err(|e| AppError::internal(format!("task panicked: {e}")))??;

    Ok(match format {
        ResponseFormat::Html => {
            ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], report.to_html()).into_response()
        }
        ResponseFormat::Json => Json(report.to_json()).into_response(),
    })
}

// ---------------------------------------------------------------------------
// GET /v1/kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct KindEntry {
    tag: &'static str,
    title: &'static str,
    description: &'static str,
}

async fn kinds_handler() -> Json<Vec<KindEntry>> {
    Json(
        ReportKind::ALL
            .iter()
            .map(|k| KindEntry { tag: k.tag(), title: k.default_title(), description: k.description() })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_s: f64,
    inflight: u64,
    total_requests: u64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: ci_core::VERSION,
        uptime_s: state.started_at.elapsed().as_secs_f64(),
        inflight: state.inflight.load(Ordering::Relaxed),
        total_requests: state.total_requests.load(Ordering::Relaxed),
    })
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Structured JSON error response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
    kind: &'static str,
}

impl AppError {
    fn bad_request(msg: String) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: msg, kind: "bad_request" }
    }

    fn internal(msg: String) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: msg, kind: "internal" }
    }
}

impl From<ci_core::Error> for AppError {
    fn from(e: ci_core::Error) -> Self {
        use ci_core::Error as E;
        let status = match &e {
            E::SourceUnavailable(_) => StatusCode::BAD_REQUEST,
            E::SchemaInvalid(_) | E::InsufficientData(_) | E::DegenerateFit(_) | E::InvalidConfig(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            E::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(kind = e.kind(), error = %e, "run-analysis failed");
        } else {
            tracing::warn!(kind = e.kind(), error = %e, "run-analysis rejected");
        }
        Self { status, message: e.to_string(), kind: e.kind() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "kind": self.kind,
        });
        (self.status, Json(body)).into_response()
    }
}

/// RAII guard to decrement an atomic counter on drop.
struct DecrementOnDrop<'a>(&'a AtomicU64);

impl Drop for DecrementOnDrop<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use ci_report::EngineConfig;

    use super::*;
    use crate::state::AppState;

    fn fixture(name: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../tests/fixtures")
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn state() -> SharedState {
        let mut config = EngineConfig::default();
        config.viz.output.format = ci_report::config::ChartFormat::Svg;
        Arc::new(AppState::new(config))
    }

    fn request(report_type: Option<&str>, file_url: Option<String>, format: Option<&str>) -> RunRequest {
        RunRequest {
            report_type: report_type.map(str::to_string),
            file_url,
            title: None,
            format: format.map(str::to_string),
        }
    }

    async fn call(state: SharedState, req: RunRequest) -> (StatusCode, Vec<u8>) {
        let resp = match run_analysis_handler(State(state), Ok(Json(req))).await {
            Ok(r) => r,
            Err(e) => e.into_response(),
        };
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn html_report_by_default() {
        let (status, body) =
            call(state(), request(Some("causal_impact"), Some(fixture("step_50.csv")), None)).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("<h1>Causal Impact Analysis</h1>"));
        assert!(html.contains("<tr><td>Avg. Lift</td><td>5.00</td></tr>"));
    }

    #[tokio::test]
    async fn json_report_on_request() {
        let (status, body) =
            call(state(), request(Some("causal_impact_half"), Some(fixture("linear_50.csv")), Some("json")))
                .await;
        assert_eq!(status, StatusCode::OK);
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["n_pre"], 25);
    }

    #[tokio::test]
    async fn missing_file_url_is_400() {
        let (status, body) = call(state(), request(Some("causal_impact"), None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["kind"], "bad_request");
    }

    #[tokio::test]
    async fn unknown_report_type_is_400() {
        let (status, _) =
            call(state(), request(Some("mystery"), Some(fixture("linear_50.csv")), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreadable_source_is_400() {
        let (status, body) =
            call(state(), request(None, Some(fixture("does_not_exist.csv")), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["kind"], "source_unavailable");
    }

    #[tokio::test]
    async fn bad_data_is_422() {
        let (status, body) = call(state(), request(None, Some(fixture("bad_date.csv")), None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["kind"], "schema_invalid");

        let (status, _) =
            call(state(), request(None, Some(fixture("constant_covariate.csv")), None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn counters_settle_after_requests() {
        let st = state();
        let _ = call(st.clone(), request(None, None, None)).await;
        let _ = call(st.clone(), request(None, Some(fixture("linear_50.csv")), Some("json"))).await;
        let Json(h) = health_handler(State(st)).await;
        assert_eq!(h.status, "ok");
        assert_eq!(h.total_requests, 2);
        assert_eq!(h.inflight, 0);
    }

    #[tokio::test]
    async fn kinds_lists_registry() {
        let Json(kinds) = kinds_handler().await;
        let tags: Vec<&str> = kinds.iter().map(|k| k.tag).collect();
        assert_eq!(tags, ["causal_impact", "causal_impact_half"]);
    }
}
