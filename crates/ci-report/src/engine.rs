use ci_core::{Error, Result};
use ci_inference::run_counterfactual;
use ci_source::load_table;
use ci_viz::impact_chart_artifact;
use ci_viz_render::RenderError;

use crate::config::EngineConfig;
use crate::report::{Chart, ModelSummary, Report, SourceSummary};

/// The causal impact pipeline.
///
/// Stateless between runs: every [`Engine::run`] owns its table, model and
/// report, so one engine can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Validate `config` and build an engine around it.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load `location`, estimate the impact and render the report.
    ///
    /// Loader, splitter, model, estimator and renderer run strictly in
    /// sequence; the first failure ends the run.
    pub fn run(&self, location: &str, title: &str) -> Result<Report> {
        let span = tracing::info_span!("engine_run", location = %location);
        let _enter = span.enter();

        let loaded = load_table(location, &self.config.columns, &self.config.source)?;
        let table = &loaded.table;

        let analysis = run_counterfactual(table, &self.config.split)?;

        let artifact = impact_chart_artifact(
            title,
            table,
            &analysis.post,
            &analysis.predicted,
            analysis.boundary,
            &analysis.summary,
        )?;
        let format = self.config.viz.output.format;
        let bytes = ci_viz_render::render_to_bytes(&artifact, format, &self.config.viz)
            .map_err(render_error)?;
        tracing::info!(format = %format, bytes = bytes.len(), "chart rendered");

        Ok(Report {
            title: title.to_string(),
            model: ModelSummary::from(&analysis.model),
            n_pre: analysis.pre.len(),
            n_post: analysis.post.len(),
            intervention: analysis.boundary,
            source: SourceSummary {
                endpoint: loaded.endpoint,
                sha256: loaded.sha256,
                covariate_column: loaded.columns.covariate,
                outcome_column: loaded.columns.outcome,
            },
            chart: Chart { mime: format.mime().to_string(), bytes },
            summary: analysis.summary,
        })
    }
}

/// A chart that cannot be drawn is a fatal, non-enumerated failure.
fn render_error(e: RenderError) -> Error {
    Error::Computation(format!("chart rendering failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn engine_is_shareable() {
        assert_send_sync::<Engine>();
    }

    #[test]
    fn invalid_config_rejected_up_front() {
        let mut config = EngineConfig::default();
        config.source.timeout_secs = 0;
        assert_eq!(Engine::new(config).unwrap_err().kind(), "invalid_config");
    }

    #[test]
    fn render_errors_fold_into_computation() {
        let e = render_error(RenderError::Layout("boom".into()));
        assert_eq!(e.kind(), "computation");
        assert!(e.to_string().contains("boom"));
    }
}
