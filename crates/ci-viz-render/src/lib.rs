//! SVG/PNG rendering for causal impact chart artifacts.
//!
//! Pure Rust: charts are drawn onto an SVG [`canvas::Canvas`] and, with the
//! `png` feature, rasterized through `resvg`.

pub mod canvas;
pub mod color;
pub mod config;
pub mod font;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use ci_viz::ImpactChartArtifact;
use config::{ChartFormat, VizConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render the impact chart to an SVG document.
pub fn render_svg(artifact: &ImpactChartArtifact, config: &VizConfig) -> Result<String> {
    plots::impact::render(artifact, config)
}

/// Render an artifact serialized as JSON (see [`ci_viz::IMPACT_CHART_SCHEMA`]).
pub fn render_json(artifact_json: &str, config: &VizConfig) -> Result<String> {
    let artifact: ImpactChartArtifact = serde_json::from_str(artifact_json)?;
    render_svg(&artifact, config)
}

/// Render the impact chart and encode it as `format`.
pub fn render_to_bytes(
    artifact: &ImpactChartArtifact,
    format: ChartFormat,
    config: &VizConfig,
) -> Result<Vec<u8>> {
    let svg = render_svg(artifact, config)?;
    match format {
        ChartFormat::Svg => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        ChartFormat::Png => output::png::svg_to_png(&svg, config.output.dpi),
        #[cfg(not(feature = "png"))]
        ChartFormat::Png => {
            Err(RenderError::Config("PNG output requires the `png` feature".into()))
        }
    }
}

/// Render to a file; the format follows the extension (`.svg`, otherwise PNG).
pub fn render_to_file(
    artifact: &ImpactChartArtifact,
    path: &std::path::Path,
    config: &VizConfig,
) -> Result<()> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.parse()?,
        None => config.output.format,
    };
    let bytes = render_to_bytes(artifact, format, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_json() -> String {
        serde_json::json!({
            "schema_version": ci_viz::IMPACT_CHART_SCHEMA,
            "title": "t",
            "timestamps": ["2024-01-01T00:00:00", "2024-01-02T00:00:00", "2024-01-03T00:00:00"],
            "x": [0.0, 1.0, 2.0],
            "actual": [1.0, 2.0, 3.5],
            "post_start_index": 2,
            "predicted": [3.0],
            "band_lo": [2.8],
            "band_hi": [3.2],
            "boundary_x": 1.0,
            "boundary_label": "2024-01-02"
        })
        .to_string()
    }

    #[test]
    fn json_round_trip_renders() {
        let svg = render_json(&artifact_json(), &VizConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn bad_json_is_deserialize_error() {
        assert!(matches!(
            render_json("{}", &VizConfig::default()),
            Err(RenderError::Deserialize(_))
        ));
    }

    #[test]
    fn svg_bytes_are_utf8_svg() {
        let art: ImpactChartArtifact = serde_json::from_str(&artifact_json()).unwrap();
        let bytes = render_to_bytes(&art, ChartFormat::Svg, &VizConfig::default()).unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().contains("</svg>"));
    }

    #[test]
    fn file_extension_selects_format() {
        let art: ImpactChartArtifact = serde_json::from_str(&artifact_json()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        render_to_file(&art, &path, &VizConfig::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
        assert!(render_to_file(&art, &dir.path().join("chart.gif"), &VizConfig::default()).is_err());
    }
}
