use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::primitives::Dash;
use crate::theme::BuiltinTheme;

/// Top-level chart configuration (YAML/JSON or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub colors: ColorsConfig,
    pub labels: LabelsConfig,
    pub legend: LegendConfig,
    pub output: OutputConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::CausalImpact.base_config()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 720.0,  // 10" * 72
            height: 432.0, // 6" * 72
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// CSS font-family list written into the SVG.
    pub family: String,
    pub size: f64,
    pub title_size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "DejaVu Sans, Arial, Helvetica, sans-serif".into(),
            size: 10.0,
            title_size: 14.0,
            label_size: 11.0,
            tick_size: 8.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    /// `"in"` or `"out"`.
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
    pub target_x_ticks: usize,
    pub target_y_ticks: usize,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
            target_x_ticks: 7,
            target_y_ticks: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::hex("#CBD5E1"), alpha: 0.55 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub actual: Color,
    pub predicted: Color,
    pub band: Color,
    pub band_alpha: f64,
    pub intervention: Color,
    pub intervention_dash: Dash,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            actual: Color::hex("#1f77b4"),
            predicted: Color::hex("#ff7f0e"),
            band: Color::hex("#808080"),
            band_alpha: 0.2,
            intervention: Color::hex("#d62728"),
            intervention_dash: Dash::Dashed,
        }
    }
}

/// Series and axis captions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub x_axis: String,
    pub y_axis: String,
    pub actual: String,
    pub predicted: String,
    pub band: String,
    pub intervention: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            x_axis: "Date".into(),
            y_axis: "Outcome".into(),
            actual: "Actual".into(),
            predicted: "Predicted".into(),
            band: "Predicted \u{00B1} s.e.".into(),
            intervention: "Intervention".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub show: bool,
    pub frame: bool,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self { show: true, frame: true }
    }
}

/// Chart encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Raster, rasterized from the SVG.
    #[default]
    Png,
    /// Vector, as drawn.
    Svg,
}

impl ChartFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ChartFormat::Png => "image/png",
            ChartFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

impl FromStr for ChartFormat {
    type Err = crate::RenderError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ChartFormat::Png),
            "svg" => Ok(ChartFormat::Svg),
            other => Err(crate::RenderError::Config(format!(
                "unknown chart format {other:?} (expected png or svg)"
            ))),
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: ChartFormat,
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: ChartFormat::Png, dpi: 144 }
    }
}

impl VizConfig {
    /// Check ranges the renderer cannot work around.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.figure.width > 0.0 && self.figure.height > 0.0) {
            return Err(crate::RenderError::Config("figure width/height must be > 0".into()));
        }
        if !(1..=1200).contains(&self.output.dpi) {
            return Err(crate::RenderError::Config(format!(
                "output.dpi must lie in 1..=1200, got {}",
                self.output.dpi
            )));
        }
        if !(0.0..=1.0).contains(&self.colors.band_alpha) {
            return Err(crate::RenderError::Config("colors.band_alpha must lie in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Resolve a [`VizConfig`] from an optional YAML document.
///
/// A `theme:` key selects the preset the remaining keys are applied over
/// (default `causalimpact`). An empty document yields the preset unchanged.
pub fn resolve_config(user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let Some(yaml) = user_yaml else {
        return Ok(VizConfig::default());
    };
    let value: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(yaml).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    resolve_config_value(&value)
}

/// [`resolve_config`] for an already-parsed YAML/JSON value.
pub fn resolve_config_value(value: &serde_yaml_ng::Value) -> crate::Result<VizConfig> {
    let theme = match value.get("theme").and_then(|t| t.as_str()) {
        Some(name) => BuiltinTheme::parse(name)
            .ok_or_else(|| crate::RenderError::Config(format!("unknown theme {name:?}")))?,
        None => BuiltinTheme::CausalImpact,
    };
    let config = theme.apply_overrides(value)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_causalimpact_theme() {
        let c = VizConfig::default();
        assert_eq!(c.theme, "causalimpact");
        assert_eq!(c.output.format, ChartFormat::Png);
        c.validate().unwrap();
    }

    #[test]
    fn yaml_overrides_default_theme() {
        let c = resolve_config(Some("figure:\n  width: 300\noutput:\n  format: svg\n")).unwrap();
        assert_eq!(c.figure.width, 300.0);
        assert_eq!(c.figure.height, FigureConfig::default().height);
        assert_eq!(c.output.format, ChartFormat::Svg);
    }

    #[test]
    fn yaml_theme_key_selects_preset() {
        let c = resolve_config(Some("theme: print\ncolors:\n  band_alpha: 0.4\n")).unwrap();
        assert_eq!(c.theme, "print");
        assert!(!c.grid.show);
        assert_eq!(c.colors.band_alpha, 0.4);
        // Untouched keys keep the preset's value, not the global default.
        assert_eq!(c.colors.actual, BuiltinTheme::Print.base_config().colors.actual);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(resolve_config(Some("theme: neon\n")).is_err());
        assert!(resolve_config(Some("output:\n  dpi: 0\n")).is_err());
        assert!(resolve_config(Some("output:\n  format: gif\n")).is_err());
    }

    #[test]
    fn chart_format_parsing() {
        assert_eq!("PNG".parse::<ChartFormat>().unwrap(), ChartFormat::Png);
        assert_eq!(ChartFormat::Svg.mime(), "image/svg+xml");
        assert!("pdf".parse::<ChartFormat>().is_err());
    }
}
