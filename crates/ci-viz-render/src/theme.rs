use serde_yaml_ng::Value;

use crate::color::Color;
use crate::config::*;
use crate::primitives::Dash;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// Screen report default: matplotlib-like series colors, light grid.
    CausalImpact,
    /// Smaller figure, no grid, no legend frame.
    Minimal,
    /// Grayscale, inward ticks on all four sides; for printed reports.
    Print,
}

impl BuiltinTheme {
    pub const ALL: [BuiltinTheme; 3] =
        [BuiltinTheme::CausalImpact, BuiltinTheme::Minimal, BuiltinTheme::Print];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "causalimpact" | "default" => Some(Self::CausalImpact),
            "minimal" => Some(Self::Minimal),
            "print" => Some(Self::Print),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CausalImpact => "causalimpact",
            Self::Minimal => "minimal",
            Self::Print => "print",
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::CausalImpact => causalimpact(),
            Self::Minimal => minimal(),
            Self::Print => print(),
        }
    }

    /// Deep-merge a YAML/JSON mapping over this preset.
    pub fn apply_overrides(self, overrides: &Value) -> crate::Result<VizConfig> {
        let mut merged = serde_yaml_ng::to_value(self.base_config())
            .map_err(|e| crate::RenderError::Config(e.to_string()))?;
        merge(&mut merged, overrides);
        serde_yaml_ng::from_value(merged).map_err(|e| crate::RenderError::Config(e.to_string()))
    }
}

fn merge(base: &mut Value, over: &Value) {
    match (base, over) {
        (_, Value::Null) => {}
        (Value::Mapping(b), Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(k) {
                    Some(slot) => merge(slot, v),
                    None => {
                        b.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (b, o) => *b = o.clone(),
    }
}

fn causalimpact() -> VizConfig {
    VizConfig {
        theme: "causalimpact".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        colors: ColorsConfig::default(),
        labels: LabelsConfig::default(),
        legend: LegendConfig::default(),
        output: OutputConfig::default(),
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        figure: FigureConfig { width: 540.0, height: 324.0 },
        font: FontConfig {
            size: 9.0,
            title_size: 12.0,
            label_size: 10.0,
            tick_size: 8.0,
            ..FontConfig::default()
        },
        grid: GridConfig { show: false, ..GridConfig::default() },
        legend: LegendConfig { show: true, frame: false },
        ..causalimpact()
    }
}

fn print() -> VizConfig {
    VizConfig {
        theme: "print".into(),
        figure: FigureConfig { width: 576.0, height: 360.0 },
        axes: AxesConfig {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
            ..AxesConfig::default()
        },
        grid: GridConfig { show: false, ..GridConfig::default() },
        colors: ColorsConfig {
            actual: Color::hex("#111111"),
            predicted: Color::hex("#555555"),
            band: Color::hex("#999999"),
            band_alpha: 0.3,
            intervention: Color::hex("#000000"),
            intervention_dash: Dash::DashDot,
        },
        output: OutputConfig { dpi: 300, ..OutputConfig::default() },
        ..causalimpact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for t in BuiltinTheme::ALL {
            assert_eq!(BuiltinTheme::parse(t.name()), Some(t));
            assert_eq!(t.base_config().theme, t.name());
            t.base_config().validate().unwrap();
        }
        assert_eq!(BuiltinTheme::parse("nope"), None);
    }

    #[test]
    fn overrides_merge_deeply() {
        let over: Value = serde_yaml_ng::from_str("axes:\n  tick_length: 9\n").unwrap();
        let c = BuiltinTheme::Print.apply_overrides(&over).unwrap();
        assert_eq!(c.axes.tick_length, 9.0);
        assert_eq!(c.axes.tick_direction, "in");
        assert_eq!(c.output.dpi, 300);
    }
}
