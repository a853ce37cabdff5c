use std::path::Path;

use ci_core::{Error, Result, SplitPolicy};
use ci_viz_render::config::resolve_config_value;
use serde::{Deserialize, Serialize};

pub use ci_source::{ColumnSelection, DuplicatePolicy, SourceConfig};
pub use ci_viz_render::config::{ChartFormat, VizConfig};

/// Everything the pipeline can be tuned with.
///
/// ```yaml
/// split: { proportional: 0.5 }
/// columns: positional
/// source: { timeout_secs: 30, duplicates: reject }
/// viz: { theme: print, output: { format: svg } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pre/post partition.
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub split: SplitPolicy,
    /// Covariate/outcome column lookup.
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub columns: ColumnSelection,
    /// Loader settings.
    pub source: SourceConfig,
    /// Chart settings. A `theme` key inside selects the preset the rest
    /// overrides.
    pub viz: VizConfig,
}

impl EngineConfig {
    /// Read a config file: JSON for `.json`, YAML otherwise.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read config {}: {e}", path.display()))
        })?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
        let value: serde_yaml_ng::Value = if ext == "json" {
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
            serde_yaml_ng::to_value(json).map_err(|e| Error::InvalidConfig(e.to_string()))?
        } else {
            serde_yaml_ng::from_slice(&bytes)
                .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?
        };
        Self::from_value(value)
    }

    /// Build from a YAML document held in memory.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let value: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Self::from_value(value)
    }

    fn from_value(mut value: serde_yaml_ng::Value) -> Result<Self> {
        // `viz` is resolved against its theme preset, not plain field defaults.
        let is_null = value.is_null();
        let viz_value = match value.as_mapping_mut() {
            Some(map) => map.remove("viz"),
            None if is_null => None,
            None => return Err(Error::InvalidConfig("engine config must be a mapping".into())),
        };
        let mut config: EngineConfig = if value.is_null() {
            EngineConfig::default()
        } else {
            serde_yaml_ng::from_value(value).map_err(|e| Error::InvalidConfig(e.to_string()))?
        };
        if let Some(v) = viz_value {
            config.viz = resolve_config_value(&v).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        match self.split {
            SplitPolicy::FixedCount(0) => {
                return Err(Error::InvalidConfig("split.fixed_count must be > 0".into()));
            }
            SplitPolicy::Proportional(r) if !(r > 0.0 && r < 1.0) => {
                return Err(Error::InvalidConfig(format!(
                    "split.proportional must lie in (0, 1), got {r}"
                )));
            }
            _ => {}
        }
        self.source.validate()?;
        self.viz.validate().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let c = EngineConfig::from_yaml_str("").unwrap();
        assert_eq!(c.split, SplitPolicy::FixedCount(40));
        assert_eq!(c.columns, ColumnSelection::Auto);
        assert_eq!(c.viz.theme, "causalimpact");
    }

    #[test]
    fn sections_parse() {
        let yaml = "split: { proportional: 0.5 }\n\
                    columns: positional\n\
                    source: { timeout_secs: 5, duplicates: reject }\n\
                    viz: { theme: print, output: { format: svg } }\n";
        let c = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.split, SplitPolicy::Proportional(0.5));
        assert_eq!(c.columns, ColumnSelection::Positional);
        assert_eq!(c.source.timeout_secs, 5);
        assert_eq!(c.source.duplicates, DuplicatePolicy::Reject);
        assert_eq!(c.viz.theme, "print");
        // Preset value kept under the override.
        assert_eq!(c.viz.output.dpi, 300);
        assert_eq!(c.viz.output.format, ChartFormat::Svg);
    }

    #[test]
    fn split_and_columns_as_maps() {
        let c = EngineConfig::from_yaml_str("split: { fixed_count: 10 }\n").unwrap();
        assert_eq!(c.split, SplitPolicy::FixedCount(10));

        let yaml = "columns:\n  named: { covariate: Spend, outcome: Sales }\n";
        let c = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            c.columns,
            ColumnSelection::Named { covariate: "Spend".into(), outcome: "Sales".into() }
        );
    }

    #[test]
    fn null_document_is_default() {
        let c = EngineConfig::from_yaml_str("~\n").unwrap();
        assert_eq!(c.split, SplitPolicy::FixedCount(40));
    }

    #[test]
    fn out_of_range_values_are_invalid_config() {
        for yaml in [
            "split: { proportional: 1.0 }\n",
            "split: { fixed_count: 0 }\n",
            "source: { timeout_secs: 0 }\n",
            "viz: { theme: neon }\n",
            "- not\n- a mapping\n",
        ] {
            let err = EngineConfig::from_yaml_str(yaml).unwrap_err();
            assert_eq!(err.kind(), "invalid_config", "{yaml}");
        }
    }

    #[test]
    fn json_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"split": {"fixed_count": 10}, "viz": {"figure": {"width": 400}}}"#)
            .unwrap();
        let c = EngineConfig::from_path(&path).unwrap();
        assert_eq!(c.split, SplitPolicy::FixedCount(10));
        assert_eq!(c.viz.figure.width, 400.0);
    }

    #[test]
    fn missing_file_is_invalid_config() {
        let err = EngineConfig::from_path(Path::new("/nonexistent/engine.yaml")).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }
}
