use std::fmt;

use ci_core::SplitPolicy;
use ci_source::ColumnSelection;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Analysis variants a dispatcher can select by tag.
///
/// The set is closed: a tag either names one of these or is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// First 40 records fit the model; named columns, then positional.
    #[default]
    CausalImpact,
    /// First half fits the model; positional columns.
    CausalImpactHalf,
}

impl ReportKind {
    /// Every registered kind.
    pub const ALL: [ReportKind; 2] = [ReportKind::CausalImpact, ReportKind::CausalImpactHalf];

    /// Stable tag.
    pub fn tag(self) -> &'static str {
        match self {
            ReportKind::CausalImpact => "causal_impact",
            ReportKind::CausalImpactHalf => "causal_impact_half",
        }
    }

    /// Look a kind up by tag (case-insensitive, `-` accepted for `_`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let norm = tag.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.tag() == norm)
    }

    /// Title used when the caller supplies none.
    pub fn default_title(self) -> &'static str {
        match self {
            ReportKind::CausalImpact => "Causal Impact Analysis",
            ReportKind::CausalImpactHalf => "Causal Impact (50/50 split)",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            ReportKind::CausalImpact => {
                "fixed split after 40 records; control/conversions columns by name, else by position"
            }
            ReportKind::CausalImpactHalf => "proportional 50/50 split; columns by position",
        }
    }

    /// `base` with this kind's split policy and column selection applied.
    pub fn engine_config(self, base: &EngineConfig) -> EngineConfig {
        let (split, columns) = match self {
            ReportKind::CausalImpact => {
                (SplitPolicy::FixedCount(SplitPolicy::DEFAULT_PRE_COUNT), ColumnSelection::Auto)
            }
            ReportKind::CausalImpactHalf => {
                (SplitPolicy::Proportional(SplitPolicy::DEFAULT_RATIO), ColumnSelection::Positional)
            }
        };
        EngineConfig { split, columns, ..base.clone() }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
