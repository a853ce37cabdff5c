use chrono::NaiveDateTime;
use ci_core::{Error, ImpactSummary, Period, Result, TimeSeriesTable};
use serde::{Deserialize, Serialize};

/// Schema tag written into every [`ImpactChartArtifact`].
pub const IMPACT_CHART_SCHEMA: &str = "causalimpact_chart_v0";

/// Plot-friendly artifact for the actual vs. counterfactual chart.
///
/// `x` is the horizontal coordinate of every record in days since the first
/// record. The post-period arrays (`predicted`, `band_lo`, `band_hi`) align
/// with `x[post_start_index..]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactChartArtifact {
    /// Schema tag ([`IMPACT_CHART_SCHEMA`]).
    pub schema_version: String,
    /// Chart title.
    pub title: String,
    /// ISO-8601 timestamp of every record.
    pub timestamps: Vec<String>,
    /// Days since the first record, per record.
    pub x: Vec<f64>,
    /// Observed outcome, per record.
    pub actual: Vec<f64>,
    /// Index of the first post-period record.
    pub post_start_index: usize,
    /// Counterfactual outcome over the post-period.
    pub predicted: Vec<f64>,
    /// `predicted - standard_error`.
    pub band_lo: Vec<f64>,
    /// `predicted + standard_error`.
    pub band_hi: Vec<f64>,
    /// Horizontal position of the intervention marker.
    pub boundary_x: f64,
    /// Date printed next to the intervention marker.
    pub boundary_label: String,
}

impl ImpactChartArtifact {
    /// `x` restricted to the post-period.
    pub fn post_x(&self) -> &[f64] {
        self.x.get(self.post_start_index..).unwrap_or(&[])
    }

    /// Smallest and largest value any series reaches (for axis scaling).
    pub fn y_extent(&self) -> (f64, f64) {
        self.actual
            .iter()
            .chain(&self.predicted)
            .chain(&self.band_lo)
            .chain(&self.band_hi)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Build the chart artifact for one analysis.
///
/// `predicted` must hold one value per `post` record.
pub fn impact_chart_artifact(
    title: &str,
    table: &TimeSeriesTable,
    post: &Period,
    predicted: &[f64],
    boundary: NaiveDateTime,
    summary: &ImpactSummary,
) -> Result<ImpactChartArtifact> {
    if predicted.len() != post.len() {
        return Err(Error::Computation(format!(
            "predicted has {} values for a post-period of {}",
            predicted.len(),
            post.len()
        )));
    }
    if post.end > table.len() {
        return Err(Error::Computation(format!(
            "post-period ends at {} beyond table length {}",
            post.end,
            table.len()
        )));
    }
    let t0 = table
        .get(0)
        .map(|r| r.timestamp)
        .ok_or_else(|| Error::Computation("cannot chart an empty table".into()))?;

    let rows = table.rows();
    let timestamps =
        rows.iter().map(|r| r.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()).collect();
    let x = rows.iter().map(|r| days_between(t0, r.timestamp)).collect();
    let actual = rows.iter().map(|r| r.outcome).collect();

    let se = summary.standard_error;
    let band_lo = predicted.iter().map(|p| p - se).collect();
    let band_hi = predicted.iter().map(|p| p + se).collect();

    Ok(ImpactChartArtifact {
        schema_version: IMPACT_CHART_SCHEMA.to_string(),
        title: title.to_string(),
        timestamps,
        x,
        actual,
        post_start_index: post.start,
        predicted: predicted.to_vec(),
        band_lo,
        band_hi,
        boundary_x: days_between(t0, boundary),
        boundary_label: boundary_label(boundary),
    })
}

fn days_between(t0: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - t0).num_seconds() as f64 / 86_400.0
}

fn boundary_label(ts: NaiveDateTime) -> String {
    if ts.time() == chrono::NaiveTime::default() {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}
