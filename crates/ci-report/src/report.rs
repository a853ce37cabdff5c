
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDateTime;
use ci_core::ImpactSummary;
use ci_inference::FittedModel;
use serde::{Deserialize, Serialize};

/// Fit diagnostics shown next to the impact summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Fitted intercept.
    pub intercept: f64,
    /// Fitted slope.
    pub slope: f64,
    /// Coefficient of determination over the pre-period.
    pub r_squared: f64,
    /// Residual standard error (`n - 2` degrees of freedom).
    pub residual_std_error: f64,
    /// Pre-period records used for the fit.
    pub n_obs: usize,
}

impl From<&FittedModel> for ModelSummary {
    fn from(m: &FittedModel) -> Self {
        Self {
            intercept: m.intercept,
            slope: m.slope,
            r_squared: m.r_squared,
            residual_std_error: m.residual_std_error,
            n_obs: m.n_obs,
        }
    }
}

/// Where the data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Endpoint that was read.
    pub endpoint: String,
    /// SHA-256 of the bytes read.
    pub sha256: String,
    /// Covariate header, `None` for a univariate table.
    pub covariate_column: Option<String>,
    /// Outcome header.
    pub outcome_column: String,
}

/// Encoded chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    /// MIME type of `bytes`.
    pub mime: String,
    /// Encoded image.
    pub bytes: Vec<u8>,
}

impl Chart {
    /// `data:<mime>;base64,<payload>` for inline embedding.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// One finished analysis.
///
/// The engine keeps no reference to a report once it is returned.
#[derive(Debug, Clone)]
pub struct Report {
    /// Caller-chosen title, display only.
    pub title: String,
    /// Effect estimate.
    pub summary: ImpactSummary,
    /// Counterfactual fit diagnostics.
    pub model: ModelSummary,
    /// Pre-period length.
    pub n_pre: usize,
    /// Post-period length.
    pub n_post: usize,
    /// Timestamp of the last pre-period record.
    pub intervention: NaiveDateTime,
    /// Provenance of the input table.
    pub source: SourceSummary,
    /// Rendered chart.
    pub chart: Chart,
}

impl Report {
    /// Metric/value rows, values to two decimals.
    pub fn summary_rows(&self) -> [(&'static str, String); 3] {
        let s = &self.summary;
        [
            ("Avg. Lift", format!("{:.2}", s.average_lift)),
            ("Cumulative Lift", format!("{:.2}", s.cumulative_lift)),
            ("95% CI", format!("[{:.2}, {:.2}]", s.ci_low, s.ci_high)),
        ]
    }

    /// Chart as a data URI.
    pub fn chart_data_uri(&self) -> String {
        self.chart.data_uri()
    }

    /// Self-contained HTML page: title, summary table, inline chart.
    pub fn to_html(&self) -> String {
        let title = escape_html(&self.title);
        let rows: String = self
            .summary_rows()
            .into_iter()
            .map(|(metric, value)| {
                format!("      <tr><td>{metric}</td><td>{}</td></tr>\n", escape_html(&value))
            })
            .collect();
        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8"/>
    <title>{title}</title>
    <style>
      body {{ font-family: Arial, sans-serif; padding: 20px; }}
      table {{ border-collapse: collapse; width: 50%; margin-bottom: 20px; }}
      th, td {{ border: 1px solid #ccc; padding: 8px; text-align: right; }}
      th {{ background: #f5f5f5; }}
    </style>
  </head>
  <body>
    <h1>{title}</h1>
    <table>
      <tr><th>Metric</th><th>Value</th></tr>
{rows}    </table>
    <h2>Time Series Plot</h2>
    <img src="{uri}" alt="Causal Impact Plot"/>
  </body>
</html>
"#,
            uri = self.chart_data_uri(),
        )
    }

    /// Structured form, chart inlined as a data URI.
    pub fn to_json(&self) -> serde_json::Value {
        let table: serde_json::Map<String, serde_json::Value> = self
            .summary_rows()
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        serde_json::json!({
            "title": self.title,
            "summary": self.summary,
            "table": table,
            "model": self.model,
            "n_pre": self.n_pre,
            "n_post": self.n_post,
            "intervention": self.intervention.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "source": self.source,
            "chart": {
                "mime": self.chart.mime,
                "data_uri": self.chart_data_uri(),
            },
        })
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
