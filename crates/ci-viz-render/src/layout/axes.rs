use chrono::{Duration, NaiveDateTime};

/// Axis range, ticks and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

/// Candidate date tick spacings in days, with the label format each uses.
const DATE_STEPS: &[(f64, &str)] = &[
    (1.0 / 24.0, "%m-%d %H:%M"),
    (0.25, "%m-%d %H:%M"),
    (0.5, "%m-%d %H:%M"),
    (1.0, "%b %d"),
    (2.0, "%b %d"),
    (7.0, "%b %d"),
    (14.0, "%b %d"),
    (28.0, "%b %d"),
    (56.0, "%b %d"),
    (91.0, "%Y-%m"),
    (182.0, "%Y-%m"),
    (364.0, "%Y-%m"),
    (728.0, "%Y"),
];

impl Axis {
    /// Linear axis widened to "nice number" ticks.
    pub fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, step) = nice_range(data_min, data_max, target_ticks);
        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let n = ((nice_max - nice_min) / step).round() as usize;
        for i in 0..=n {
            let v = nice_min + i as f64 * step;
            ticks.push(v);
            labels.push(format_tick(v, step));
        }

        let minor_step = step / 2.0;
        let minor = (0..n).map(|i| nice_min + i as f64 * step + minor_step).collect();

        Self {
            min: nice_min,
            max: nice_max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Time axis over `[x_min, x_max]` days after `origin`.
    ///
    /// The range is kept exactly (a small pad is added on both sides); ticks
    /// land on multiples of a calendar-friendly step counted from `origin`.
    pub fn dates(x_min: f64, x_max: f64, origin: NaiveDateTime, target_ticks: usize) -> Self {
        let span = (x_max - x_min).max(1.0 / 24.0);
        let pad = span * 0.02;
        let (min, max) = (x_min - pad, x_max + pad);

        let rough = span / target_ticks.max(2) as f64;
        let (step, fmt) =
            DATE_STEPS.iter().copied().find(|(s, _)| *s >= rough).unwrap_or((rough.ceil(), "%Y"));

        let first = (min / step).ceil() as i64;
        let last = (max / step).floor() as i64;
        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        for k in first..=last {
            let x = k as f64 * step;
            ticks.push(x);
            let ts = origin + Duration::seconds((x * 86_400.0).round() as i64);
            labels.push(ts.format(fmt).to_string());
        }

        Self {
            min,
            max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to a pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }
}

/// "Nice numbers" range and step for about `target_ticks` ticks.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if !(data_min.is_finite() && data_max.is_finite()) {
        return (0.0, 1.0, 0.2);
    }
    if (data_max - data_min).abs() < 1e-12 * data_max.abs().max(1.0) {
        let half = data_min.abs().max(1.0) * 0.1;
        return nice_range(data_min - half, data_max + half, target_ticks);
    }
    let range = data_max - data_min;
    let rough_step = range / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    // Avoid "-0".
    let v = if value.abs() < step * 1e-6 { 0.0 } else { value };
    format!("{v:.decimals$}")
}
