use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Margins sized from the tick labels, axis captions and title.
    pub fn auto(canvas: &Canvas, y_axis: &Axis, x_axis: &Axis, title: &str, config: &VizConfig) -> Self {
        let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };
        let label_style = TextStyle { size: config.font.label_size, ..Default::default() };
        let tl = config.axes.tick_length;

        let max_tick_w = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let mut left = 12.0 + max_tick_w + tl + 4.0;
        if !y_axis.label.is_empty() {
            left += label_style.size + 8.0;
        }

        let mut bottom = 12.0 + tl + tick_style.size + 4.0;
        if !x_axis.label.is_empty() {
            bottom += label_style.size + 6.0;
        }

        let top = if title.is_empty() { 14.0 } else { config.font.title_size * 1.4 + 14.0 };

        // Half of the last x tick label may hang over the frame.
        let last_tick_w = x_axis
            .tick_labels
            .last()
            .map(|l| canvas.measure_text(l, &tick_style).width / 2.0)
            .unwrap_or(0.0);
        let right = 15.0_f64.max(last_tick_w + 4.0);

        let width = canvas.width - left - right;
        let height = canvas.height - top - bottom;

        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }

    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}
