use chrono::NaiveDateTime;
use ci_viz::ImpactChartArtifact;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::legend::{LegendEntry, LegendKind, draw_legend};
use crate::layout::margins::PlotArea;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;

/// Actual vs. counterfactual chart.
///
/// Draw order: band, actual, predicted, intervention marker, legend. The
/// band sits underneath so both lines stay readable through it.
pub fn render(artifact: &ImpactChartArtifact, config: &VizConfig) -> crate::Result<String> {
    if artifact.x.is_empty() || artifact.x.len() != artifact.actual.len() {
        return Err(crate::RenderError::Layout(format!(
            "chart needs one actual value per record, got {} x / {} actual",
            artifact.x.len(),
            artifact.actual.len()
        )));
    }
    let post_x = artifact.post_x();
    if post_x.len() != artifact.predicted.len() {
        return Err(crate::RenderError::Layout(format!(
            "{} post-period records but {} predicted values",
            post_x.len(),
            artifact.predicted.len()
        )));
    }

    let mut canvas = Canvas::new(config.figure.width, config.figure.height, &config.font.family)?;

    let x_min = artifact.x.first().copied().unwrap_or(0.0);
    let x_max = artifact.x.last().copied().unwrap_or(1.0);
    let origin = artifact
        .timestamps
        .first()
        .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S").ok());
    let x_axis = match origin {
        Some(t0) => Axis::dates(x_min, x_max, t0, config.axes.target_x_ticks),
        None => Axis::auto_linear(x_min, x_max, config.axes.target_x_ticks),
    }
    .with_label(&config.labels.x_axis);

    let (y_lo, y_hi) = artifact.y_extent();
    let y_axis = Axis::auto_linear(y_lo, y_hi, config.axes.target_y_ticks).with_label(&config.labels.y_axis);

    let area = PlotArea::auto(&canvas, &y_axis, &x_axis, &artifact.title, config);

    if !artifact.title.is_empty() {
        let title_style = TextStyle {
            size: config.font.title_size,
            weight: FontWeight::Bold,
            anchor: TextAnchor::Middle,
            ..Default::default()
        };
        canvas.text(
            area.left + area.width / 2.0,
            config.font.title_size * 1.2 + 4.0,
            &artifact.title,
            &title_style,
        );
    }

    draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);

    let px = |x: f64| x_axis.data_to_pixel(x, area.left, area.right());
    let py = |y: f64| y_axis.data_to_pixel(y, area.bottom(), area.top);

    canvas.push_clip(area.left, area.top, area.width, area.height);

    let band_x: Vec<f64> = post_x.iter().map(|&x| px(x)).collect();
    let band_lo: Vec<f64> = artifact.band_lo.iter().map(|&y| py(y)).collect();
    let band_hi: Vec<f64> = artifact.band_hi.iter().map(|&y| py(y)).collect();
    canvas.fill_between(
        &band_x,
        &band_lo,
        &band_hi,
        &Style::filled(config.colors.band.with_alpha(config.colors.band_alpha)),
    );

    let actual: Vec<(f64, f64)> =
        artifact.x.iter().zip(&artifact.actual).map(|(&x, &y)| (px(x), py(y))).collect();
    canvas.polyline(&actual, &LineStyle::solid(config.colors.actual, 1.5));

    let predicted: Vec<(f64, f64)> =
        post_x.iter().zip(&artifact.predicted).map(|(&x, &y)| (px(x), py(y))).collect();
    canvas.polyline(&predicted, &LineStyle::dashed(config.colors.predicted, 1.5));

    let bx = px(artifact.boundary_x);
    let marker = LineStyle::solid(config.colors.intervention, 1.0).with_dash(config.colors.intervention_dash);
    canvas.line(bx, area.top, bx, area.bottom(), &marker);

    canvas.pop_clip();

    if !artifact.boundary_label.is_empty() {
        let label_style = TextStyle {
            size: config.font.tick_size,
            color: config.colors.intervention,
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Hanging,
            ..Default::default()
        };
        canvas.text(bx + 3.0, area.top + 3.0, &artifact.boundary_label, &label_style);
    }

    if config.legend.show {
        let entries = [
            LegendEntry {
                label: config.labels.actual.clone(),
                color: config.colors.actual,
                kind: LegendKind::Line(Dash::Solid),
            },
            LegendEntry {
                label: config.labels.predicted.clone(),
                color: config.colors.predicted,
                kind: LegendKind::Line(Dash::Dashed),
            },
            LegendEntry {
                label: config.labels.band.clone(),
                color: config.colors.band.with_alpha(config.colors.band_alpha),
                kind: LegendKind::FilledRect,
            },
            LegendEntry {
                label: config.labels.intervention.clone(),
                color: config.colors.intervention,
                kind: LegendKind::Line(config.colors.intervention_dash),
            },
        ];
        draw_legend(&mut canvas, &area, &entries, config.font.size, config.legend.frame);
    }

    canvas.finish_svg()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ImpactChartArtifact {
        let n = 10;
        let post_start_index = 6;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let actual: Vec<f64> = x.iter().map(|v| 10.0 + 2.0 * v).collect();
        let predicted: Vec<f64> = x[post_start_index..].iter().map(|v| 9.0 + 2.0 * v).collect();
        ImpactChartArtifact {
            schema_version: ci_viz::IMPACT_CHART_SCHEMA.into(),
            title: "Signup impact".into(),
            timestamps: (1..=n).map(|d| format!("2024-03-{d:02}T00:00:00")).collect(),
            x,
            actual,
            post_start_index,
            band_lo: predicted.iter().map(|p| p - 0.5).collect(),
            band_hi: predicted.iter().map(|p| p + 0.5).collect(),
            predicted,
            boundary_x: 5.0,
            boundary_label: "2024-03-06".into(),
        }
    }

    #[test]
    fn renders_all_layers() {
        let svg = render(&artifact(), &VizConfig::default()).unwrap();
        assert!(svg.contains(">Signup impact</text>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("<path d=\"M"));
        assert!(svg.contains(">2024-03-06</text>"));
        assert!(svg.contains(">Intervention</text>"));
        assert!(svg.contains(">Mar 01</text>"));
    }

    #[test]
    fn legend_can_be_hidden() {
        let mut config = VizConfig::default();
        config.legend.show = false;
        let svg = render(&artifact(), &config).unwrap();
        assert!(!svg.contains(">Predicted</text>"));
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let mut art = artifact();
        art.predicted.pop();
        assert!(matches!(render(&art, &VizConfig::default()), Err(crate::RenderError::Layout(_))));
    }

    #[test]
    fn unparsable_timestamps_fall_back_to_numeric_axis() {
        let mut art = artifact();
        art.timestamps.clear();
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(!svg.contains(">Mar 01</text>"));
    }
}
