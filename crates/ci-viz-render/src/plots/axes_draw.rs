use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Box frame with ticks, optional grid, tick labels and axis captions.
pub(crate) fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let frame_color = Color::rgb(0, 0, 0);
    let frame_style = LineStyle::solid(frame_color, 0.8);
    let tick_line = LineStyle::solid(frame_color, 0.6);
    let minor_line = LineStyle::solid(frame_color, 0.4);
    let grid_style = LineStyle {
        color: config.grid.color.with_alpha(config.grid.alpha),
        width: 0.5,
        dash: Dash::Dotted,
    };

    let inward = config.axes.tick_direction == "in";
    // Signed tick offset pointing away from the plot for "out".
    let tl = if inward { -config.axes.tick_length } else { config.axes.tick_length };
    let mtl = if inward { -config.axes.minor_tick_length } else { config.axes.minor_tick_length };

    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    let x_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    let x_inside = |px: f64| px >= area.left - 0.5 && px <= area.right() + 0.5;

    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if !x_inside(px) {
            continue;
        }
        if config.grid.show {
            canvas.line(px, area.top, px, area.bottom(), &grid_style);
        }
        canvas.line(px, area.bottom(), px, area.bottom() + tl, &tick_line);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top - tl, &tick_line);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            canvas.text(px, area.bottom() + tl.max(0.0) + 3.0, label, &x_label_style);
        }
    }
    for &val in &x_axis.minor_ticks {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if x_inside(px) {
            canvas.line(px, area.bottom(), px, area.bottom() + mtl, &minor_line);
        }
    }

    let y_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let y_inside = |py: f64| py >= area.top - 0.5 && py <= area.bottom() + 0.5;

    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if !y_inside(py) {
            continue;
        }
        if config.grid.show {
            canvas.line(area.left, py, area.right(), py, &grid_style);
        }
        canvas.line(area.left, py, area.left - tl, py, &tick_line);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() + tl, py, &tick_line);
        }
        if let Some(label) = y_axis.tick_labels.get(i) {
            canvas.text(area.left - tl.max(0.0) - 4.0, py, label, &y_label_style);
        }
    }
    for &val in &y_axis.minor_ticks {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if y_inside(py) {
            canvas.line(area.left, py, area.left - mtl, py, &minor_line);
        }
    }

    let caption_style = TextStyle {
        size: config.font.label_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };

    if !x_axis.label.is_empty() {
        let y = area.bottom() + tl.max(0.0) + config.font.tick_size + config.font.label_size + 6.0;
        canvas.text(area.left + area.width / 2.0, y, &x_axis.label, &caption_style);
    }

    if !y_axis.label.is_empty() {
        let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };
        let widest = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let x = area.left - tl.max(0.0) - widest - 8.0 - config.font.label_size / 2.0;
        canvas.text_rotated(x, area.top + area.height / 2.0, &y_axis.label, &caption_style, -90.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(config: &VizConfig) -> String {
        let mut c = Canvas::new(400.0, 300.0, "sans-serif").unwrap();
        let area = PlotArea::manual(60.0, 20.0, 320.0, 240.0);
        let x = Axis::auto_linear(0.0, 10.0, 5).with_label("Date");
        let y = Axis::auto_linear(0.0, 100.0, 5).with_label("Outcome");
        draw_axes(&mut c, &area, &x, &y, config);
        c.finish_svg().unwrap()
    }

    #[test]
    fn captions_and_ticks_drawn() {
        let svg = draw(&VizConfig::default());
        assert!(svg.contains(">Date</text>"));
        assert!(svg.contains(">Outcome</text>"));
        assert!(svg.contains(">100</text>"));
        assert!(svg.contains("rotate(-90.0"));
    }

    #[test]
    fn grid_follows_config() {
        let mut config = VizConfig::default();
        let with_grid = draw(&config);
        config.grid.show = false;
        let without = draw(&config);
        assert!(with_grid.contains(r#"stroke-dasharray="2 2""#));
        assert!(!without.contains(r#"stroke-dasharray="2 2""#));
    }
}
