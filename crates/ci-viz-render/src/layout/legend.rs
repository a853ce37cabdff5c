use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

pub enum LegendKind {
    FilledRect,
    Line(Dash),
}

/// Draw a legend box in the top-left corner of the plot area.
///
/// Top-left keeps it clear of the post-period, where the series diverge.
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    font_size: f64,
    frame: bool,
) {
    if entries.is_empty() {
        return;
    }

    let row_height = font_size + 4.0;
    let swatch_w = 16.0;
    let swatch_h = (font_size - 2.0).max(4.0);
    let gap = 6.0;
    let padding = 6.0;

    let text_style =
        TextStyle { size: font_size * 0.85, baseline: TextBaseline::Central, ..Default::default() };

    let max_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, &text_style).width)
        .fold(0.0_f64, f64::max);

    let legend_w = padding + swatch_w + gap + max_w + padding;
    let legend_h = padding + entries.len() as f64 * row_height + padding;
    let lx = area.left + 5.0;
    let ly = area.top + 5.0;

    let bg_style = Style {
        fill: Some(Color::rgba(255, 255, 255, 0.85)),
        stroke: if frame { Some(Color::rgb(200, 200, 200)) } else { None },
        stroke_width: 0.5,
        opacity: 1.0,
    };
    canvas.rect(lx, ly, legend_w, legend_h, &bg_style);

    for (i, entry) in entries.iter().enumerate() {
        let ey = ly + padding + i as f64 * row_height + row_height / 2.0;
        let sx = lx + padding;

        match entry.kind {
            LegendKind::FilledRect => {
                canvas.rect(sx, ey - swatch_h / 2.0, swatch_w, swatch_h, &Style::filled(entry.color));
            }
            LegendKind::Line(dash) => {
                let ls = LineStyle { color: entry.color, width: 1.5, dash };
                canvas.line(sx, ey, sx + swatch_w, ey, &ls);
            }
        }

        canvas.text(sx + swatch_w + gap, ey, &entry.label, &text_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PlotArea {
        PlotArea::manual(50.0, 30.0, 400.0, 250.0)
    }

    #[test]
    fn one_row_per_entry() {
        let mut c = Canvas::new(500.0, 300.0, "sans-serif").unwrap();
        let entries = vec![
            LegendEntry { label: "Actual".into(), color: Color::rgb(0, 0, 255), kind: LegendKind::Line(Dash::Solid) },
            LegendEntry { label: "Band".into(), color: Color::rgb(128, 128, 128), kind: LegendKind::FilledRect },
        ];
        draw_legend(&mut c, &area(), &entries, 10.0, true);
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains(">Actual</text>"));
        assert!(svg.contains(">Band</text>"));
        // Frame stroke present.
        assert!(svg.contains(r##"stroke="#c8c8c8""##));
    }

    #[test]
    fn empty_legend_draws_nothing() {
        let mut c = Canvas::new(500.0, 300.0, "sans-serif").unwrap();
        let before = c.finish_svg().unwrap();
        draw_legend(&mut c, &area(), &[], 10.0, true);
        assert_eq!(c.finish_svg().unwrap(), before);
    }
}
