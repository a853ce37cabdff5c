use std::fmt::{self, Write as FmtWrite};
use std::sync::Arc;

use crate::font::{FontHandle, system_fonts};
use crate::primitives::*;
use crate::text::{TextMetrics, measure_styled};

/// An SVG element stored for deferred rendering.
#[derive(Debug, Clone)]
enum SvgElement {
    Rect { x: f64, y: f64, w: f64, h: f64, style: Style },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, style: LineStyle },
    Polyline { points: Vec<(f64, f64)>, style: LineStyle },
    Path { d: String, style: Style },
    Text { x: f64, y: f64, content: String, style: TextStyle, rotate: Option<f64> },
    Clipped { clip_id: String, child: Box<SvgElement> },
}

/// Immediate-mode SVG canvas. Coordinates in points (1pt = 1/72").
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    font_family: String,
    fonts: Arc<FontHandle>,
    elements: Vec<SvgElement>,
    defs: Vec<String>,
    clip_stack: Vec<String>,
    next_clip_id: usize,
}

impl Canvas {
    pub fn new(width: f64, height: f64, font_family: &str) -> crate::Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(crate::RenderError::Layout(format!(
                "figure size must be positive, got {width} x {height}"
            )));
        }
        Ok(Self {
            width,
            height,
            font_family: font_family.to_string(),
            fonts: system_fonts(font_family),
            elements: Vec::new(),
            defs: Vec::new(),
            clip_stack: Vec::new(),
            next_clip_id: 0,
        })
    }

    // --- Drawing primitives ---

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.push(SvgElement::Rect { x, y, w, h, style: style.clone() });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.push(SvgElement::Line { x1, y1, x2, y2, style: style.clone() });
    }

    /// Open polyline; non-finite points are dropped.
    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        let points: Vec<(f64, f64)> =
            points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()).collect();
        if points.len() < 2 {
            return;
        }
        self.push(SvgElement::Polyline { points, style: style.clone() });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    /// Fill between `y_lo` and `y_hi` at the given x positions (for bands).
    ///
    /// A single-point band is widened to a thin sliver so it stays visible.
    pub fn fill_between(&mut self, x: &[f64], y_lo: &[f64], y_hi: &[f64], style: &Style) {
        let n = x.len().min(y_lo.len()).min(y_hi.len());
        if n == 0 {
            return;
        }
        let (xs, lo, hi): (Vec<f64>, Vec<f64>, Vec<f64>) = if n == 1 {
            (vec![x[0] - 1.5, x[0] + 1.5], vec![y_lo[0]; 2], vec![y_hi[0]; 2])
        } else {
            (x[..n].to_vec(), y_lo[..n].to_vec(), y_hi[..n].to_vec())
        };

        let mut d = format!("M{:.2},{:.2}", xs[0], hi[0]);
        // Forward along the upper edge, back along the lower one.
        for i in 1..xs.len() {
            d.push_str(&format!(" L{:.2},{:.2}", xs[i], hi[i]));
        }
        for i in (0..xs.len()).rev() {
            d.push_str(&format!(" L{:.2},{:.2}", xs[i], lo[i]));
        }
        d.push('Z');
        self.push(SvgElement::Path { d, style: style.clone() });
    }

    // --- Clip paths ---

    /// Clip everything drawn until the matching [`Canvas::pop_clip`] to a rectangle.
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let id = format!("clip{}", self.next_clip_id);
        self.next_clip_id += 1;
        self.defs.push(format!(
            r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
        ));
        self.clip_stack.push(id.clone());
        id
    }

    pub fn pop_clip(&mut self) {
        self.clip_stack.pop();
    }

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_styled(&self.fonts, content, style)
    }

    // --- SVG output ---

    fn push(&mut self, elem: SvgElement) {
        let elem = match self.clip_stack.last() {
            Some(id) => SvgElement::Clipped { clip_id: id.clone(), child: Box::new(elem) },
            None => elem,
        };
        self.elements.push(elem);
    }

    pub fn finish_svg(&self) -> crate::Result<String> {
        let mut out = String::with_capacity(32 * 1024);
        self.write_svg(&mut out)
            .map_err(|e| crate::RenderError::Layout(format!("SVG serialization failed: {e}")))?;
        Ok(out)
    }

    fn write_svg(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        )?;

        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for d in &self.defs {
                out.push_str(d);
                out.push('\n');
            }
            out.push_str("</defs>\n");
        }

        writeln!(out, r#"<rect width="{}" height="{}" fill="white" />"#, self.width, self.height)?;

        for elem in &self.elements {
            self.render_element(out, elem)?;
        }

        out.push_str("</svg>\n");
        Ok(())
    }

    fn render_element(&self, out: &mut String, elem: &SvgElement) -> fmt::Result {
        match elem {
            SvgElement::Rect { x, y, w, h, style } => {
                write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#)?;
                write_style_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Line { x1, y1, x2, y2, style } => {
                write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#)?;
                write_line_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Polyline { points, style } => {
                out.push_str(r#"<polyline points=""#);
                for (i, (x, y)) in points.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    write!(out, "{x:.2},{y:.2}")?;
                }
                out.push_str(r#"" fill="none" stroke-linejoin="round""#);
                write_line_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Path { d, style } => {
                write!(out, r#"<path d="{d}""#)?;
                write_style_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Text { x, y, content, style, rotate } => {
                write!(out, r#"<text x="{x:.2}" y="{y:.2}""#)?;
                out.push_str(r#" font-family=""#);
                escape_xml_into(out, &self.font_family);
                write!(out, r#"" font-size="{:.1}""#, style.size)?;
                write!(out, r#" fill="{}""#, style.color.to_svg_fill())?;
                write!(out, r#" text-anchor="{}""#, style.anchor.as_str())?;
                write!(out, r#" dominant-baseline="{}""#, style.baseline.as_str())?;
                if style.weight == FontWeight::Bold {
                    out.push_str(r#" font-weight="bold""#);
                }
                if let Some(angle) = rotate {
                    write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#)?;
                }
                out.push('>');
                escape_xml_into(out, content);
                out.push_str("</text>\n");
            }
            SvgElement::Clipped { clip_id, child } => {
                write!(out, r#"<g clip-path="url(#{clip_id})">"#)?;
                self.render_element(out, child)?;
                out.push_str("</g>\n");
            }
        }
        Ok(())
    }
}

pub(crate) fn escape_xml_into(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn write_style_attrs(out: &mut String, style: &Style) -> fmt::Result {
    match &style.fill {
        Some(fill) => write!(out, r#" fill="{}""#, fill.to_svg_fill())?,
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        write!(out, r#" stroke="{}""#, stroke.to_svg_fill())?;
        write!(out, r#" stroke-width="{:.2}""#, style.stroke_width)?;
    }
    if (style.opacity - 1.0).abs() > 1e-4 {
        write!(out, r#" opacity="{:.3}""#, style.opacity)?;
    }
    Ok(())
}

fn write_line_attrs(out: &mut String, style: &LineStyle) -> fmt::Result {
    write!(out, r#" stroke="{}""#, style.color.to_svg_fill())?;
    write!(out, r#" stroke-width="{:.2}""#, style.width)?;
    if let Some(dash) = style.dash.dasharray() {
        write!(out, r#" stroke-dasharray="{dash}""#)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn canvas() -> Canvas {
        Canvas::new(200.0, 100.0, "sans-serif").unwrap()
    }

    #[test]
    fn empty_canvas() {
        let svg = Canvas::new(100.0, 50.0, "sans-serif").unwrap().finish_svg().unwrap();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn zero_size_rejected() {
        assert!(Canvas::new(0.0, 50.0, "x").is_err());
    }

    #[test]
    fn text_is_escaped() {
        let mut c = canvas();
        c.text(10.0, 20.0, "A & B <x>", &TextStyle::default());
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains("A &amp; B &lt;x&gt;"));
        assert!(svg.contains(r#"font-family="sans-serif""#));
    }

    #[test]
    fn dashed_polyline() {
        let mut c = canvas();
        c.polyline(&[(0.0, 0.0), (10.0, 5.0)], &LineStyle::dashed(Color::hex("#ff0000"), 1.0));
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains("<polyline points=\"0.00,0.00 10.00,5.00\""));
        assert!(svg.contains(r#"stroke-dasharray="6 3""#));
    }

    #[test]
    fn polyline_drops_non_finite_points() {
        let mut c = canvas();
        c.polyline(&[(0.0, f64::NAN), (10.0, 5.0)], &LineStyle::default());
        assert!(!c.finish_svg().unwrap().contains("<polyline"));
    }

    #[test]
    fn clipped_elements_are_wrapped() {
        let mut c = canvas();
        let id = c.push_clip(0.0, 0.0, 50.0, 50.0);
        c.line(0.0, 0.0, 100.0, 100.0, &LineStyle::default());
        c.pop_clip();
        c.line(0.0, 0.0, 1.0, 1.0, &LineStyle::default());
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains(&format!(r#"<clipPath id="{id}">"#)));
        assert_eq!(svg.matches("clip-path=").count(), 1);
    }

    #[test]
    fn band_path_is_closed() {
        let mut c = canvas();
        c.fill_between(&[0.0, 10.0], &[5.0, 5.0], &[1.0, 1.0], &Style::filled(Color::rgb(0, 0, 0)));
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains("<path d=\"M0.00,1.00 L10.00,1.00 L10.00,5.00 L0.00,5.00Z\""));
    }
}
