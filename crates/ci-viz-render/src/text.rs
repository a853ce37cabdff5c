//! Text extents for layout.
//!
//! Widths come from glyph advances of a system face when one matches the
//! canvas font-family list. Without one they are estimated from per-class
//! advance factors calibrated on common sans-serif faces.

use ab_glyph::{Font, FontArc, ScaleFont};

use crate::font::FontHandle;
use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Measure text width and height in points using ab_glyph.
pub fn measure_text(font: &FontArc, text: &str, size_pt: f64) -> TextMetrics {
    let scale = ab_glyph::PxScale::from(size_pt as f32);
    let scaled = font.as_scaled(scale);

    let mut width: f32 = 0.0;
    let mut prev_glyph_id = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = prev_glyph_id {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph_id = Some(glyph_id);
    }

    let ascent = scaled.ascent();
    let height = ascent - scaled.descent();

    TextMetrics { width: width as f64, height: height as f64, ascent: ascent as f64 }
}

/// Measure with the face matching `style`, estimating when there is none.
pub fn measure_styled(fonts: &FontHandle, text: &str, style: &TextStyle) -> TextMetrics {
    match fonts.select(style.weight) {
        Some(font) => measure_text(font, text, style.size),
        None => estimate_text(text, style),
    }
}

/// Advance of one character in ems.
fn advance_em(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | ' ' | '-' => 0.35,
        'm' | 'w' | 'M' | 'W' | '%' | '@' => 0.85,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_digit() => 0.56,
        _ => 0.54,
    }
}

/// Font-free estimate of the rendered extent of `text` in points.
pub fn estimate_text(text: &str, style: &TextStyle) -> TextMetrics {
    let bold = if style.weight == FontWeight::Bold { 1.06 } else { 1.0 };
    let em: f64 = text.chars().map(advance_em).sum();
    TextMetrics { width: em * style.size * bold, height: style.size * 1.2, ascent: style.size * 0.93 }
}
