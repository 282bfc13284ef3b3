use std::sync::Arc;

use ab_glyph::{point, Font, FontVec, Glyph, GlyphId, Point, PxScale, ScaleFont};
use image::{Pixel, Rgba, RgbaImage};

/// Average advance of a character relative to the font size.
pub const APPROX_CHAR_WIDTH: f32 = 0.6;

/// Horizontal extent of a single line of text.
pub trait TextMeasure: Send + Sync {
    fn width(&self, text: &str, font_size: f32) -> f32;
}

/// `font_size × chars × 0.6`; good enough when no font is loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        font_size * text.chars().count() as f32 * APPROX_CHAR_WIDTH
    }
}

/// Exact advances from a loaded font.
#[derive(Clone)]
pub struct FontMeasure {
    font: Arc<FontVec>,
}

impl FontMeasure {
    pub fn new(font: Arc<FontVec>) -> Self {
        FontMeasure { font }
    }
}

impl TextMeasure for FontMeasure {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        text_to_glyphs(text, self.font.as_ref(), PxScale::from(font_size)).width
    }
}

#[derive(Clone, Debug)]
pub struct GlyphData {
    pub glyphs: Vec<Glyph>,
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// Lays `text` out on one line with the baseline at y = 0.
pub fn text_to_glyphs(text: &str, font: &FontVec, scale: PxScale) -> GlyphData {
    let scaled_font = font.as_scaled(scale);

    let mut glyphs: Vec<Glyph> = vec![];
    layout_line(&scaled_font, point(0.0, 0.0), text, &mut glyphs);

    let width = match (glyphs.first(), glyphs.last()) {
        (Some(first), Some(last)) => {
            last.position.x + scaled_font.h_advance(last.id) - first.position.x
        }
        _ => 0.0,
    };

    GlyphData {
        glyphs,
        width,
        ascent: scaled_font.ascent(),
        descent: scaled_font.descent(),
    }
}

/// Places glyphs left to right starting at `origin`, which sits on the baseline.
pub fn layout_line<F, SF>(font: &SF, origin: Point, text: &str, target: &mut Vec<Glyph>)
where
    F: Font,
    SF: ScaleFont<F>,
{
    let mut caret = origin;
    let mut last_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        if c.is_control() {
            continue;
        }

        let mut glyph = font.scaled_glyph(c);
        if let Some(previous) = last_glyph.take() {
            caret.x += font.kern(previous, glyph.id);
        }
        glyph.position = caret;
        last_glyph = Some(glyph.id);
        caret.x += font.h_advance(glyph.id);

        target.push(glyph);
    }
}

/// Draws `text` centred on `center`, blending `pixel` by glyph coverage.
/// Pixels outside the buffer are skipped.
pub fn draw_text_centered(
    buffer: &mut RgbaImage,
    text: &str,
    font: &FontVec,
    scale: PxScale,
    center: Point,
    pixel: Rgba<u8>,
) {
    let measured = text_to_glyphs(text, font, scale);
    let left = center.x - measured.width / 2.0;
    let baseline = center.y + (measured.ascent + measured.descent) / 2.0;
    let offset = point(left, baseline);

    let (width, height) = buffer.dimensions();
    for mut glyph in measured.glyphs {
        glyph.position = glyph.position + offset;
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();

        outlined.draw(|x, y, v| {
            let final_x = bounds.min.x as i64 + x as i64;
            let final_y = bounds.min.y as i64 + y as i64;
            if final_x < 0 || final_y < 0 || final_x >= width as i64 || final_y >= height as i64 {
                return;
            }
            let px = buffer.get_pixel_mut(final_x as u32, final_y as u32);
            px.apply2(&pixel, |old, new| {
                ((v * new as f32) + (1.0 - v) * old as f32) as u8
            });
            px.0[3] = 0xFF;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximate_width_scales_with_length_and_size() {
        let measure = ApproxMeasure;
        assert_eq!(measure.width("abcde", 10.0), 30.0);
        assert_eq!(measure.width("abcde", 20.0), 60.0);
        assert_eq!(measure.width("", 20.0), 0.0);
    }
}
