//! Antialiased text on an [`RgbImage`] using a [`FontSet`].
//!
//! Characters no font covers are drawn as a box holding their hex code point, so
//! distinct text never collapses into identical marks.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgb, RgbImage};

use super::fonts::FontSet;

/// Hex digits inside a missing-glyph box, relative to the text size.
const HEX_RATIO: f32 = 0.45;

pub struct TextPainter<'a> {
    fonts: &'a FontSet,
    px: f32,
}

impl<'a> TextPainter<'a> {
    pub fn new(fonts: &'a FontSet, px: f32) -> Self {
        Self { fonts, px }
    }

    fn ascent(&self) -> f32 {
        self.fonts
            .primary()
            .map(|f| f.as_scaled(self.px).ascent())
            .unwrap_or(self.px)
    }

    pub fn line_height(&self) -> f32 {
        self.fonts
            .primary()
            .map(|f| f.as_scaled(self.px).height())
            .unwrap_or(self.px * 1.2)
    }

    pub fn width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.advance(c)).sum()
    }

    fn advance(&self, c: char) -> f32 {
        match self.fonts.lookup(c) {
            Some((font, id)) => font.as_scaled(self.px).h_advance(id),
            None => self.missing_width(c),
        }
    }

    fn hex_painter(&self) -> TextPainter<'a> {
        TextPainter::new(self.fonts, self.px * HEX_RATIO)
    }

    /// Width of the hex digits alone. Digits no font has count as blank space.
    fn label_width(&self, label: &str) -> f32 {
        label
            .chars()
            .map(|d| match self.fonts.lookup(d) {
                Some((font, id)) => font.as_scaled(self.px).h_advance(id),
                None => self.px * 0.6,
            })
            .sum()
    }

    fn missing_width(&self, c: char) -> f32 {
        self.hex_painter().label_width(&hex_label(c)) + self.px * 0.4
    }

    /// Draws `text` with its line box starting at (`x`, `top`).
    pub fn draw(&self, image: &mut RgbImage, x: f32, top: f32, text: &str, color: Rgb<u8>) {
        let baseline = top + self.ascent();
        let mut pen = x;
        for c in text.chars() {
            match self.fonts.lookup(c) {
                Some((font, id)) => {
                    self.draw_glyph(image, font, id, pen, baseline, color);
                    pen += font.as_scaled(self.px).h_advance(id);
                }
                None => {
                    self.draw_missing(image, c, pen, top, color);
                    pen += self.missing_width(c);
                }
            }
        }
    }

    fn draw_glyph(
        &self,
        image: &mut RgbImage,
        font: &FontArc,
        id: GlyphId,
        x: f32,
        baseline: f32,
        color: Rgb<u8>,
    ) {
        let glyph = id.with_scale_and_position(PxScale::from(self.px), point(x, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            return;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            blend(
                image,
                bounds.min.x as i64 + gx as i64,
                bounds.min.y as i64 + gy as i64,
                color,
                coverage,
            );
        });
    }

    fn draw_missing(&self, image: &mut RgbImage, c: char, x: f32, top: f32, color: Rgb<u8>) {
        let width = self.missing_width(c);
        let inset = (self.px * 0.1).max(1.0);
        let (x0, x1) = (x + inset, x + width - inset);
        let (y0, y1) = (top + inset, top + self.ascent());
        let stroke = (self.px / 16.0).max(1.0);
        fill(image, x0, y0, x1 - x0, stroke, color);
        fill(image, x0, y1 - stroke, x1 - x0, stroke, color);
        fill(image, x0, y0, stroke, y1 - y0, color);
        fill(image, x1 - stroke, y0, stroke, y1 - y0, color);

        let hex = self.hex_painter();
        let label = hex_label(c);
        let mut pen = x + (width - hex.label_width(&label)) / 2.0;
        let baseline = y0 + ((y1 - y0) - hex.line_height()) / 2.0 + hex.ascent();
        for d in label.chars() {
            match self.fonts.lookup(d) {
                Some((font, id)) => {
                    hex.draw_glyph(image, font, id, pen, baseline, color);
                    pen += font.as_scaled(hex.px).h_advance(id);
                }
                None => pen += hex.px * 0.6,
            }
        }
    }
}

fn hex_label(c: char) -> String {
    format!("{:04X}", c as u32)
}

fn fill(image: &mut RgbImage, x: f32, y: f32, w: f32, h: f32, color: Rgb<u8>) {
    let (x0, y0) = (x.round() as i64, y.round() as i64);
    let (x1, y1) = ((x + w).round() as i64, (y + h).round() as i64);
    for py in y0..y1.max(y0 + 1) {
        for px in x0..x1.max(x0 + 1) {
            blend(image, px, py, color, 1.0);
        }
    }
}

/// Mixes `color` over the existing pixel by `coverage`, ignoring points off the image.
fn blend(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0) {
        *dst = (*dst as f32 * (1.0 - a) + src as f32 * a).round() as u8;
    }
}
