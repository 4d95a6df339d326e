//! Draws a [`PreviewTable`] into an RGB image.
//!
//! Layout is measured in logical pixels and multiplied by the export scale, so a scale
//! of 2 doubles every dimension. Text is drawn at the scaled size, not upsampled.

use image::{Rgb, RgbImage};

use super::fonts::FontSet;
use super::text::TextPainter;
use crate::preview::PreviewTable;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const HEADER_FILL: Rgb<u8> = Rgb([236, 239, 244]);
const GRID_LINE: Rgb<u8> = Rgb([64, 64, 64]);
const TEXT: Rgb<u8> = Rgb([17, 17, 17]);

/// Text size in logical pixels (ascender to descender).
const FONT_PX: f32 = 18.0;
const MARGIN: u32 = 16;
const PAD_X: u32 = 8;
const PAD_Y: u32 = 6;
const LINE: u32 = 1;

/// Renders `table` on an opaque white canvas at `scale` device pixels per logical pixel.
pub fn render(table: &PreviewTable, scale: u32, fonts: &FontSet) -> RgbImage {
    let scale = scale.max(1);
    let measure = TextPainter::new(fonts, FONT_PX);
    let text_width = |text: &str| measure.width(text).ceil() as u32;
    let text_height = measure.line_height().ceil() as u32;

    let grid = table.grid();
    let columns = grid.first().map(Vec::len).unwrap_or(0);

    let col_widths: Vec<u32> = (0..columns)
        .map(|col| {
            grid.iter()
                .map(|line| text_width(line[col]))
                .max()
                .unwrap_or(0)
                + 2 * PAD_X
        })
        .collect();
    let row_height = text_height + 2 * PAD_Y;
    let heading_height = if table.heading.is_some() {
        text_height + 2 * PAD_Y
    } else {
        0
    };
    let table_width = col_widths.iter().sum::<u32>() + LINE;
    let table_height = grid.len() as u32 * row_height + LINE;

    let heading_width = table.heading.as_deref().map(text_width).unwrap_or(0);
    let width = 2 * MARGIN + table_width.max(heading_width);
    let height = 2 * MARGIN + heading_height + table_height;

    let mut canvas = Canvas {
        image: RgbImage::from_pixel(width * scale, height * scale, BACKGROUND),
        painter: TextPainter::new(fonts, FONT_PX * scale as f32),
        scale,
    };

    if let Some(heading) = &table.heading {
        canvas.text(MARGIN, MARGIN + PAD_Y, heading);
    }

    let top = MARGIN + heading_height;
    canvas.fill(MARGIN, top, table_width, row_height, HEADER_FILL);

    for (r, line) in grid.iter().enumerate() {
        let y = top + r as u32 * row_height;
        let mut x = MARGIN;
        for (text, col_width) in line.iter().zip(&col_widths) {
            canvas.text(x + PAD_X, y + PAD_Y, text);
            x += col_width;
        }
    }

    for r in 0..=grid.len() as u32 {
        canvas.fill(MARGIN, top + r * row_height, table_width, LINE, GRID_LINE);
    }
    let mut x = MARGIN;
    canvas.fill(x, top, LINE, table_height, GRID_LINE);
    for col_width in &col_widths {
        x += col_width;
        canvas.fill(x, top, LINE, table_height, GRID_LINE);
    }

    canvas.image
}

struct Canvas<'a> {
    image: RgbImage,
    painter: TextPainter<'a>,
    scale: u32,
}

impl Canvas<'_> {
    /// Fills a logical rectangle, clipped to the image.
    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        let (img_w, img_h) = self.image.dimensions();
        let x0 = (x * self.scale).min(img_w);
        let y0 = (y * self.scale).min(img_h);
        let x1 = ((x + w) * self.scale).min(img_w);
        let y1 = ((y + h) * self.scale).min(img_h);
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    fn text(&mut self, x: u32, y: u32, text: &str) {
        let (x, y) = ((x * self.scale) as f32, (y * self.scale) as f32);
        self.painter.draw(&mut self.image, x, y, text, TEXT);
    }
}
