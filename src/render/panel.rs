//! Panel composition for comparison images.
//!
//! A comparison is rendered as two grayscale panels side by side over a
//! caption bar; a lone sample gets a single panel. Captions are drawn with a
//! built-in 5x7 bitmap font so the renderer has no font-file dependency.

use std::path::Path;

use image::GrayImage;
use imgref::ImgVec;

use crate::error::{Error, Result};

/// Horizontal gap between the two panels, in pixels.
pub const PANEL_GUTTER: u32 = 8;

/// Height of the caption bar under the panels, in pixels.
pub const CAPTION_BAR: u32 = 11;

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_W + 1;

/// Render two samples side by side with independent captions.
#[must_use]
pub fn render_comparison(
    left: &ImgVec<f32>,
    left_caption: &str,
    right: &ImgVec<f32>,
    right_caption: &str,
) -> GrayImage {
    let lw = left.width() as u32;
    let rw = right.width() as u32;
    let panel_h = (left.height().max(right.height())) as u32;

    let mut canvas = GrayImage::new(lw + PANEL_GUTTER + rw, panel_h + CAPTION_BAR);
    blit(&mut canvas, left, 0);
    blit(&mut canvas, right, lw + PANEL_GUTTER);
    draw_text(&mut canvas, 2, panel_h + 2, left_caption, lw);
    draw_text(&mut canvas, lw + PANEL_GUTTER + 2, panel_h + 2, right_caption, rw);
    canvas
}

/// Render a single sample over its caption.
#[must_use]
pub fn render_single(sample: &ImgVec<f32>, caption: &str) -> GrayImage {
    let w = sample.width() as u32;
    let h = sample.height() as u32;
    let mut canvas = GrayImage::new(w, h + CAPTION_BAR);
    blit(&mut canvas, sample, 0);
    draw_text(&mut canvas, 2, h + 2, caption, w);
    canvas
}

/// Write a rendered panel image as PNG.
pub fn save_png(image: &GrayImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| Error::Render(format!("cannot write {}: {e}", path.display())))
}

/// Copy a unit-range sample into the canvas at the given x offset.
fn blit(canvas: &mut GrayImage, sample: &ImgVec<f32>, x_offset: u32) {
    for (y, row) in sample.rows().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            let byte = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
            canvas.put_pixel(x_offset + x as u32, y as u32, image::Luma([byte]));
        }
    }
}

/// Draw ASCII text, clipped to `max_width` pixels from `x`.
fn draw_text(canvas: &mut GrayImage, x: u32, y: u32, text: &str, max_width: u32) {
    let limit = x.saturating_add(max_width.saturating_sub(2));
    let mut cursor = x;
    for ch in text.chars() {
        if cursor + GLYPH_W > limit || cursor + GLYPH_W > canvas.width() {
            break;
        }
        let glyph = glyph_columns(ch);
        for (col, bits) in glyph.iter().enumerate() {
            for row in 0..GLYPH_H {
                if bits >> row & 1 == 1 {
                    canvas.put_pixel(cursor + col as u32, y + row, image::Luma([255]));
                }
            }
        }
        cursor += GLYPH_ADVANCE;
    }
}

/// Column bitmaps (LSB = top row) of a classic 5x7 font, printable ASCII.
/// Unknown characters render as a full block.
fn glyph_columns(ch: char) -> [u8; 5] {
    let index = (ch as usize).wrapping_sub(0x20);
    *FONT_5X7.get(index).unwrap_or(&[0x7F, 0x7F, 0x7F, 0x7F, 0x7F])
}

#[rustfmt::skip]
const FONT_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x00, 0x08, 0x14, 0x22, 0x41], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x41, 0x22, 0x14, 0x08, 0x00], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x09, 0x01], // 'F'
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x07, 0x08, 0x70, 0x08, 0x07], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x08, 0x08, 0x2A, 0x1C, 0x08], // '~'
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(width: usize, height: usize, value: f32) -> ImgVec<f32> {
        ImgVec::new(vec![value; width * height], width, height)
    }

    #[test]
    fn test_comparison_dimensions() {
        let left = sample(32, 24, 0.5);
        let right = sample(40, 30, 0.25);
        let img = render_comparison(&left, "a", &right, "b");
        assert_eq!(img.width(), 32 + PANEL_GUTTER + 40);
        assert_eq!(img.height(), 30 + CAPTION_BAR);
    }

    #[test]
    fn test_single_dimensions() {
        let img = render_single(&sample(20, 20, 1.0), "only");
        assert_eq!(img.width(), 20);
        assert_eq!(img.height(), 20 + CAPTION_BAR);
    }

    #[test]
    fn test_blit_clamps_to_u8() {
        let over = ImgVec::new(vec![2.0, -1.0], 2, 1);
        let img = render_single(&over, "");
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn test_caption_pixels_present() {
        let img = render_single(&sample(64, 8, 0.0), "abc");
        let caption_lit = (0..img.width())
            .flat_map(|x| (8..img.height()).map(move |y| (x, y)))
            .any(|(x, y)| img.get_pixel(x, y).0[0] == 255);
        assert!(caption_lit);
    }

    #[test]
    fn test_long_caption_is_clipped_to_panel() {
        // Must not panic: the text would overrun a narrow panel.
        let img = render_single(&sample(10, 10, 0.0), "a-very-long-caption.png");
        assert_eq!(img.width(), 10);
    }

    #[test]
    fn test_save_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let img = render_single(&sample(4, 4, 0.5), "x");
        save_png(&img, &path).unwrap();
        assert!(path.is_file());
    }
}
