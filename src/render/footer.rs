//! The label band under the map, drawn with a built-in 5×7 bitmap font.

use image::{Rgba, RgbaImage};

use super::orientation::Orientation;

pub const FOOTER_HEIGHT: u32 = 150;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const SCALE: u32 = 2;
const ADVANCE: u32 = (GLYPH_WIDTH + 1) * SCALE;
const LINE_HEIGHT: u32 = (GLYPH_HEIGHT + 4) * SCALE;
const MARGIN: u32 = 16;

/// The two label lines of a finished map.
pub fn footer_lines(world_name: &str, finished_at: &str, orientation: Orientation) -> Vec<String> {
    vec![
        format!("VOXMAP - {} - FINISHED {}", world_name, finished_at),
        format!("ORIENTATION (UP/RIGHT/DOWN/LEFT): {}", orientation),
    ]
}

/// Paints the band starting at row `top` white and writes `lines` into it.
/// Text running past the right edge is clipped.
pub fn draw_footer(img: &mut RgbaImage, top: u32, lines: &[String]) {
    let bottom = (top + FOOTER_HEIGHT).min(img.height());
    for y in top..bottom {
        for x in 0..img.width() {
            img.put_pixel(x, y, WHITE);
        }
    }

    let mut baseline = top + MARGIN;
    for line in lines {
        draw_text(img, MARGIN, baseline, line);
        baseline += LINE_HEIGHT;
    }
}

/// Draws `text` in upper case with its top-left corner at `(x, y)`.
pub fn draw_text(img: &mut RgbaImage, x: u32, y: u32, text: &str) {
    let mut pen = x;
    for c in text.chars() {
        if pen >= img.width() {
            break;
        }
        draw_glyph(img, pen, y, glyph(c.to_ascii_uppercase()));
        pen += ADVANCE;
    }
}

fn draw_glyph(img: &mut RgbaImage, x: u32, y: u32, rows: [u8; 7]) {
    for (gy, bits) in rows.iter().enumerate() {
        for gx in 0..GLYPH_WIDTH {
            if bits & (0x10 >> gx) == 0 {
                continue;
            }
            for sy in 0..SCALE {
                for sx in 0..SCALE {
                    let px = x + gx * SCALE + sx;
                    let py = y + gy as u32 * SCALE + sy;
                    if px < img.width() && py < img.height() {
                        img.put_pixel(px, py, BLACK);
                    }
                }
            }
        }
    }
}

fn glyph(c: char) -> [u8; 7] {
    match c {
        'A' => [0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11],
        'B' => [0x1e, 0x11, 0x11, 0x1e, 0x11, 0x11, 0x1e],
        'C' => [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e],
        'D' => [0x1e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1e],
        'E' => [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f],
        'F' => [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10],
        'G' => [0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0f],
        'H' => [0x11, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11],
        'I' => [0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0c],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f],
        'M' => [0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e],
        'P' => [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10],
        'Q' => [0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d],
        'R' => [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11],
        'S' => [0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e],
        'T' => [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0a, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0a],
        'X' => [0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0a, 0x04, 0x04, 0x04],
        'Z' => [0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f],
        '0' => [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e],
        '1' => [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e],
        '2' => [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f],
        '3' => [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e],
        '4' => [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02],
        '5' => [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e],
        '6' => [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e],
        '7' => [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e],
        '9' => [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c],
        ' ' => [0; 7],
        '-' => [0x00, 0x00, 0x00, 0x1f, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1f, 0x04, 0x04, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1f],
        ':' => [0x00, 0x0c, 0x0c, 0x00, 0x0c, 0x0c, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x0c],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0c, 0x04, 0x08],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        _ => [0x1f, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1f],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_lines() {
        let lines = footer_lines("World1", "2024-01-31T12:00:00+0000", Orientation::Wsen);
        assert_eq!(lines[0], "VOXMAP - World1 - FINISHED 2024-01-31T12:00:00+0000");
        assert_eq!(lines[1], "ORIENTATION (UP/RIGHT/DOWN/LEFT): WSEN");
    }

    #[test]
    fn test_footer_is_white_with_black_text() {
        let mut img = RgbaImage::new(200, 10 + FOOTER_HEIGHT);
        draw_footer(&mut img, 10, &["HI".to_string()]);

        assert_eq!(img.get_pixel(0, 9).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(199, 10 + FOOTER_HEIGHT - 1).0, [255, 255, 255, 255]);
        // Left stroke of the H.
        assert_eq!(*img.get_pixel(MARGIN, 10 + MARGIN), BLACK);
        let black = img.pixels().filter(|p| **p == BLACK).count();
        assert!(black > 0);
    }

    #[test]
    fn test_text_is_clipped_to_image() {
        let mut img = RgbaImage::new(16, FOOTER_HEIGHT);
        draw_footer(&mut img, 0, &["A VERY LONG LINE THAT DOES NOT FIT".to_string()]);
        assert_eq!(img.width(), 16);
    }
}
