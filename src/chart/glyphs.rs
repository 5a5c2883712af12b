use image::{Rgb, RgbImage};

/// 3×5 bitmaps; each row is the low three bits, most significant bit
/// leftmost. Letters are drawn as capitals whatever their case.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ' ' => [0; 5],
        _ => return None,
    };
    Some(rows)
}

pub const SCALE: u32 = 2;
pub const HEIGHT: u32 = 5 * SCALE;

pub fn text_width(text: &str) -> u32 {
    scaled_width(text, SCALE)
}

pub fn scaled_width(text: &str, scale: u32) -> u32 {
    (text.chars().count() as u32 * 4 * scale).saturating_sub(scale)
}

/// Draw `text` with its top-left corner at `(x, y)`; pixels outside the
/// image and unknown characters are skipped.
pub fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    draw_scaled(img, x, y, text, color, SCALE);
}

pub fn draw_scaled(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>, scale: u32) {
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let left = x + (i as u32 * 4 * scale) as i64;
        for (r, bits) in rows.iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = left + (col * scale + dx) as i64;
                        let py = y + (r as u32 * scale + dy) as i64;
                        if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                            img.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

/// Draw `text` reading bottom to top, its bounding box's top-left at `(x, y)`.
pub fn draw_vertical(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>, background: Rgb<u8>) {
    let mut strip = RgbImage::from_pixel(text_width(text).max(1), HEIGHT, background);
    draw_text(&mut strip, 0, 0, text, color);
    let rotated = image::imageops::rotate270(&strip);
    image::imageops::overlay(img, &rotated, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_known_glyphs_only() {
        let mut img = RgbImage::from_pixel(20, 12, Rgb([255, 255, 255]));
        draw_text(&mut img, 0, 0, "1?", Rgb([0, 0, 0]));
        // top row of '1' is .#. → only the middle column is inked
        assert_eq!(img.get_pixel(2, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
        // '?' is unknown and leaves its cell blank
        assert!((8..14).all(|x| img.get_pixel(x, 4) == &Rgb([255, 255, 255])));
        assert_eq!(text_width("12"), 14);
    }

    #[test]
    fn letters_ignore_case() {
        let black = Rgb([0, 0, 0]);
        let mut upper = RgbImage::from_pixel(40, 12, Rgb([255, 255, 255]));
        let mut lower = upper.clone();
        draw_text(&mut upper, 0, 0, "RATE (%)", black);
        draw_text(&mut lower, 0, 0, "rate (%)", black);
        assert_eq!(upper, lower);
        assert!(upper.pixels().any(|p| *p == black));
    }

    #[test]
    fn vertical_text_is_rotated() {
        let white = Rgb([255, 255, 255]);
        let mut img = RgbImage::from_pixel(12, 40, white);
        draw_vertical(&mut img, 0, 0, "LL", Rgb([0, 0, 0]), white);
        // the first L's stem becomes the bottom row of the 14px tall strip
        assert_eq!(img.get_pixel(0, 13), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(9, 13), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &white);
        assert!((0..12).all(|x| img.get_pixel(x, 14) == &white));
    }

    #[test]
    fn clips_at_edges() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        draw_text(&mut img, -3, -3, "88", Rgb([0, 0, 0]));
    }
}
