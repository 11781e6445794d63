use cardocr::{GlyphLibrary, ScanConfig};
use image::{DynamicImage, GrayImage, Luma};
use tempfile::NamedTempFile;

/// Seven-segment glyph geometry.
pub const GLYPH_W: u32 = 16;
pub const GLYPH_H: u32 = 26;
pub const STROKE: u32 = 3;
const MID: u32 = 12;

/// Card region layout matching the default group filters.
pub const CARD_W: u32 = 600;
pub const CARD_H: u32 = 378;
pub const TEXT_TOP: u32 = 210;
pub const FIRST_GROUP_X: u32 = 64;
pub const DIGIT_GAP: u32 = 8;
pub const GROUP_GAP: u32 = 40;

pub const CARD_BACKGROUND: u8 = 40;
pub const CARD_INK: u8 = 230;

/// Segment rectangles `(x, y, w, h)` relative to the glyph origin.
fn segment(name: char) -> (u32, u32, u32, u32) {
    match name {
        'a' => (0, 0, GLYPH_W, STROKE),
        'b' => (GLYPH_W - STROKE, 0, STROKE, MID + STROKE),
        'c' => (GLYPH_W - STROKE, MID, STROKE, GLYPH_H - MID),
        'd' => (0, GLYPH_H - STROKE, GLYPH_W, STROKE),
        'e' => (0, MID, STROKE, GLYPH_H - MID),
        'f' => (0, 0, STROKE, MID + STROKE),
        'g' => (0, MID, GLYPH_W, STROKE),
        _ => unreachable!(),
    }
}

/// Segments lit for each digit. `1` carries a foot so that its bounding box
/// spans the full glyph width like every other digit.
fn segments(digit: u8) -> &'static str {
    match digit {
        0 => "abcdef",
        1 => "bcd",
        2 => "abdeg",
        3 => "abcdg",
        4 => "bcfg",
        5 => "acdfg",
        6 => "acdefg",
        7 => "abc",
        8 => "abcdefg",
        9 => "abcdfg",
        _ => unreachable!(),
    }
}

pub fn fill_rect(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32, value: u8) {
    for yy in y..y + h {
        for xx in x..x + w {
            img.put_pixel(xx, yy, Luma([value]));
        }
    }
}

/// Draw a digit with its top-left corner at `(x0, y0)`. Every segment grows
/// by `grow` pixels on each side.
pub fn draw_digit(img: &mut GrayImage, digit: u8, x0: u32, y0: u32, grow: u32, value: u8) {
    for name in segments(digit).chars() {
        let (x, y, w, h) = segment(name);
        fill_rect(
            img,
            x0 + x - grow,
            y0 + y - grow,
            w + 2 * grow,
            h + 2 * grow,
            value,
        );
    }
}

/// Reference sheet: dark digits on white, in the given left-to-right order.
///
/// Glyphs are drawn one pixel heavier than on the card, matching the stroke
/// dilation the classifier applies to card glyphs.
pub fn reference_sheet_with(order: &[u8]) -> DynamicImage {
    let pitch = GLYPH_W + 14;
    let mut img = GrayImage::from_pixel(40 + pitch * order.len() as u32, GLYPH_H + 40, Luma([255u8]));
    for (i, &digit) in order.iter().enumerate() {
        draw_digit(&mut img, digit, 20 + i as u32 * pitch, 20, 1, 0);
    }
    DynamicImage::ImageLuma8(img)
}

pub fn reference_sheet() -> DynamicImage {
    reference_sheet_with(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9])
}

pub fn library() -> GlyphLibrary {
    GlyphLibrary::build(&reference_sheet(), &ScanConfig::default()).expect("Failed to build glyph library")
}

/// Writes the reference sheet to a temp PNG. Keep the file alive while in use.
pub fn reference_file() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    reference_sheet()
        .save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save reference sheet");
    file
}

/// Left edge of glyph `index` (0-15) on the card.
pub fn digit_x(index: usize) -> u32 {
    let group = (index / 4) as u32;
    let pos = (index % 4) as u32;
    FIRST_GROUP_X + group * (4 * GLYPH_W + 3 * DIGIT_GAP + GROUP_GAP) + pos * (GLYPH_W + DIGIT_GAP)
}

/// Card region with the number printed in four groups of four.
pub fn card_region(number: &str) -> GrayImage {
    assert_eq!(number.len(), 16);
    let mut img = GrayImage::from_pixel(CARD_W, CARD_H, Luma([CARD_BACKGROUND]));
    for (i, ch) in number.chars().enumerate() {
        let digit = ch.to_digit(10).expect("digits only") as u8;
        draw_digit(&mut img, digit, digit_x(i), TEXT_TOP, 0, CARD_INK);
    }
    img
}

/// Join glyphs `index` and `index + 1` with a bar so they segment as one blob.
pub fn bridge_digits(img: &mut GrayImage, index: usize) {
    let x = digit_x(index) + GLYPH_W;
    fill_rect(img, x, TEXT_TOP + MID, DIGIT_GAP, STROKE, CARD_INK);
}

/// A larger frame holding a plain bright card outline on a dark background.
pub fn frame_with_card(frame_w: u32, frame_h: u32, card: (u32, u32, u32, u32)) -> DynamicImage {
    let mut img = GrayImage::from_pixel(frame_w, frame_h, Luma([25u8]));
    let (x, y, w, h) = card;
    fill_rect(&mut img, x, y, w, h, 210);
    DynamicImage::ImageLuma8(img)
}
