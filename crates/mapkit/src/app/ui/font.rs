//! 3x5 pixel font covering printable ASCII.

use super::draw::Canvas;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 2;
pub(crate) const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub(crate) const TEXT_HEIGHT: i32 = GLYPH_HEIGHT * TEXT_SCALE;
pub(crate) const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;

/// One entry per char from `' '` to `'~'`. Rows are packed top first, three
/// bits each, leftmost column in the high bit.
const ASCII_GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];
const UNKNOWN_GLYPH: u16 = 0x72c2;

fn glyph_bits(ch: char) -> u16 {
    match ch {
        ' '..='~' => ASCII_GLYPHS[ch as usize - ' ' as usize],
        _ => UNKNOWN_GLYPH,
    }
}

fn glyph_pixel_on(bits: u16, row: i32, col: i32) -> bool {
    let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
    bits & (1 << shift) != 0
}

pub(crate) fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

/// Longest prefix of `text` that fits in `max_width` pixels.
pub(crate) fn fit_text(text: &str, max_width: i32) -> &str {
    let max_chars = (max_width / GLYPH_ADVANCE).max(0) as usize;
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Like [`fit_text`] but keeps the end of the string, for input fields.
pub(crate) fn fit_text_tail(text: &str, max_width: i32) -> &str {
    let max_chars = (max_width / GLYPH_ADVANCE).max(0) as usize;
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    match text.char_indices().nth(total - max_chars) {
        Some((byte_index, _)) => &text[byte_index..],
        None => "",
    }
}

pub(crate) fn draw_text(canvas: &mut Canvas<'_>, x: i32, y: i32, text: &str, color: [u8; 4]) {
    let mut pen_x = x;
    for ch in text.chars() {
        draw_glyph(canvas, pen_x, y, glyph_bits(ch), color);
        pen_x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(canvas: &mut Canvas<'_>, x: i32, y: i32, bits: u16, color: [u8; 4]) {
    for row in 0..GLYPH_HEIGHT {
        for col in 0..GLYPH_WIDTH {
            if glyph_pixel_on(bits, row, col) {
                canvas.fill_rect(x + col * TEXT_SCALE, y + row * TEXT_SCALE, TEXT_SCALE, TEXT_SCALE, color);
            }
        }
    }
}
