//! Page-number stamping: draw a decimal numeral into a rendered page.
//!
//! Numerals are composited from [`DigitGlyphs`]: one coverage mask per digit,
//! each covering a full em box of the font size and one digit advance wide.
//! A decoder with a text engine supplies real bold sans-serif glyphs (see
//! [`crate::DecodedDocument::digit_glyphs`]); otherwise a built-in 5×7 bold
//! face is scaled to the same metrics. Either way the em box bottom sits on
//! the padded page bottom, as a canvas does with a `bottom` text baseline.

use crate::config::StampStyle;
use crate::error::GiftBookError;
use image::{GrayImage, Luma, Rgba, RgbaImage};

const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 7;

/// Height of a lining digit, in em.
pub const DIGIT_HEIGHT_EM: f32 = 0.716;
/// Advance of a tabular digit in bold Helvetica/Arial, in em.
pub const DIGIT_ADVANCE_EM: f32 = 0.556;
/// Distance from the em box bottom up to the baseline, in em.
pub const DESCENT_EM: f32 = 0.212;

#[rustfmt::skip]
const DIGITS: [[u8; GLYPH_ROWS]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110], // 0
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111], // 2
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110], // 3
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110], // 5
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000], // 7
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100], // 9
];

/// Pixel box the stamp was laid out in (before clipping to the image).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Coverage masks for the digits `0`–`9` at one font size.
///
/// Every mask is `advance × font_px` pixels; 255 is full ink.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitGlyphs {
    font_px: u32,
    advance: u32,
    masks: Vec<GrayImage>,
}

impl DigitGlyphs {
    /// Wrap ten equally sized masks, indexed by digit value.
    pub fn new(font_px: u32, masks: Vec<GrayImage>) -> Result<Self, GiftBookError> {
        if masks.len() != 10 {
            return Err(GiftBookError::InvalidConfig(format!(
                "expected 10 digit glyphs, got {}",
                masks.len()
            )));
        }
        let (advance, height) = masks[0].dimensions();
        if advance == 0
            || height != font_px
            || masks.iter().any(|m| m.dimensions() != (advance, height))
        {
            return Err(GiftBookError::InvalidConfig(format!(
                "digit glyphs must all be N×{font_px} pixels"
            )));
        }
        Ok(Self {
            font_px,
            advance,
            masks,
        })
    }

    /// The built-in 5×7 bold face, laid out with sans-serif digit metrics.
    pub fn builtin(font_px: u32) -> Self {
        let font = font_px as f32;
        let glyph_h = font * DIGIT_HEIGHT_EM;
        let glyph_w = glyph_h * GLYPH_COLS as f32 / GLYPH_ROWS as f32;
        let advance = digit_advance(font_px).max(glyph_w.ceil() as u32).max(1);
        let x0 = (advance as f32 - glyph_w) / 2.0;
        let y0 = font - font * DESCENT_EM - glyph_h;

        let masks = DIGITS
            .iter()
            .map(|rows| {
                GrayImage::from_fn(advance, font_px, |px, py| {
                    let gx = ((px as f32 + 0.5 - x0) / glyph_w * GLYPH_COLS as f32).floor();
                    let gy = ((py as f32 + 0.5 - y0) / glyph_h * GLYPH_ROWS as f32).floor();
                    let inside = (0.0..GLYPH_COLS as f32).contains(&gx)
                        && (0.0..GLYPH_ROWS as f32).contains(&gy);
                    let ink = inside && (rows[gy as usize] >> (GLYPH_COLS - 1 - gx as usize)) & 1 == 1;
                    Luma([if ink { 255 } else { 0 }])
                })
            })
            .collect();

        Self {
            font_px,
            advance,
            masks,
        }
    }

    pub fn font_px(&self) -> u32 {
        self.font_px
    }

    /// Width of one digit cell in pixels.
    pub fn advance(&self) -> u32 {
        self.advance
    }
}

/// Pixel advance of one digit at `font_px`.
pub fn digit_advance(font_px: u32) -> u32 {
    (font_px as f32 * DIGIT_ADVANCE_EM).ceil() as u32
}

/// Font size in pixels for a page of the given height.
pub fn font_size_for(height: u32, style: &StampStyle) -> f32 {
    // Nudge before flooring so 1000 × 0.018 is 18, not 17.
    (height as f32 * style.font_ratio + 1e-3).floor()
}

/// Draw `number` centred horizontally near the bottom edge of `img`, using
/// the built-in face.
///
/// Returns `None` (and leaves the image untouched) when the page is too
/// small for a one-pixel font.
pub fn stamp_page_number(img: &mut RgbaImage, number: usize, style: &StampStyle) -> Option<StampBox> {
    let font_px = font_size_for(img.height(), style);
    if font_px < 1.0 {
        return None;
    }
    stamp_page_number_with(img, number, style, &DigitGlyphs::builtin(font_px as u32))
}

/// Draw `number` with the given glyphs.
///
/// The glyphs' own size is used; callers pick it with [`font_size_for`].
pub fn stamp_page_number_with(
    img: &mut RgbaImage,
    number: usize,
    style: &StampStyle,
    glyphs: &DigitGlyphs,
) -> Option<StampBox> {
    if glyphs.font_px == 0 {
        return None;
    }
    let (w, h) = img.dimensions();
    let digits: Vec<usize> = number
        .to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect();

    let text_w = glyphs.advance as f32 * digits.len() as f32;
    let left = (w as f32 / 2.0 - text_w / 2.0).round();
    let text_bottom = h as f32 - h as f32 * style.padding_ratio;
    let top = (text_bottom - glyphs.font_px as f32).round();

    let color = Rgba(style.color);
    for (k, &d) in digits.iter().enumerate() {
        let x0 = left as i64 + (k as u32 * glyphs.advance) as i64;
        draw_mask(img, &glyphs.masks[d], x0, top as i64, color);
    }

    Some(StampBox {
        x: left,
        y: top,
        width: text_w,
        height: glyphs.font_px as f32,
    })
}

fn draw_mask(img: &mut RgbaImage, mask: &GrayImage, x0: i64, y0: i64, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    for (mx, my, cov) in mask.enumerate_pixels() {
        let cov = cov[0] as u32;
        if cov == 0 {
            continue;
        }
        let (x, y) = (x0 + mx as i64, y0 + my as i64);
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            continue;
        }
        let mut src = color;
        src[3] = (color[3] as u32 * cov / 255) as u8;
        blend(img.get_pixel_mut(x as u32, y as u32), src);
    }
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src[3] as u32;
    if a == 255 {
        *dst = src;
        return;
    }
    for c in 0..3 {
        dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a)) / 255) as u8;
    }
    dst[3] = (a + dst[3] as u32 * (255 - a) / 255).min(255) as u8;
}
