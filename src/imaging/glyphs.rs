//! Numeral drawing.
//!
//! A TrueType font is preferred. When it can't be read or parsed the board
//! still renders, using a small built-in block font for digits.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, warn};

/// 3x5 bitmaps for `0`–`9`, one row per `u8`, high bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

pub enum GlyphSource {
    TrueType(FontVec),
    Builtin,
}

impl GlyphSource {
    /// Load a font file, falling back to the built-in digits.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::Builtin;
        };
        match std::fs::read(path) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    debug!(font = %path.display(), "loaded numeral font");
                    Self::TrueType(font)
                }
                Err(err) => {
                    warn!(font = %path.display(), %err, "unusable font, using built-in digits");
                    Self::Builtin
                }
            },
            Err(err) => {
                warn!(font = %path.display(), %err, "font not readable, using built-in digits");
                Self::Builtin
            }
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Draw `text` with its top-left corner at `(x, y)`, `px` pixels tall.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, px: f32, text: &str, color: Rgb<u8>) {
        match self {
            Self::TrueType(font) => {
                draw_text_mut(canvas, color, x, y, PxScale::from(px), font, text);
            }
            Self::Builtin => draw_builtin(canvas, x, y, px, text, color),
        }
    }
}

/// Block digits. Each bitmap pixel is a square of `px / 7`, so a glyph is
/// about 5/7 of the requested height and two digits fit in one cell.
fn draw_builtin(canvas: &mut RgbImage, x: i32, y: i32, px: f32, text: &str, color: Rgb<u8>) {
    let block = ((px / 7.0).round() as i32).max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        let Some(digit) = ch.to_digit(10) else {
            pen_x += 4 * block;
            continue;
        };
        for (row, bits) in DIGITS[digit as usize].iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) != 0 {
                    let rect = Rect::at(pen_x + col * block, y + row as i32 * block)
                        .of_size(block as u32, block as u32);
                    draw_filled_rect_mut(canvas, rect, color);
                }
            }
        }
        pen_x += 4 * block;
    }
}
