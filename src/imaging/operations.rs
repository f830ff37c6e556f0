//! High-level image operations.
//!
//! These functions combine the pure geometry with actual pixel work: drawing
//! a board, obfuscating a solution image, and JPEG encoding.

use super::calculations::{GridLine, canvas_size, grid_lines, numeral_origin};
use super::glyphs::GlyphSource;
use super::params::{Quality, RenderParams};
use crate::puzzle::Board;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use thiserror::Error;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// A finished raster plus the layout it was drawn with.
///
/// Immutable: every operation returns a new image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    image: RgbImage,
    params: RenderParams,
}

impl RenderedImage {
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Draw a board: white canvas, grid with thick cluster boundaries, numerals.
pub fn render_board(board: &Board, params: &RenderParams, glyphs: &GlyphSource) -> RenderedImage {
    let size = board.size();
    let (img_w, img_h) = canvas_size(size, size, params);
    let mut image = RgbImage::from_pixel(img_w, img_h, WHITE);

    let span = size as u32 * params.cell_size;
    for line in grid_lines(size, board.height(), params) {
        draw_line(&mut image, &line, params.margin, span, Axis::Horizontal);
    }
    for line in grid_lines(size, board.width(), params) {
        draw_line(&mut image, &line, params.margin, span, Axis::Vertical);
    }

    let px = params.font_px();
    for (row, values) in board.rows().enumerate() {
        for (col, value) in values.iter().enumerate() {
            if let Some(v) = *value {
                let (x, y) = numeral_origin(row, col, v, params);
                glyphs.draw(&mut image, x, y, px, &v.to_string(), BLACK);
            }
        }
    }

    RenderedImage {
        image,
        params: *params,
    }
}

/// Rendering layout plus font, shared by every board in a run.
pub struct BoardRenderer {
    pub params: RenderParams,
    pub glyphs: GlyphSource,
}

impl BoardRenderer {
    pub fn new(params: RenderParams, glyphs: GlyphSource) -> Self {
        Self { params, glyphs }
    }

    pub fn render(&self, board: &Board) -> RenderedImage {
        render_board(board, &self.params, &self.glyphs)
    }
}

impl Default for BoardRenderer {
    fn default() -> Self {
        Self::new(RenderParams::default(), GlyphSource::Builtin)
    }
}

enum Axis {
    Horizontal,
    Vertical,
}

fn draw_line(image: &mut RgbImage, line: &GridLine, margin: u32, span: u32, axis: Axis) {
    let rect = match axis {
        Axis::Horizontal => Rect::at(margin as i32, line.start()).of_size(span, line.thickness),
        Axis::Vertical => Rect::at(line.start(), margin as i32).of_size(line.thickness, span),
    };
    draw_filled_rect_mut(image, rect, BLACK);
}

/// Add per-channel noise from `{0, 1}` (saturating) and rotate 180°.
///
/// The result stays readable once turned the right way up but is no longer
/// byte-identical to a clean render of the same board.
pub fn obfuscate<R: Rng + ?Sized>(rendered: &RenderedImage, rng: &mut R) -> RenderedImage {
    let mut noisy = rendered.image.clone();
    for pixel in noisy.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = channel.saturating_add(rng.gen_range(0..=1));
        }
    }
    RenderedImage {
        image: imageops::rotate180(&noisy),
        params: rendered.params,
    }
}

/// [`obfuscate`] with a fixed noise seed.
pub fn obfuscate_seeded(rendered: &RenderedImage, seed: u64) -> RenderedImage {
    obfuscate(rendered, &mut StdRng::seed_from_u64(seed))
}

/// Encode as baseline JPEG in memory.
pub fn encode_jpeg(image: &RgbImage, quality: Quality) -> Result<Vec<u8>, ImagingError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.value()).encode_image(image)?;
    Ok(bytes)
}

/// Encode and write to `path`, creating parent directories.
pub fn save_jpeg(image: &RgbImage, path: &Path, quality: Quality) -> Result<(), ImagingError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = encode_jpeg(image, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
