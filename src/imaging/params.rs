//! Parameter types for board rendering.
//!
//! These structs describe *what* to draw, not *how*. The pure geometry in
//! [`calculations`](super::calculations) and the pixel work in
//! [`operations`](super::operations) both read from them.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`RenderParams`]: cell size, outer margin, line widths and numeral scale.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Layout of a rendered board.
///
/// - `cell_size`: side of one cell in pixels
/// - `margin`: white border around the grid
/// - `line_width`: thickness of ordinary cell lines
/// - `cluster_line_width`: thickness of lines on cluster boundaries
/// - `font_scale`: numeral height as a fraction of `cell_size`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub cell_size: u32,
    pub margin: u32,
    pub line_width: u32,
    pub cluster_line_width: u32,
    pub font_scale: f32,
}

impl RenderParams {
    /// Numeral height in pixels.
    pub fn font_px(&self) -> f32 {
        self.cell_size as f32 * self.font_scale
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            cell_size: 60,
            margin: 20,
            line_width: 3,
            cluster_line_width: 6,
            font_scale: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn default_render_params() {
        let p = RenderParams::default();
        assert_eq!((p.cell_size, p.margin), (60, 20));
        assert_eq!((p.line_width, p.cluster_line_width), (3, 6));
        assert!((p.font_px() - 42.0).abs() < 1e-3);
    }
}
