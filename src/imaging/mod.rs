//! Board rendering: pure Rust, no system graphics libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Canvas + grid** | `image::RgbImage` + `imageproc::drawing::draw_filled_rect_mut` |
//! | **Numerals** | `imageproc::drawing::draw_text_mut` (TrueType) or built-in block digits |
//! | **Obfuscation** | per-channel `{0,1}` noise + `image::imageops::rotate180` |
//! | **Encoding** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for canvas and line geometry (unit testable)
//! - **Parameters**: Data structures describing the layout
//! - **Glyphs**: Font loading with a built-in fallback
//! - **Operations**: Drawing, obfuscation and encoding

mod calculations;
pub mod glyphs;
pub mod operations;
mod params;

pub use calculations::{GridLine, canvas_size, grid_lines, line_thickness, numeral_origin};
pub use glyphs::GlyphSource;
pub use operations::{
    BoardRenderer, ImagingError, RenderedImage, encode_jpeg, obfuscate, obfuscate_seeded, render_board,
    save_jpeg,
};
pub use params::{Quality, RenderParams};
