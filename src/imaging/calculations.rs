//! Pure geometry for board rendering.
//!
//! All functions here are pure and testable without any pixels.

use super::params::RenderParams;

/// Canvas dimensions `(width, height)` for a `rows × cols` board.
///
/// # Examples
/// ```
/// # use sudoku_carousel::imaging::{RenderParams, canvas_size};
/// // 9x9 board, 60px cells, 20px margin → 580x580
/// assert_eq!(canvas_size(9, 9, &RenderParams::default()), (580, 580));
/// ```
pub fn canvas_size(rows: usize, cols: usize, params: &RenderParams) -> (u32, u32) {
    let width = cols as u32 * params.cell_size + 2 * params.margin;
    let height = rows as u32 * params.cell_size + 2 * params.margin;
    (width, height)
}

/// Thickness of grid line `index` when clusters are `cluster_dim` cells deep.
///
/// Lines on a cluster boundary (including both outer edges) get the cluster
/// width; every other line gets the ordinary width.
pub fn line_thickness(index: usize, cluster_dim: usize, params: &RenderParams) -> u32 {
    if cluster_dim != 0 && index % cluster_dim == 0 {
        params.cluster_line_width
    } else {
        params.line_width
    }
}

/// One grid line along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub index: usize,
    /// Pixel coordinate of the line's centre along the axis.
    pub offset: u32,
    pub thickness: u32,
}

impl GridLine {
    /// First pixel covered by the line, centring the thickness on `offset`.
    pub fn start(&self) -> i32 {
        self.offset as i32 - (self.thickness / 2) as i32
    }
}

/// The `cells + 1` lines across one axis.
pub fn grid_lines(cells: usize, cluster_dim: usize, params: &RenderParams) -> Vec<GridLine> {
    (0..=cells)
        .map(|index| GridLine {
            index,
            offset: params.margin + index as u32 * params.cell_size,
            thickness: line_thickness(index, cluster_dim, params),
        })
        .collect()
}

/// Top-left anchor for the numeral in cell `(row, col)`.
///
/// Numerals sit a third of a cell in and a quarter down, nudged up slightly.
/// Two-digit values shift left so they stay inside the cell. Offsets scale
/// with the cell size (12px shift and 7px nudge at the default 60px cell).
pub fn numeral_origin(row: usize, col: usize, value: u8, params: &RenderParams) -> (i32, i32) {
    let cell = params.cell_size as i32;
    let margin = params.margin as i32;
    let shift = if value > 9 { cell / 5 } else { 0 };
    let nudge = cell * 7 / 60;
    let x = margin - shift + col as i32 * cell + cell / 3;
    let y = margin - nudge + row as i32 * cell + cell / 4;
    (x, y)
}
