//! The puzzle grid.
//!
//! A board is `size × size` where `size = width * height`. `width` and
//! `height` describe one cluster (box): clusters are `height` rows tall and
//! `width` columns wide, so a 3x2 cluster shape yields a 6×6 board with six
//! 2-row, 3-column clusters. Cells hold `1..=size` or nothing.

use super::GenerationError;

/// Largest supported side length. Candidate sets are `u32` bitmasks.
pub const MAX_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<u8>>,
}

impl Board {
    /// An all-empty board for the given cluster shape.
    pub fn empty(width: usize, height: usize) -> Result<Self, GenerationError> {
        let size = checked_size(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![None; size * size],
        })
    }

    /// Build a board from row vectors, validating shape and value range.
    pub fn from_rows(
        width: usize,
        height: usize,
        rows: Vec<Vec<Option<u8>>>,
    ) -> Result<Self, GenerationError> {
        let size = checked_size(width, height)?;
        if rows.len() != size || rows.iter().any(|r| r.len() != size) {
            return Err(GenerationError::MalformedBoard { expected: size });
        }
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if let Some(v) = *value
                    && (v == 0 || usize::from(v) > size)
                {
                    return Err(GenerationError::ValueOutOfRange {
                        row,
                        col,
                        value: v,
                        max: size,
                    });
                }
            }
        }
        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Cluster width (columns per cluster).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cluster height (rows per cluster).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Side length of the board, also the largest cell value.
    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.cells[row * self.size() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<u8>) {
        let size = self.size();
        self.cells[row * size + col] = value;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<u8>]> {
        self.cells.chunks(self.size())
    }

    /// Cluster index of a cell, numbered left to right, top to bottom.
    pub fn cluster_of(&self, row: usize, col: usize) -> usize {
        (row / self.height) * self.height + col / self.width
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.filled_count()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub(crate) fn cells(&self) -> &[Option<u8>] {
        &self.cells
    }
}

fn checked_size(width: usize, height: usize) -> Result<usize, GenerationError> {
    let size = width.saturating_mul(height);
    if width == 0 || height == 0 || !(2..=MAX_SIZE).contains(&size) {
        return Err(GenerationError::InvalidShape { width, height });
    }
    Ok(size)
}
