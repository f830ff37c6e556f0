//! Backtracking solver over bitmask candidate sets.
//!
//! Always branches on the empty cell with the fewest candidates. A node
//! budget bounds the work done by uniqueness checks on large boards.

use super::board::Board;

/// Outcome of a bounded solution count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionCount {
    /// Search finished: this many solutions, capped at the requested limit.
    Exactly(usize),
    /// The node budget ran out before the search finished.
    Unknown,
}

struct Search {
    size: usize,
    width: usize,
    height: usize,
    cells: Vec<u8>,
    rows: Vec<u32>,
    cols: Vec<u32>,
    clusters: Vec<u32>,
    nodes: usize,
    budget: usize,
    found: usize,
    first: Option<Vec<u8>>,
}

impl Search {
    /// Returns `None` when the givens already conflict.
    fn new(board: &Board, budget: usize) -> Option<Self> {
        let size = board.size();
        let mut search = Self {
            size,
            width: board.width(),
            height: board.height(),
            cells: vec![0; size * size],
            rows: vec![0; size],
            cols: vec![0; size],
            clusters: vec![0; size],
            nodes: 0,
            budget,
            found: 0,
            first: None,
        };
        for (idx, cell) in board.cells().iter().enumerate() {
            if let Some(v) = *cell {
                if search.candidates(idx) & bit(v) == 0 {
                    return None;
                }
                search.place(idx, v);
            }
        }
        Some(search)
    }

    fn cluster(&self, idx: usize) -> usize {
        let (row, col) = (idx / self.size, idx % self.size);
        (row / self.height) * self.height + col / self.width
    }

    fn candidates(&self, idx: usize) -> u32 {
        let full = (1u32 << self.size) - 1;
        let row = idx / self.size;
        let col = idx % self.size;
        full & !(self.rows[row] | self.cols[col] | self.clusters[self.cluster(idx)])
    }

    fn place(&mut self, idx: usize, value: u8) {
        let (row, col, cluster) = (idx / self.size, idx % self.size, self.cluster(idx));
        self.cells[idx] = value;
        self.rows[row] |= bit(value);
        self.cols[col] |= bit(value);
        self.clusters[cluster] |= bit(value);
    }

    fn unplace(&mut self, idx: usize, value: u8) {
        let (row, col, cluster) = (idx / self.size, idx % self.size, self.cluster(idx));
        self.cells[idx] = 0;
        self.rows[row] &= !bit(value);
        self.cols[col] &= !bit(value);
        self.clusters[cluster] &= !bit(value);
    }

    /// Most constrained empty cell, or `None` when the grid is full.
    fn most_constrained(&self) -> Option<(usize, u32)> {
        let mut best: Option<(usize, u32)> = None;
        for idx in 0..self.cells.len() {
            if self.cells[idx] != 0 {
                continue;
            }
            let cands = self.candidates(idx);
            let count = cands.count_ones();
            if count == 0 {
                return Some((idx, 0));
            }
            if best.is_none_or(|(_, b)| count < b.count_ones()) {
                best = Some((idx, cands));
            }
        }
        best
    }

    /// Returns `false` when the budget ran out.
    fn count(&mut self, limit: usize) -> bool {
        self.nodes += 1;
        if self.nodes > self.budget {
            return false;
        }
        let Some((idx, mut cands)) = self.most_constrained() else {
            self.found += 1;
            if self.first.is_none() {
                self.first = Some(self.cells.clone());
            }
            return true;
        };
        while cands != 0 {
            let value = cands.trailing_zeros() as u8 + 1;
            cands &= cands - 1;
            self.place(idx, value);
            let finished = self.count(limit);
            self.unplace(idx, value);
            if !finished {
                return false;
            }
            if self.found >= limit {
                break;
            }
        }
        true
    }
}

fn bit(value: u8) -> u32 {
    1 << (value - 1)
}

/// Count solutions up to `limit`, spending at most `budget` search nodes.
pub fn count_solutions(board: &Board, limit: usize, budget: usize) -> SolutionCount {
    let Some(mut search) = Search::new(board, budget) else {
        return SolutionCount::Exactly(0);
    };
    if search.count(limit) {
        SolutionCount::Exactly(search.found.min(limit))
    } else {
        SolutionCount::Unknown
    }
}

/// First solution found by an unbounded search.
pub fn solve(board: &Board) -> Option<Board> {
    let mut search = Search::new(board, usize::MAX)?;
    search.count(1);
    let values = search.first?;
    let mut solved = board.clone();
    let size = board.size();
    for (idx, value) in values.into_iter().enumerate() {
        solved.set(idx / size, idx % size, Some(value));
    }
    Some(solved)
}
