//! Built-in puzzle library.
//!
//! Builds a full grid from the standard shifted pattern, shuffles it with
//! validity-preserving permutations, then blanks cells in random order while
//! the puzzle keeps a unique solution.

use super::board::Board;
use super::solver::{SolutionCount, count_solutions};
use super::{GenerationError, Puzzle, PuzzleLibrary, PuzzleSpec};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Default search-node allowance for each uniqueness check.
pub const DEFAULT_NODE_BUDGET: usize = 5_000;

#[derive(Debug, Clone)]
pub struct SudokuLibrary {
    node_budget: usize,
}

impl SudokuLibrary {
    pub fn new(node_budget: usize) -> Self {
        Self { node_budget }
    }
}

impl Default for SudokuLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_BUDGET)
    }
}

impl PuzzleLibrary for SudokuLibrary {
    fn generate(&self, spec: &PuzzleSpec, seed: u64) -> Result<Puzzle, GenerationError> {
        if !(0.0..=1.0).contains(&spec.difficulty) {
            return Err(GenerationError::InvalidDifficulty(spec.difficulty));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let solution = full_grid(spec.width, spec.height, &mut rng)?;
        let board = carve(&solution, spec.difficulty, self.node_budget, &mut rng);
        Ok(Puzzle {
            spec: *spec,
            board,
            solution,
        })
    }
}

/// A random complete grid.
///
/// Base pattern `(width * (r % height) + r / height + c) % size` is valid for
/// any cluster shape; shuffling bands, rows within a band, stacks, columns
/// within a stack, and the digit labels keeps it valid.
pub(crate) fn full_grid(
    width: usize,
    height: usize,
    rng: &mut StdRng,
) -> Result<Board, GenerationError> {
    let mut board = Board::empty(width, height)?;
    let size = board.size();

    let mut digits: Vec<u8> = (1..=size as u8).collect();
    digits.shuffle(rng);

    // `width` bands of `height` rows; `height` stacks of `width` columns
    let rows = shuffled_groups(width, height, rng);
    let cols = shuffled_groups(height, width, rng);

    for (i, &r) in rows.iter().enumerate() {
        for (j, &c) in cols.iter().enumerate() {
            let pattern = (width * (r % height) + r / height + c) % size;
            board.set(i, j, Some(digits[pattern]));
        }
    }
    Ok(board)
}

fn shuffled_groups(groups: usize, per_group: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..groups).collect();
    order.shuffle(rng);
    order
        .into_iter()
        .flat_map(|g| {
            let mut members: Vec<usize> = (0..per_group).map(|m| g * per_group + m).collect();
            members.shuffle(rng);
            members
        })
        .collect()
}

/// Blank up to `difficulty * size²` cells, skipping any that would make the
/// solution ambiguous (or that the budget can't prove unambiguous).
fn carve(solution: &Board, difficulty: f64, budget: usize, rng: &mut StdRng) -> Board {
    let size = solution.size();
    let total = size * size;
    let target = (difficulty * total as f64).floor() as usize;

    let mut order: Vec<usize> = (0..total).collect();
    order.shuffle(rng);

    let mut board = solution.clone();
    let mut removed = 0;
    for idx in order {
        if removed >= target {
            break;
        }
        let (row, col) = (idx / size, idx % size);
        let previous = board.get(row, col);
        board.set(row, col, None);
        match count_solutions(&board, 2, budget) {
            SolutionCount::Exactly(1) => removed += 1,
            _ => board.set(row, col, previous),
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::solver::solve;

    fn is_valid_solution(board: &Board) -> bool {
        let size = board.size();
        let full: Vec<u8> = (1..=size as u8).collect();
        let check = |mut values: Vec<u8>| {
            values.sort_unstable();
            values == full
        };
        (0..size).all(|i| {
            let row = (0..size).filter_map(|c| board.get(i, c)).collect();
            let col = (0..size).filter_map(|r| board.get(r, i)).collect();
            let cluster = (0..size * size)
                .filter(|idx| board.cluster_of(idx / size, idx % size) == i)
                .filter_map(|idx| board.get(idx / size, idx % size))
                .collect();
            check(row) && check(col) && check(cluster)
        })
    }

    #[test]
    fn full_grid_is_valid_for_every_supported_shape() {
        let shapes = [
            (2, 3), (2, 4), (2, 5),
            (3, 3), (3, 4),
            (4, 3), (4, 4),
            (5, 2), (5, 3), (5, 4),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for (width, height) in shapes {
            let grid = full_grid(width, height, &mut rng).unwrap();
            assert!(grid.is_complete());
            assert!(is_valid_solution(&grid), "invalid grid for {width}x{height}");
        }
    }

    #[test]
    fn generated_puzzle_has_unique_matching_solution() {
        let spec = PuzzleSpec {
            width: 3,
            height: 3,
            difficulty: 0.5,
        };
        let puzzle = SudokuLibrary::default().generate(&spec, 42).unwrap();
        assert!(is_valid_solution(&puzzle.solution));
        assert_eq!(
            count_solutions(&puzzle.board, 2, usize::MAX),
            SolutionCount::Exactly(1)
        );
        assert_eq!(solve(&puzzle.board).unwrap(), puzzle.solution);
        for row in 0..9 {
            for col in 0..9 {
                if let Some(v) = puzzle.board.get(row, col) {
                    assert_eq!(Some(v), puzzle.solution.get(row, col));
                }
            }
        }
    }

    #[test]
    fn difficulty_bounds_the_blank_count() {
        let spec = PuzzleSpec {
            width: 3,
            height: 3,
            difficulty: 0.4,
        };
        let puzzle = SudokuLibrary::default().generate(&spec, 1).unwrap();
        // 0.4 * 81 = 32 blanks at most; a 9x9 keeps uniqueness well past that
        assert_eq!(puzzle.board.empty_count(), 32);
        assert_eq!(puzzle.board.filled_count(), 49);
    }

    #[test]
    fn zero_difficulty_keeps_every_cell() {
        let spec = PuzzleSpec {
            width: 2,
            height: 3,
            difficulty: 0.0,
        };
        let puzzle = SudokuLibrary::default().generate(&spec, 3).unwrap();
        assert_eq!(puzzle.board, puzzle.solution);
    }

    #[test]
    fn same_seed_same_puzzle() {
        let spec = PuzzleSpec {
            width: 4,
            height: 3,
            difficulty: 0.3,
        };
        let library = SudokuLibrary::default();
        assert_eq!(
            library.generate(&spec, 99).unwrap(),
            library.generate(&spec, 99).unwrap()
        );
    }

    #[test]
    fn rejects_difficulty_outside_unit_interval() {
        let spec = PuzzleSpec {
            width: 3,
            height: 3,
            difficulty: 1.5,
        };
        assert_eq!(
            SudokuLibrary::default().generate(&spec, 0),
            Err(GenerationError::InvalidDifficulty(1.5))
        );
    }
}
