//! Puzzle sampling and generation.
//!
//! Each publish cycle samples one [`PuzzleSpec`]: a cluster shape and a
//! difficulty. The [`PuzzleFactory`] hands the spec to a [`PuzzleLibrary`]
//! and trusts its output; it never re-checks the solution.
//!
//! | Width | Heights |
//! |---|---|
//! | 2 | 3, 4, 5 |
//! | 3, 4 | 3, 4 |
//! | 5 | 2, 3, 4 |
//!
//! Difficulty comes from a normal distribution (default mean 50, stddev 15),
//! redrawn until it lands in `[0, 100]`, then divided by 100.

pub mod board;
pub mod generator;
pub mod solver;

pub use board::Board;
pub use generator::SudokuLibrary;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("unsupported cluster shape {height}x{width}")]
    InvalidShape { width: usize, height: usize },
    #[error("difficulty {0} is outside [0, 1]")]
    InvalidDifficulty(f64),
    #[error("invalid difficulty distribution: mean {mean}, stddev {stddev}")]
    InvalidDistribution { mean: f64, stddev: f64 },
    #[error("board rows do not form a {expected}x{expected} grid")]
    MalformedBoard { expected: usize },
    #[error("value {value} at ({row}, {col}) is outside 1..={max}")]
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: u8,
        max: usize,
    },
}

/// Shape and difficulty for one puzzle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuzzleSpec {
    /// Cluster width (columns per cluster).
    pub width: usize,
    /// Cluster height (rows per cluster).
    pub height: usize,
    /// Fraction of cells the library tries to blank, in `[0, 1]`.
    pub difficulty: f64,
}

/// A puzzle board together with its solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Puzzle {
    pub spec: PuzzleSpec,
    pub board: Board,
    pub solution: Board,
}

/// Anything that can turn a spec into a puzzle with a unique solution.
///
/// Generation must be deterministic for a given seed.
pub trait PuzzleLibrary {
    fn generate(&self, spec: &PuzzleSpec, seed: u64) -> Result<Puzzle, GenerationError>;
}

pub const WIDTHS: RangeInclusive<usize> = 2..=5;

/// Allowed cluster heights for a given width. Keeps clusters from
/// collapsing into thin strips.
pub fn height_range(width: usize) -> RangeInclusive<usize> {
    match width {
        5 => 2..=4,
        2 => 3..=5,
        _ => 3..=4,
    }
}

/// Normal distribution truncated to `[0, 100]` by rejection.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyModel {
    normal: Normal<f64>,
}

impl DifficultyModel {
    pub fn new(mean: f64, stddev: f64) -> Result<Self, GenerationError> {
        if !(0.0..=100.0).contains(&mean) || stddev <= 0.0 {
            return Err(GenerationError::InvalidDistribution { mean, stddev });
        }
        let normal = Normal::new(mean, stddev)
            .map_err(|_| GenerationError::InvalidDistribution { mean, stddev })?;
        Ok(Self { normal })
    }

    /// A draw in `[0, 100]`.
    pub fn sample_0_to_100<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let value = self.normal.sample(rng);
            if (0.0..=100.0).contains(&value) {
                return value;
            }
        }
    }

    /// A draw scaled to `[0, 1]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample_0_to_100(rng) / 100.0
    }
}

impl Default for DifficultyModel {
    fn default() -> Self {
        Self {
            normal: Normal::new(50.0, 15.0).expect("constant parameters are valid"),
        }
    }
}

pub struct PuzzleFactory<L> {
    library: L,
    difficulty: DifficultyModel,
}

impl<L: PuzzleLibrary> PuzzleFactory<L> {
    pub fn new(library: L, difficulty: DifficultyModel) -> Self {
        Self {
            library,
            difficulty,
        }
    }

    /// Draw width uniformly, then height from the width's range, then difficulty.
    pub fn sample_spec<R: Rng + ?Sized>(&self, rng: &mut R) -> PuzzleSpec {
        let width = rng.gen_range(WIDTHS);
        let height = rng.gen_range(height_range(width));
        PuzzleSpec {
            width,
            height,
            difficulty: self.difficulty.sample(rng),
        }
    }

    pub fn create<R: Rng + ?Sized>(
        &self,
        spec: &PuzzleSpec,
        rng: &mut R,
    ) -> Result<Puzzle, GenerationError> {
        let seed = rng.gen_range(0..u64::MAX);
        self.library.generate(spec, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sampled_heights_stay_in_range() {
        let factory = PuzzleFactory::new(SudokuLibrary::default(), DifficultyModel::default());
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            let spec = factory.sample_spec(&mut rng);
            assert!(WIDTHS.contains(&spec.width));
            assert!(height_range(spec.width).contains(&spec.height));
            assert!(spec.width * spec.height >= 4);
            assert!((0.0..=1.0).contains(&spec.difficulty));
        }
    }

    #[test]
    fn every_width_is_sampled() {
        let factory = PuzzleFactory::new(SudokuLibrary::default(), DifficultyModel::default());
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 6];
        for _ in 0..500 {
            seen[factory.sample_spec(&mut rng).width] = true;
        }
        assert_eq!(seen[2..], [true, true, true, true]);
    }

    #[test]
    fn difficulty_approximates_truncated_normal() {
        let model = DifficultyModel::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let samples: Vec<f64> = (0..20_000).map(|_| model.sample_0_to_100(&mut rng)).collect();
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        assert!(samples.iter().all(|s| (0.0..=100.0).contains(s)));
        assert!((mean - 50.0).abs() < 0.5, "mean {mean}");
        // truncation at ±3.3σ barely shrinks the spread
        assert!((var.sqrt() - 15.0).abs() < 0.5, "stddev {}", var.sqrt());
    }

    #[test]
    fn rejection_keeps_skewed_model_in_bounds() {
        let model = DifficultyModel::new(95.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let d = model.sample(&mut rng);
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn invalid_distribution_rejected() {
        assert!(DifficultyModel::new(50.0, 0.0).is_err());
        assert!(DifficultyModel::new(150.0, 15.0).is_err());
    }

    #[test]
    fn create_delegates_to_library() {
        let factory = PuzzleFactory::new(SudokuLibrary::default(), DifficultyModel::default());
        let spec = PuzzleSpec {
            width: 2,
            height: 4,
            difficulty: 0.3,
        };
        let puzzle = factory.create(&spec, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(puzzle.board.size(), 8);
        assert!(puzzle.solution.is_complete());
        assert_eq!(puzzle.spec, spec);
    }
}
