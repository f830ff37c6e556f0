//! Offline half of a cycle: generate a puzzle, draw both boards, write them.
//!
//! Nothing here touches the network, so the `render` command runs it alone.

use crate::imaging::{BoardRenderer, ImagingError, Quality, RenderedImage, obfuscate, save_jpeg};
use crate::puzzle::{GenerationError, Puzzle, PuzzleFactory, PuzzleLibrary, PuzzleSpec};
use crate::serve::ImageKind;
use rand::Rng;
use std::path::PathBuf;

/// Both images of a cycle and where they were written.
#[derive(Debug, Clone)]
pub struct RenderedPair {
    pub puzzle: RenderedImage,
    /// Noisy and upside down.
    pub solution: RenderedImage,
    pub puzzle_path: PathBuf,
    pub solution_path: PathBuf,
}

impl RenderedPair {
    pub fn images(&self) -> [(ImageKind, &RenderedImage); 2] {
        [
            (ImageKind::Puzzle, &self.puzzle),
            (ImageKind::Solution, &self.solution),
        ]
    }
}

pub struct Studio<L> {
    pub factory: PuzzleFactory<L>,
    pub renderer: BoardRenderer,
    pub quality: Quality,
    pub output_dir: PathBuf,
}

impl<L: PuzzleLibrary> Studio<L> {
    pub fn sample_spec<R: Rng + ?Sized>(&self, rng: &mut R) -> PuzzleSpec {
        self.factory.sample_spec(rng)
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        spec: &PuzzleSpec,
        rng: &mut R,
    ) -> Result<Puzzle, GenerationError> {
        let puzzle = self.factory.create(spec, rng)?;
        tracing::info!(
            shape = %format_args!("{}x{}", spec.height, spec.width),
            difficulty = spec.difficulty,
            filled = puzzle.board.filled_count(),
            empty = puzzle.board.empty_count(),
            "generated puzzle"
        );
        Ok(puzzle)
    }

    /// Render both boards, obfuscate the solution and persist the pair.
    pub fn render<R: Rng + ?Sized>(
        &self,
        puzzle: &Puzzle,
        rng: &mut R,
    ) -> Result<RenderedPair, ImagingError> {
        let board = self.renderer.render(&puzzle.board);
        let solution = obfuscate(&self.renderer.render(&puzzle.solution), rng);

        let puzzle_path = ImageKind::Puzzle.image_path(&self.output_dir);
        let solution_path = ImageKind::Solution.image_path(&self.output_dir);
        save_jpeg(board.image(), &puzzle_path, self.quality)?;
        save_jpeg(solution.image(), &solution_path, self.quality)?;
        tracing::info!(dir = %self.output_dir.display(), "wrote puzzle and solution images");

        Ok(RenderedPair {
            puzzle: board,
            solution,
            puzzle_path,
            solution_path,
        })
    }
}
