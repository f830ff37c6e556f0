//! Retrieval of the most recently rendered images.
//!
//! Rendering writes to fixed file names, so readers just poll the output
//! directory briefly in case a render is still being written.

use crate::retry::Sleeper;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const FETCH_ATTEMPTS: u32 = 3;
pub const FETCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Image not found")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageKind {
    Puzzle,
    Solution,
}

impl ImageKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Puzzle => "sudoku_puzzle.jpg",
            Self::Solution => "sudoku_solution.jpg",
        }
    }

    pub fn image_path(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Bytes of the latest image of `kind`, polling up to `attempts` times.
pub fn fetch_latest(
    dir: &Path,
    kind: ImageKind,
    attempts: u32,
    interval: Duration,
    sleeper: &dyn Sleeper,
) -> Result<Vec<u8>, ServeError> {
    let path = kind.image_path(dir);
    for attempt in 0..attempts {
        match std::fs::read(&path) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), attempt = attempt + 1, "image not there yet");
                sleeper.sleep(interval);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ServeError::NotFound(path))
}
