//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! Puzzle 3x3, difficulty 40/100, 49/81 numbers
//!     Puzzle: out/sudoku_puzzle.jpg (580x580)
//!     Solution: out/sudoku_solution.jpg (580x580)
//! ```
//!
//! ## Publish
//!
//! ```text
//! Puzzle 3x3, difficulty 40/100, 49/81 numbers
//!     Puzzle: out/sudoku_puzzle.jpg
//!     Solution: out/sudoku_solution.jpg
//! Stages: idle → generated → rendered → hosted → ... → done
//!     Hosted: https://iili.io/p.jpg
//!     Hosted: https://iili.io/s.jpg
//!     Containers: c1, c2
//!     Carousel: car
//!     Media: m1
//! Engagement: 4 replies on 2 posts, 0 failed
//! Credentials: valid until 2024-08-14
//! ```
//!
//! ## Secrets
//!
//! ```text
//! 001 enabled    2024-07-05 06:00:00 UTC
//! 002 destroyed  2024-06-28 06:00:00 UTC
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::credentials::{RotationReport, VersionInfo, VersionState, VerifyOutcome};
use crate::publish::RunReport;
use crate::puzzle::Puzzle;
use crate::studio::RenderedPair;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: u64) -> String {
    format!("{:0>3}", pos)
}

/// `Puzzle 3x3, difficulty 40/100, 49/81 numbers`
fn puzzle_header(puzzle: &Puzzle) -> String {
    format!(
        "Puzzle {}x{}, difficulty {}/100, {}/{} numbers",
        puzzle.spec.height,
        puzzle.spec.width,
        (puzzle.spec.difficulty * 100.0) as u32,
        puzzle.board.filled_count(),
        puzzle.board.cell_count(),
    )
}

fn path_line(label: &str, path: &Path) -> String {
    format!("{}{}: {}", indent(1), label, path.display())
}

fn rotation_summary(report: &RotationReport) -> String {
    let mut line = format!("rotated to version {}", report.new_version);
    if !report.destroyed.is_empty() {
        let ids: Vec<String> = report.destroyed.iter().map(u64::to_string).collect();
        line.push_str(&format!(", destroyed {}", ids.join(", ")));
    }
    if !report.failed.is_empty() {
        let ids: Vec<String> = report.failed.iter().map(|(id, _)| id.to_string()).collect();
        line.push_str(&format!(", could not destroy {}", ids.join(", ")));
    }
    line
}

// ============================================================================
// Render
// ============================================================================

pub fn format_render_output(puzzle: &Puzzle, pair: &RenderedPair) -> Vec<String> {
    let (w, h) = pair.puzzle.dimensions();
    vec![
        puzzle_header(puzzle),
        format!("{} ({}x{})", path_line("Puzzle", &pair.puzzle_path), w, h),
        format!("{} ({}x{})", path_line("Solution", &pair.solution_path), w, h),
    ]
}

pub fn print_render_output(puzzle: &Puzzle, pair: &RenderedPair) {
    for line in format_render_output(puzzle, pair) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish
// ============================================================================

/// Format a publish run: what was produced, how far it got, side effects.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(puzzle) = &report.state.puzzle {
        lines.push(puzzle_header(puzzle));
    }
    let labels = ["Puzzle", "Solution"];
    for (label, path) in labels.iter().zip(&report.paths) {
        lines.push(path_line(label, path));
    }

    let stages: Vec<String> = report.trail.iter().map(|s| s.to_string()).collect();
    lines.push(format!("Stages: {}", stages.join(" → ")));
    for url in &report.state.image_urls {
        lines.push(format!("{}Hosted: {}", indent(1), url));
    }
    if !report.state.creation_ids.is_empty() {
        lines.push(format!(
            "{}Containers: {}",
            indent(1),
            report.state.creation_ids.join(", ")
        ));
    }
    if let Some(id) = &report.state.carousel_creation_id {
        lines.push(format!("{}Carousel: {}", indent(1), id));
    }
    if let Some(id) = &report.state.media_id {
        lines.push(format!("{}Media: {}", indent(1), id));
    }

    lines.push(match &report.engagement {
        Some(e) => format!(
            "Engagement: {} replies on {} posts, {} failed",
            e.replied, e.posts, e.failed
        ),
        None => "Engagement: skipped".to_string(),
    });

    lines.push(match &report.credentials {
        Ok(VerifyOutcome::Fresh { expires_at }) => {
            format!("Credentials: valid until {}", expires_at.format("%Y-%m-%d"))
        }
        Ok(VerifyOutcome::Rotated(rotation)) => {
            format!("Credentials: {}", rotation_summary(rotation))
        }
        Err(e) => format!("Credentials: check failed ({})", e),
    });

    if let Some(failure) = &report.failure {
        lines.push(format!("Failure: {}", failure));
    }
    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Token verification
// ============================================================================

pub fn format_verify_outcome(outcome: &VerifyOutcome) -> Vec<String> {
    match outcome {
        VerifyOutcome::Fresh { expires_at } => vec![format!(
            "Token valid until {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        )],
        VerifyOutcome::Rotated(rotation) => {
            let mut lines = vec![format!("Token refreshed, {}", rotation_summary(rotation))];
            for (id, reason) in &rotation.failed {
                lines.push(format!("{}{}: {}", indent(1), format_index(*id), reason));
            }
            lines
        }
    }
}

pub fn print_verify_outcome(outcome: &VerifyOutcome) {
    for line in format_verify_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Secrets
// ============================================================================

/// One line per stored version, oldest first.
pub fn format_versions(versions: &[VersionInfo]) -> Vec<String> {
    if versions.is_empty() {
        return vec!["No credential versions".to_string()];
    }
    let mut sorted = versions.to_vec();
    sorted.sort_by_key(|v| v.id);
    sorted
        .iter()
        .map(|v| {
            let state = match v.state {
                VersionState::Enabled => "enabled",
                VersionState::Destroyed => "destroyed",
            };
            format!(
                "{} {:<10} {}",
                format_index(v.id),
                state,
                v.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
        })
        .collect()
}

pub fn print_versions(versions: &[VersionInfo]) {
    for line in format_versions(versions) {
        println!("{}", line);
    }
}
