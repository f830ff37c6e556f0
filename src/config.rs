//! Publisher configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table, the user file is merged on top, and the result
//! is deserialized and validated. The file is optional: without it every
//! default applies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [puzzle]
//! difficulty_mean = 50.0     # Normal mean, 0-100
//! difficulty_stddev = 15.0   # Normal standard deviation, > 0
//! node_budget = 5000         # Uniqueness search budget per removal
//!
//! [render]
//! cell_size = 60
//! margin = 20
//! line_width = 3
//! cluster_line_width = 6
//! font_scale = 0.7
//! quality = 90               # JPEG quality (1-100)
//! font = "Arial.ttf"         # Built-in digits when unreadable
//!
//! [hosting]
//! provider = "freeimage"     # or "imgbb"
//! attempts = 3               # imgbb only
//! backoff_base_secs = 1      # imgbb pause: base * 2^attempt
//! imgbb_expiration_secs = 60
//! timeout_secs = 30
//!
//! [graph]
//! base_url = "https://graph.facebook.com/v20.0"
//! refresh_threshold_days = 7
//!
//! [engagement]
//! enabled = true
//! post_limit = 2
//! comment_limit = 3
//! replies = ["..."]
//!
//! [storage]
//! output_dir = "."
//! secrets_file = "secrets.json"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::engagement::DEFAULT_REPLIES;
use crate::hosting::HostProvider;
use crate::imaging::RenderParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Publisher configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    pub puzzle: PuzzleConfig,
    pub render: RenderConfig,
    pub hosting: HostingConfig,
    pub graph: GraphConfig,
    pub engagement: EngagementConfig,
    pub storage: StorageConfig,
}

impl PublisherConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.into()));
        if !(0.0..=100.0).contains(&self.puzzle.difficulty_mean) {
            return fail("puzzle.difficulty_mean must be 0-100");
        }
        if self.puzzle.difficulty_stddev <= 0.0 {
            return fail("puzzle.difficulty_stddev must be positive");
        }
        if self.render.cell_size < 10 {
            return fail("render.cell_size must be at least 10");
        }
        if self.render.line_width == 0 || self.render.cluster_line_width == 0 {
            return fail("render line widths must be non-zero");
        }
        if !(1..=100).contains(&self.render.quality) {
            return fail("render.quality must be 1-100");
        }
        if self.render.font_scale <= 0.0 {
            return fail("render.font_scale must be positive");
        }
        if self.hosting.attempts == 0 {
            return fail("hosting.attempts must be at least 1");
        }
        if self.graph.refresh_threshold_days <= 0 {
            return fail("graph.refresh_threshold_days must be positive");
        }
        if self.engagement.replies.iter().all(|r| r.trim().is_empty()) {
            return fail("engagement.replies must contain at least one reply");
        }
        Ok(())
    }
}

/// Difficulty distribution and generator limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PuzzleConfig {
    pub difficulty_mean: f64,
    pub difficulty_stddev: f64,
    pub node_budget: usize,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            difficulty_mean: 50.0,
            difficulty_stddev: 15.0,
            node_budget: crate::puzzle::generator::DEFAULT_NODE_BUDGET,
        }
    }
}

/// Board layout, numeral font and JPEG quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub cell_size: u32,
    pub margin: u32,
    pub line_width: u32,
    pub cluster_line_width: u32,
    pub font_scale: f32,
    pub quality: u32,
    /// TrueType font for numerals, tried on every render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let params = RenderParams::default();
        Self {
            cell_size: params.cell_size,
            margin: params.margin,
            line_width: params.line_width,
            cluster_line_width: params.cluster_line_width,
            font_scale: params.font_scale,
            quality: 90,
            font: Some(PathBuf::from("Arial.ttf")),
        }
    }
}

impl RenderConfig {
    pub fn params(&self) -> RenderParams {
        RenderParams {
            cell_size: self.cell_size,
            margin: self.margin,
            line_width: self.line_width,
            cluster_line_width: self.cluster_line_width,
            font_scale: self.font_scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostingConfig {
    pub provider: HostProvider,
    pub attempts: u32,
    pub backoff_base_secs: u64,
    pub imgbb_expiration_secs: u32,
    pub timeout_secs: u64,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            provider: HostProvider::FreeImage,
            attempts: 3,
            backoff_base_secs: 1,
            imgbb_expiration_secs: 60,
            timeout_secs: 30,
        }
    }
}

impl HostingConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs(self.backoff_base_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub base_url: String,
    /// Refresh the token when less than this many days remain.
    pub refresh_threshold_days: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: crate::graph::DEFAULT_BASE_URL.to_string(),
            refresh_threshold_days: crate::credentials::DEFAULT_REFRESH_THRESHOLD_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngagementConfig {
    pub enabled: bool,
    pub post_limit: usize,
    pub comment_limit: usize,
    pub replies: Vec<String>,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            post_limit: 2,
            comment_limit: 3,
            replies: DEFAULT_REPLIES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Where `sudoku_puzzle.jpg` and `sudoku_solution.jpg` are written.
    pub output_dir: PathBuf,
    pub secrets_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            secrets_file: PathBuf::from("secrets.json"),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PublisherConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PublisherConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PublisherConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
pub fn load_config(path: &Path) -> Result<PublisherConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Sudoku Carousel Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Puzzle generation
# ---------------------------------------------------------------------------
[puzzle]
# Difficulty is drawn from a normal distribution on 0-100 (redrawn until it
# lands in range) and divided by 100: the share of cells the generator tries
# to blank.
difficulty_mean = 50.0
difficulty_stddev = 15.0

# Search nodes allowed per uniqueness check. A removal whose check runs out
# of budget is reverted, so larger shapes keep a few more clues.
node_budget = 5000

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Pixels per cell and around the grid.
cell_size = 60
margin = 20

# Line thickness inside and between clusters.
line_width = 3
cluster_line_width = 6

# Numeral height as a fraction of the cell size.
font_scale = 0.7

# JPEG quality (1 = worst, 100 = best).
quality = 90

# TrueType font for numerals, relative to the working directory. Built-in
# block digits are used when the file is missing or unreadable.
font = "Arial.ttf"

# ---------------------------------------------------------------------------
# Image hosting
# ---------------------------------------------------------------------------
[hosting]
# "freeimage" (single attempt) or "imgbb" (retried).
provider = "freeimage"

# imgbb: attempts and the pause base; pauses are base * 2^attempt seconds.
attempts = 3
backoff_base_secs = 1

# imgbb: seconds before the upload is deleted.
imgbb_expiration_secs = 60

# Per-request HTTP timeout for every remote call.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Graph API
# ---------------------------------------------------------------------------
[graph]
base_url = "https://graph.facebook.com/v20.0"

# Refresh the access token when fewer days than this remain.
refresh_threshold_days = 7

# ---------------------------------------------------------------------------
# Comment replies
# ---------------------------------------------------------------------------
[engagement]
enabled = true

# Most recent posts to visit, and comments answered per post.
post_limit = 2
comment_limit = 3

# One is picked at random per reply.
replies = [
    "Thanks for playing! A new grid drops tomorrow.",
    "Great to see you here! How long did this one take you?",
    "Nice work! Did you spot the tricky cell?",
    "Thank you! Share it with a friend who loves puzzles.",
    "Appreciate you! Tomorrow's grid might be a different shape.",
    "Love it! Keep that streak going.",
]

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Directory for sudoku_puzzle.jpg and sudoku_solution.jpg.
output_dir = "."

# Versioned credential file (see `secrets import`).
secrets_file = "secrets.json"
"##
}
