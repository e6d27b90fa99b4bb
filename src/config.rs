//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a `config.toml` in the config directory overrides any
//! subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [canvas]
//! width = 1200              # Canvas preset (Twitch banner)
//! height = 480
//! mode = "RGBA"             # 1, L, P, RGB, RGBA, CMYK, YCbCr, LAB, HSV, I, F
//!
//! [ratios]
//! catalog = [[32, 9], [21, 9], [16, 9], [16, 10], [4, 3], [1, 1], [5, 4], [3, 2], [5, 3], [3, 1]]
//! include_reciprocals = true  # Also try 9:32, 9:21, ... after the catalog
//!
//! [fit]
//! domination = "strict"     # "strict" (>) or "inclusive" (>=)
//! strategy = "direct"       # "direct" (closed form) or "scan" (bounded search)
//! scan_limit = 1000         # Multiplier bound for "scan"
//!
//! [background]
//! color = "#00000000"       # Omit for the mode's transparent zero
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! # Only let already-standard images keep their size
//! [fit]
//! domination = "inclusive"
//! ```
//!
//! Arrays such as `ratios.catalog` are replaced whole, never merged
//! element-wise. Unknown keys are rejected to catch typos early.

use crate::imaging::{
    DEFAULT_CATALOG, Domination, Fill, FitError, FitPolicy, FitStrategy, PixelError, PixelMode,
    RatioMatcher,
};
use crate::types::{AspectRatio, Dimensions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
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

/// Gallery configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Canvas preset: size and pixel mode shared by every padded image.
    pub canvas: CanvasConfig,
    /// Aspect ratio catalog for matching.
    pub ratios: RatiosConfig,
    /// How fitted sizes are searched for.
    pub fit: FitConfig,
    /// Background fill behind each padded image.
    pub background: BackgroundConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Validation(
                "canvas.width and canvas.height must be non-zero".into(),
            ));
        }
        if self.ratios.catalog.is_empty() {
            return Err(ConfigError::Validation(
                "ratios.catalog must not be empty".into(),
            ));
        }
        if let Some([x, y]) = self.ratios.catalog.iter().find(|[x, y]| *x == 0 || *y == 0) {
            return Err(ConfigError::Validation(format!(
                "ratios.catalog entry [{x}, {y}] must be non-zero"
            )));
        }
        if self.fit.scan_limit == 0 {
            return Err(ConfigError::Validation(
                "fit.scan_limit must be non-zero".into(),
            ));
        }
        self.background_fill()
            .map_err(|e| ConfigError::Validation(format!("background.color: {e}")))?;
        Ok(())
    }

    pub fn canvas_dimensions(&self) -> Dimensions {
        Dimensions::new(self.canvas.width, self.canvas.height)
    }

    pub fn catalog(&self) -> Vec<AspectRatio> {
        self.ratios
            .catalog
            .iter()
            .copied()
            .map(AspectRatio::from)
            .collect()
    }

    /// Build the ratio matcher described by `[ratios]`.
    pub fn matcher(&self) -> Result<RatioMatcher, FitError> {
        RatioMatcher::new(&self.catalog(), self.ratios.include_reciprocals)
    }

    pub fn fit_policy(&self) -> FitPolicy {
        let strategy = match self.fit.strategy {
            StrategyKind::Direct => FitStrategy::Direct,
            StrategyKind::Scan => FitStrategy::Scan {
                limit: self.fit.scan_limit,
            },
        };
        FitPolicy::new(self.fit.domination, strategy)
    }

    /// The background fill for the canvas mode.
    ///
    /// An unset color is the mode's transparent zero.
    pub fn background_fill(&self) -> Result<Fill, PixelError> {
        match &self.background.color {
            Some(color) => Fill::parse(color, self.canvas.mode),
            None => Ok(Fill::transparent(self.canvas.mode)),
        }
    }
}

/// Canvas preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Pixel mode of the canvas and of every padded image.
    pub mode: PixelMode,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 480,
            mode: PixelMode::Rgba,
        }
    }
}

/// Aspect ratio catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatiosConfig {
    /// Ratios as `[x, y]` pairs, in matching priority order.
    pub catalog: Vec<[u32; 2]>,
    /// Append the reciprocal of every catalog entry (portrait variants).
    pub include_reciprocals: bool,
}

impl Default for RatiosConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.iter().map(|r| [r.x, r.y]).collect(),
            include_reciprocals: true,
        }
    }
}

/// Which [`FitStrategy`] to use; the scan's limit lives in [`FitConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Direct,
    Scan,
}

/// Size fitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    pub domination: Domination,
    pub strategy: StrategyKind,
    /// Upper multiplier bound for the scan strategy; ignored by `direct`.
    pub scan_limit: u32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            domination: Domination::default(),
            strategy: StrategyKind::default(),
            scan_limit: crate::imaging::DEFAULT_SCAN_LIMIT,
        }
    }
}

/// Background fill settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// `#rrggbb`/`#rrggbbaa`-style hex for 8-bit modes (two digits per
    /// channel), a number for `I` and `F`. When absent, transparent zero.
    pub color: Option<String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Banner Gal Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the directory passed with --config
# (default: the current directory). Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Canvas preset
# ---------------------------------------------------------------------------
[canvas]
# Size of the canvas every padded image belongs to (Twitch banner).
width = 1200
height = 480

# Pixel mode of the canvas and every padded image.
# One of: 1, L, P, RGB, RGBA, CMYK, YCbCr, LAB, HSV, I, F.
# P and LAB have no conversion from decoded images and will fail at pad time.
mode = "RGBA"

# ---------------------------------------------------------------------------
# Aspect ratio catalog
# ---------------------------------------------------------------------------
[ratios]
# Candidate ratios as [x, y], in priority order. Ties keep the earlier entry.
catalog = [[32, 9], [21, 9], [16, 9], [16, 10], [4, 3], [1, 1], [5, 4], [3, 2], [5, 3], [3, 1]]

# Also try each ratio flipped (9:32, 9:21, ...) after the whole catalog.
include_reciprocals = true

# ---------------------------------------------------------------------------
# Size fitting
# ---------------------------------------------------------------------------
[fit]
# "strict": every image gets at least one pixel of padding per axis (>).
# "inclusive": the padded size may equal the image on an axis (>=).
domination = "strict"

# "direct": closed-form smallest multiple.
# "scan": bounded linear search over multipliers 0..scan_limit.
strategy = "direct"
scan_limit = 1000

# ---------------------------------------------------------------------------
# Background
# ---------------------------------------------------------------------------
[background]
# Two hex digits per channel of the canvas mode (#rrggbbaa for RGBA,
# #ll for L, ...). #rrggbb is accepted in RGBA as opaque.
# I and F modes take a plain number. Omit for transparent zero.
# color = "#00000000"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
