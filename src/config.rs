//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `photo-finish.toml`. Stock
//! defaults are overridden by whatever the user file sets; CLI flags and
//! per-capture options override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [photo]
//! quality_prioritization = "balanced"  # speed (85) | balanced (92) | quality (100)
//! target_width = 0                     # 0 = keep the captured size
//! aspect_ratio = [4, 3]                # or a number such as 1.0
//!
//! [output]
//! temp_dir = "/tmp"                    # where unnamed captures go (default: system temp)
//! file_prefix = "photo-"               # prefix for temporary file names
//! sandbox_root = "/data/photos"        # reject explicit paths outside this directory
//!
//! [processing]
//! max_processes = 4                    # batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::AspectRatio;
use crate::options::{QualityPrioritization, TakePhotoOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
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

/// Configuration loaded from `photo-finish.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Default photo options, used when a capture carries none.
    pub photo: PhotoConfig,
    /// Where and how files are written.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.output.file_prefix;
        if prefix.is_empty() {
            return Err(ConfigError::Validation(
                "output.file_prefix must not be empty".into(),
            ));
        }
        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.file_prefix must not contain path separators".into(),
            ));
        }
        if let Some(dir) = &self.output.temp_dir
            && !dir.is_absolute()
        {
            return Err(ConfigError::Validation(format!(
                "output.temp_dir must be absolute, got {}",
                dir.display()
            )));
        }
        if let Some(root) = &self.output.sandbox_root
            && !root.is_absolute()
        {
            return Err(ConfigError::Validation(format!(
                "output.sandbox_root must be absolute, got {}",
                root.display()
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Default photo options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoConfig {
    pub quality_prioritization: QualityPrioritization,
    /// Output width in pixels, 0 keeps the captured size.
    pub target_width: u32,
    /// Output aspect ratio; 4:3 keeps the full frame.
    pub aspect_ratio: AspectRatio,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            quality_prioritization: QualityPrioritization::Balanced,
            target_width: 0,
            aspect_ratio: AspectRatio::NATIVE,
        }
    }
}

impl PhotoConfig {
    /// Host options equivalent to these defaults.
    pub fn to_options(&self) -> TakePhotoOptions {
        TakePhotoOptions {
            quality_prioritization: self.quality_prioritization,
            target_width: self.target_width,
            aspect_ratio: self.aspect_ratio,
            ..TakePhotoOptions::default()
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for captures without an explicit path.
    /// When absent, the system temp directory is used.
    pub temp_dir: Option<PathBuf>,
    /// File name prefix for temporary captures.
    pub file_prefix: String,
    /// When set, explicit output paths must resolve inside this directory.
    pub sandbox_root: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            file_prefix: "photo-".to_string(),
            sandbox_root: None,
        }
    }
}

impl OutputConfig {
    /// The directory temporary captures are written to.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
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
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
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
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is missing.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `photo-finish.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-finish configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Photo defaults (used when a capture carries no options of its own)
# ---------------------------------------------------------------------------
[photo]
# JPEG quality tier: "speed" (85), "balanced" (92) or "quality" (100).
quality_prioritization = "balanced"

# Output width in pixels. 0 keeps the captured size.
target_width = 0

# Output aspect ratio as [width, height] or a number.
# [4, 3] keeps the full sensor frame; [1, 1] and [16, 9] crop.
# Other ratios are accepted but leave the frame uncropped.
aspect_ratio = [4, 3]

# ---------------------------------------------------------------------------
# Output files
# ---------------------------------------------------------------------------
[output]
# Directory for captures without an explicit file path. Must be absolute.
# Omit to use the system temp directory.
# temp_dir = "/tmp"

# File name prefix for those temporary captures.
file_prefix = "photo-"

# Reject explicit output paths outside this directory. Must be absolute.
# sandbox_root = "/data/photos"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
