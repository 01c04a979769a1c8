//! Tool configuration.
//!
//! Handles loading, validating, and merging `imgparity.toml`. User values
//! are layered over stock defaults, so a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [search]
//! reference_base = "https://reference.example.com"
//! candidate_base = "https://candidate.example.com"
//! images = []                # Image paths, e.g. "/catalog/product/a.jpg"
//! dimensions = [[135, 191], [249, 352], [355, 503], [707, 1000]]
//! max_concurrency = 5        # Images searched in parallel
//!
//! [fetch]
//! # timeout_secs = 30        # Per-request timeout (omit for none)
//!
//! [transform]
//! filter = "lanczos3"        # lanczos3, catmull-rom, gaussian, triangle, nearest
//! strategy = "preserve"      # preserve, lossless-webp
//! quality = 90               # Default JPEG quality (1-100)
//! max_output_bytes = 6291456 # Reject encoded output above this size (0 = no limit)
//! max_output_pixels = 50000000 # Reject transforms needing a larger raster (0 = no limit)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::TransformConfig;
use crate::search::{CandidateTemplate, ImageJob, ReferenceTemplate};
use crate::types::Dimensions;
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
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full tool configuration loaded from `imgparity.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Quality-parity search settings.
    pub search: SearchConfig,
    /// HTTP client settings shared by every fetch.
    pub fetch: FetchConfig,
    /// Transform pipeline settings.
    pub transform: TransformConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "search.max_concurrency must be at least 1".into(),
            ));
        }
        if self.search.reference_base.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search.reference_base must not be empty".into(),
            ));
        }
        if self.search.candidate_base.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search.candidate_base must not be empty".into(),
            ));
        }
        if let Some(path) = self.search.images.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Validation(format!(
                "search.images entries must start with '/', got {path:?}"
            )));
        }
        if let Some(d) = self.search.dimensions.iter().find(|d| d[0] == 0 || d[1] == 0) {
            return Err(ConfigError::Validation(format!(
                "search.dimensions values must be non-zero, got [{}, {}]",
                d[0], d[1]
            )));
        }
        let quality = self.transform.quality.value();
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::Validation(
                "transform.quality must be 1-100".into(),
            ));
        }
        if self.fetch.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Which images to compare, at which sizes, against which pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Base URL of the reference pipeline.
    pub reference_base: String,
    /// Base URL of the candidate pipeline.
    pub candidate_base: String,
    /// Image paths appended to both bases. Each becomes one job.
    pub images: Vec<String>,
    /// Target sizes as `[width, height]`, searched in this order per image.
    pub dimensions: Vec<[u32; 2]>,
    /// Number of images searched concurrently.
    pub max_concurrency: usize,
}

pub const DEFAULT_DIMENSIONS: [[u32; 2]; 4] = [[135, 191], [249, 352], [355, 503], [707, 1000]];

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            reference_base: "https://reference.example.com".to_string(),
            candidate_base: "https://candidate.example.com".to_string(),
            images: Vec::new(),
            dimensions: DEFAULT_DIMENSIONS.to_vec(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl SearchConfig {
    /// One job per configured image, each covering every dimension.
    pub fn jobs(&self) -> Vec<ImageJob> {
        let dimensions: Vec<Dimensions> =
            self.dimensions.iter().map(|&d| Dimensions::from(d)).collect();
        let reference = ReferenceTemplate::new(self.reference_base.as_str());
        let candidate = CandidateTemplate::new(self.candidate_base.as_str());
        self.images
            .iter()
            .map(|path| {
                ImageJob::new(
                    path.as_str(),
                    dimensions.clone(),
                    reference.clone(),
                    candidate.clone(),
                )
            })
            .collect()
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-request timeout in seconds. When absent, requests never time out.
    pub timeout_secs: Option<u64>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
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
/// Returns `Err` if the file exists but contains invalid TOML.
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
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `imgparity.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgparity configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Quality-parity search
# ---------------------------------------------------------------------------
[search]
# Reference pipeline. Renditions are requested as
#   {reference_base}{image}?tr=h-{height},w-{width}
reference_base = "https://reference.example.com"

# Candidate pipeline. Renditions are requested as
#   {candidate_base}/{width}x{height}/filters:quality({quality}){image}
candidate_base = "https://candidate.example.com"

# Image paths to compare. Each path starts with "/".
images = []

# Target sizes as [width, height]. Every image is searched at every size.
dimensions = [[135, 191], [249, 352], [355, 503], [707, 1000]]

# Number of images searched at the same time.
max_concurrency = 5

# ---------------------------------------------------------------------------
# HTTP
# ---------------------------------------------------------------------------
[fetch]
# Per-request timeout in seconds. Omit for no timeout.
# timeout_secs = 30

# ---------------------------------------------------------------------------
# Transform pipeline
# ---------------------------------------------------------------------------
[transform]
# Resampling filter: lanczos3, catmull-rom, gaussian, triangle, nearest.
filter = "lanczos3"

# Output format: "preserve" keeps the source format (JPEG when unknown),
# "lossless-webp" always writes lossless WebP.
strategy = "preserve"

# Default JPEG quality when a request does not give one (1-100).
quality = 90

# Encoded outputs larger than this many bytes are rejected (6 MiB).
# Set to 0 for no limit.
max_output_bytes = 6291456

# Transforms whose scaled raster would exceed this many pixels are rejected
# before any pixel work starts. Set to 0 for no limit.
max_output_pixels = 50000000
"##
}
