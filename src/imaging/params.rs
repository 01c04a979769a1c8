//! Parameter types for the transform pipeline.
//!
//! These types describe *what* to produce, not *how*. They sit between the
//! high-level [`operations`](super::operations) (which plans the transform)
//! and the [`backend`](super::backend) (which does the pixel work), so the
//! backend can be swapped for a mock without touching the planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: encode quality, default 90. Not clamped here:
//!   out-of-range values are the codec's business.
//! - [`FilterKind`]: resampling filter used for every resize.
//! - [`OutputStrategy`]: keep the source format, or force lossless WebP.
//! - [`OutputFormat`]: concrete encoded format plus its content type.
//! - [`TransformRequest`]: requested width / height / quality.
//! - [`TransformConfig`]: the policy knobs that stay fixed per deployment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding quality for formats that have a quality knob.
///
/// Unlike a clamped setting, the value is carried as given so a request for
/// `q=150` reaches the codec unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub i32);

impl Quality {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Resampling filter applied when scaling.
///
/// Deployments of the same crop policy have historically used different
/// filters, and the visual result differs, so the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// High-quality, downscale-oriented.
    #[default]
    Lanczos3,
    /// General-purpose smooth (bicubic).
    CatmullRom,
    Gaussian,
    Triangle,
    Nearest,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Lanczos3 => "lanczos3",
            FilterKind::CatmullRom => "catmull-rom",
            FilterKind::Gaussian => "gaussian",
            FilterKind::Triangle => "triangle",
            FilterKind::Nearest => "nearest",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lanczos3" | "lanczos" => Ok(FilterKind::Lanczos3),
            "catmull-rom" | "catmullrom" | "bicubic" => Ok(FilterKind::CatmullRom),
            "gaussian" => Ok(FilterKind::Gaussian),
            "triangle" | "bilinear" => Ok(FilterKind::Triangle),
            "nearest" => Ok(FilterKind::Nearest),
            other => Err(format!(
                "unknown filter '{other}' (expected lanczos3, catmull-rom, gaussian, triangle, nearest)"
            )),
        }
    }
}

/// Encoded output format.
///
/// The lower-cased [`name`](OutputFormat::name) is always the subtype of the
/// [`content_type`](OutputFormat::content_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Tiff,
    Bmp,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::Bmp => "image/bmp",
        }
    }

    /// Whether the encoder honours a [`Quality`] value.
    pub fn has_quality_knob(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the output format is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputStrategy {
    /// Re-encode in the source format; JPEG when the source format is
    /// unknown or has no encoder.
    #[default]
    Preserve,
    /// Always lossless WebP, whatever the source was.
    LosslessWebp,
}

impl OutputStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputStrategy::Preserve => "preserve",
            OutputStrategy::LosslessWebp => "lossless-webp",
        }
    }

    /// Pick the concrete output format for a source decoded as `source`.
    pub fn resolve(self, source: Option<OutputFormat>) -> OutputFormat {
        match self {
            OutputStrategy::Preserve => source.unwrap_or(OutputFormat::Jpeg),
            OutputStrategy::LosslessWebp => OutputFormat::WebP,
        }
    }
}

impl fmt::Display for OutputStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(OutputStrategy::Preserve),
            "lossless-webp" | "webp" => Ok(OutputStrategy::LosslessWebp),
            other => Err(format!(
                "unknown output strategy '{other}' (expected preserve, lossless-webp)"
            )),
        }
    }
}

/// A transform request as received from the front end.
///
/// Absent and zero mean the same thing: "not constrained on this axis".
/// Negative values are carried so the pipeline can reject them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformRequest {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub quality: Option<i32>,
}

impl TransformRequest {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Policy knobs for the transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Resampling filter for every resize.
    pub filter: FilterKind,
    /// Output format strategy.
    pub strategy: OutputStrategy,
    /// Quality used when the request does not carry one.
    pub quality: Quality,
    /// Upper bound on the encoded output; `None` or `0` disables the check.
    pub max_output_bytes: Option<usize>,
    /// Upper bound on the pixel count of any raster the transform allocates
    /// (the scaled image, before cropping); `None` or `0` disables the check.
    pub max_output_pixels: Option<u64>,
}

/// Largest payload the delivery front end can return in one response.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 6 * 1024 * 1024;

/// 50 megapixels: 200 MB as RGBA8.
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 50_000_000;

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            filter: FilterKind::default(),
            strategy: OutputStrategy::default(),
            quality: Quality::default(),
            max_output_bytes: Some(DEFAULT_MAX_OUTPUT_BYTES),
            max_output_pixels: Some(DEFAULT_MAX_OUTPUT_PIXELS),
        }
    }
}

impl TransformConfig {
    /// Short human-readable summary of the active policy.
    pub fn describe(&self) -> String {
        format!("filter={} strategy={}", self.filter, self.strategy)
    }

    /// Active byte limit, if any.
    pub fn byte_limit(&self) -> Option<usize> {
        self.max_output_bytes.filter(|&limit| limit > 0)
    }

    /// Active pixel limit, if any.
    pub fn pixel_limit(&self) -> Option<u64> {
        self.max_output_pixels.filter(|&limit| limit > 0)
    }

    /// Quality for `request`: its own value, else the configured default.
    pub fn effective_quality(&self, request: &TransformRequest) -> Quality {
        request.quality.map(Quality::new).unwrap_or(self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_is_not_clamped() {
        assert_eq!(Quality::new(0).value(), 0);
        assert_eq!(Quality::new(150).value(), 150);
        assert_eq!(Quality::new(-3).value(), -3);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn format_name_matches_content_subtype() {
        for format in [
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::WebP,
            OutputFormat::Gif,
            OutputFormat::Tiff,
            OutputFormat::Bmp,
        ] {
            let subtype = format.content_type().strip_prefix("image/").unwrap();
            assert_eq!(format.name().to_lowercase(), subtype);
        }
    }

    #[test]
    fn preserve_falls_back_to_jpeg() {
        assert_eq!(OutputStrategy::Preserve.resolve(None), OutputFormat::Jpeg);
        assert_eq!(
            OutputStrategy::Preserve.resolve(Some(OutputFormat::Png)),
            OutputFormat::Png
        );
    }

    #[test]
    fn lossless_webp_ignores_source() {
        assert_eq!(
            OutputStrategy::LosslessWebp.resolve(Some(OutputFormat::Jpeg)),
            OutputFormat::WebP
        );
        assert_eq!(OutputStrategy::LosslessWebp.resolve(None), OutputFormat::WebP);
    }

    #[test]
    fn filter_parses_aliases() {
        assert_eq!("Lanczos3".parse::<FilterKind>(), Ok(FilterKind::Lanczos3));
        assert_eq!("bicubic".parse::<FilterKind>(), Ok(FilterKind::CatmullRom));
        assert!("box".parse::<FilterKind>().is_err());
    }

    #[test]
    fn strategy_parses() {
        assert_eq!(
            "lossless-webp".parse::<OutputStrategy>(),
            Ok(OutputStrategy::LosslessWebp)
        );
        assert!("avif".parse::<OutputStrategy>().is_err());
    }

    #[test]
    fn request_quality_overrides_default() {
        let config = TransformConfig::default();
        let request = TransformRequest::new(100, 0).with_quality(40);
        assert_eq!(config.effective_quality(&request).value(), 40);
        assert_eq!(
            config.effective_quality(&TransformRequest::default()).value(),
            90
        );
    }

    #[test]
    fn zero_limits_mean_unlimited() {
        let config = TransformConfig {
            max_output_bytes: Some(0),
            max_output_pixels: Some(0),
            ..TransformConfig::default()
        };
        assert_eq!(config.byte_limit(), None);
        assert_eq!(config.pixel_limit(), None);

        let defaults = TransformConfig::default();
        assert_eq!(defaults.byte_limit(), Some(DEFAULT_MAX_OUTPUT_BYTES));
        assert_eq!(defaults.pixel_limit(), Some(DEFAULT_MAX_OUTPUT_PIXELS));
    }

    #[test]
    fn describe_names_filter_and_strategy() {
        let config = TransformConfig {
            filter: FilterKind::CatmullRom,
            strategy: OutputStrategy::LosslessWebp,
            ..TransformConfig::default()
        };
        assert_eq!(config.describe(), "filter=catmull-rom strategy=lossless-webp");
    }
}
