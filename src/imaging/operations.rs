//! The transform pipeline.
//!
//! These functions combine calculations with backend execution: validate
//! the request, plan the geometry, drive the backend, and check the result.

use super::backend::{BackendError, ImageBackend, Raster};
use super::calculations::{TransformPlan, oriented_scale_factor, plan_transform};
use super::params::{OutputFormat, TransformConfig, TransformRequest};
use crate::types::Dimensions;
use thiserror::Error;

/// Errors from a single transform call. Each variant names the stage that
/// failed; nothing is left half-done, so callers can simply report it.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("decode failed: {0}")]
    Decode(#[source] BackendError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{stage} failed: {source}")]
    Processing {
        stage: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("encode failed: {0}")]
    Encode(#[source] BackendError),
    #[error("encoded output is {size} bytes, over the {limit}-byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("transform needs a {pixels}-pixel raster, over the {limit}-pixel limit")]
    TooManyPixels { pixels: u64, limit: u64 },
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Encoded transform result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Dimensions of the raster that was encoded.
    pub dimensions: Dimensions,
}

impl TransformOutput {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

fn axis(value: Option<i64>, name: &str) -> Result<u32> {
    match value {
        None => Ok(0),
        Some(v) if v < 0 => Err(TransformError::InvalidRequest(format!(
            "{name} must not be negative (got {v})"
        ))),
        Some(v) => u32::try_from(v).map_err(|_| {
            TransformError::InvalidRequest(format!("{name} {v} is out of range"))
        }),
    }
}

/// Validate a request and return the target `(width, height)`, zero meaning
/// unconstrained.
pub fn resolve_target(request: &TransformRequest) -> Result<(u32, u32)> {
    Ok((axis(request.width, "width")?, axis(request.height, "height")?))
}

/// Plan a transform without executing it.
///
/// Plans whose intermediate raster exceeds `config.max_output_pixels` are
/// rejected here, before the backend allocates anything.
pub fn plan(
    source: Dimensions,
    request: &TransformRequest,
    config: &TransformConfig,
) -> Result<TransformPlan> {
    let (width, height) = resolve_target(request)?;
    let plan = plan_transform(source, width, height);
    if plan != TransformPlan::PassThrough && source.is_empty() {
        return Err(TransformError::InvalidRequest(format!(
            "cannot scale a {source} source"
        )));
    }
    let pixels = plan.working_pixels();
    if let Some(limit) = config.pixel_limit().filter(|&limit| pixels > limit) {
        return Err(TransformError::TooManyPixels { pixels, limit });
    }
    Ok(plan)
}

/// Transform an already-decoded raster.
pub fn transform(
    backend: &impl ImageBackend,
    raster: &Raster,
    request: &TransformRequest,
    config: &TransformConfig,
) -> Result<TransformOutput> {
    let source = raster.dimensions();
    let plan = plan(source, request, config)?;

    let resized;
    let cropped;
    let output_raster = match plan {
        TransformPlan::PassThrough => raster,
        TransformPlan::Scale(target) => {
            resized = backend
                .resize(raster, target, config.filter)
                .map_err(|source| TransformError::Processing {
                    stage: "resize",
                    source,
                })?;
            &resized
        }
        TransformPlan::CoverCrop { scaled, crop } => {
            let target = Dimensions::new(crop.width, crop.height);
            let oriented = oriented_scale_factor(source, target);
            let scaled_by_orientation = (
                (source.width as f64 * oriented).round() as u32,
                (source.height as f64 * oriented).round() as u32,
            );
            if scaled_by_orientation.0 < target.width || scaled_by_orientation.1 < target.height
            {
                tracing::debug!(
                    source = %source,
                    target = %target,
                    scaled = %scaled,
                    "Oriented scale under-covers the box, scaling by the other axis"
                );
            }
            resized = backend
                .resize(raster, scaled, config.filter)
                .map_err(|source| TransformError::Processing {
                    stage: "resize",
                    source,
                })?;
            cropped = backend
                .crop(&resized, crop)
                .map_err(|source| TransformError::Processing {
                    stage: "crop",
                    source,
                })?;
            &cropped
        }
    };

    let format = config.strategy.resolve(raster.source_format);
    let quality = config.effective_quality(request);
    tracing::debug!(
        plan = ?plan,
        format = %format,
        quality = quality.value(),
        policy = %config.describe(),
        "Encoding transform output"
    );
    let bytes = backend
        .encode(output_raster, format, quality)
        .map_err(TransformError::Encode)?;

    if let Some(limit) = config.byte_limit().filter(|&limit| bytes.len() > limit) {
        return Err(TransformError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }

    Ok(TransformOutput {
        bytes,
        format,
        dimensions: output_raster.dimensions(),
    })
}

/// Decode `bytes`, then [`transform`] the result.
pub fn transform_bytes(
    backend: &impl ImageBackend,
    bytes: &[u8],
    request: &TransformRequest,
    config: &TransformConfig,
) -> Result<TransformOutput> {
    // Reject bad parameters before paying for a decode.
    resolve_target(request)?;
    let raster = backend.decode(bytes).map_err(TransformError::Decode)?;
    transform(backend, &raster, request, config)
}
