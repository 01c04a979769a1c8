//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, TIFF, BMP) | `image::ImageReader` with guessed format |
//! | Resize | `DynamicImage::resize_exact` with the configured [`FilterKind`] |
//! | Crop | `DynamicImage::crop_imm` (bounds checked first) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder::new_lossless` |
//! | Encode → PNG, GIF, TIFF, BMP | `DynamicImage::write_to` |
//!
//! The `image` crate's WebP encoder is lossless only, so WebP output is
//! always lossless regardless of the requested quality.

use super::backend::{BackendError, ImageBackend, Raster};
use super::calculations::CropBox;
use super::params::{FilterKind, OutputFormat, Quality};
use crate::types::Dimensions;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type(kind: FilterKind) -> FilterType {
    match kind {
        FilterKind::Lanczos3 => FilterType::Lanczos3,
        FilterKind::CatmullRom => FilterType::CatmullRom,
        FilterKind::Gaussian => FilterType::Gaussian,
        FilterKind::Triangle => FilterType::Triangle,
        FilterKind::Nearest => FilterType::Nearest,
    }
}

/// Map a decoded format onto one we can encode back, if any.
fn encodable_format(format: ImageFormat) -> Option<OutputFormat> {
    match format {
        ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        ImageFormat::Png => Some(OutputFormat::Png),
        ImageFormat::WebP => Some(OutputFormat::WebP),
        ImageFormat::Gif => Some(OutputFormat::Gif),
        ImageFormat::Tiff => Some(OutputFormat::Tiff),
        ImageFormat::Bmp => Some(OutputFormat::Bmp),
        _ => None,
    }
}

/// JPEG quality as the encoder accepts it. The encoder only takes 1-100.
fn jpeg_quality(quality: Quality) -> u8 {
    quality.value().clamp(1, 100) as u8
}

/// Drop to 8-bit RGB or RGBA, the layouts every encoder here accepts.
fn to_8bit(img: &DynamicImage, keep_alpha: bool) -> DynamicImage {
    if keep_alpha && img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let mut buffer = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buffer,
                jpeg_quality(quality),
            );
            to_8bit(img, false).write_with_encoder(encoder)
        }
        OutputFormat::WebP => {
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut buffer);
            to_8bit(img, true).write_with_encoder(encoder)
        }
        OutputFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
        OutputFormat::Png => {
            to_8bit(img, true).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        }
        OutputFormat::Tiff => {
            to_8bit(img, true).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Tiff)
        }
        OutputFormat::Bmp => {
            to_8bit(img, true).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Bmp)
        }
    };
    result.map_err(|e| BackendError::Encode(format!("{format}: {e}")))?;
    Ok(buffer)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<Raster, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let format = reader.format();
        let image = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Raster::new(image, format.and_then(encodable_format)))
    }

    fn resize(
        &self,
        raster: &Raster,
        target: Dimensions,
        filter: FilterKind,
    ) -> Result<Raster, BackendError> {
        if target.is_empty() {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot resize to {target}"
            )));
        }
        let resized = raster
            .image
            .resize_exact(target.width, target.height, filter_type(filter));
        Ok(Raster::new(resized, raster.source_format))
    }

    fn crop(&self, raster: &Raster, region: CropBox) -> Result<Raster, BackendError> {
        let dims = raster.dimensions();
        let fits = region.x.checked_add(region.width).is_some_and(|r| r <= dims.width)
            && region.y.checked_add(region.height).is_some_and(|b| b <= dims.height);
        if !fits {
            return Err(BackendError::ProcessingFailed(format!(
                "crop {}x{}+{}+{} exceeds {dims}",
                region.width, region.height, region.x, region.y
            )));
        }
        let cropped = raster
            .image
            .crop_imm(region.x, region.y, region.width, region.height);
        Ok(Raster::new(cropped, raster.source_format))
    }

    fn encode(
        &self,
        raster: &Raster,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        encode_image(&raster.image, format, quality)
    }
}
