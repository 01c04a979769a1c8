//! Codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the codec capability the transform pipeline
//! is written against: decode, resize, crop, and encode. Everything the
//! pipeline decides (which branch, which box, which format) happens above
//! this line; everything below it is pixel work.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::calculations::CropBox;
use super::params::{FilterKind, OutputFormat, Quality};
use crate::types::Dimensions;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not a decodable image: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// A decoded image plus the format it was decoded from.
#[derive(Debug, Clone)]
pub struct Raster {
    pub image: DynamicImage,
    /// Source format when it is one we can also encode.
    pub source_format: Option<OutputFormat>,
}

impl Raster {
    pub fn new(image: DynamicImage, source_format: Option<OutputFormat>) -> Self {
        Self {
            image,
            source_format,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = self.image.dimensions();
        Dimensions { width, height }
    }
}

/// Trait for codec backends.
///
/// Implementations must be stateless between calls: the pipeline may be
/// driven from several request threads at once.
pub trait ImageBackend: Sync {
    /// Decode encoded bytes into a raster, remembering the source format.
    fn decode(&self, bytes: &[u8]) -> Result<Raster, BackendError>;

    /// Resize to exactly `target`, ignoring aspect ratio.
    fn resize(
        &self,
        raster: &Raster,
        target: Dimensions,
        filter: FilterKind,
    ) -> Result<Raster, BackendError>;

    /// Cut `region` out of the raster. The region must lie inside it.
    fn crop(&self, raster: &Raster, region: CropBox) -> Result<Raster, BackendError>;

    /// Encode to `format`. `quality` is only meaningful for formats that
    /// have a quality knob.
    fn encode(
        &self,
        raster: &Raster,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations and fabricates blank rasters.
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<(Dimensions, Option<OutputFormat>)>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Resize {
            width: u32,
            height: u32,
            filter: FilterKind,
        },
        Crop(CropBox),
        Encode {
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: i32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_source(dims: Dimensions, format: Option<OutputFormat>) -> Self {
            Self {
                decode_results: Mutex::new(vec![(dims, format)]),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    pub fn blank_raster(dims: Dimensions, format: Option<OutputFormat>) -> Raster {
        Raster::new(DynamicImage::new_luma8(dims.width, dims.height), format)
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<Raster, BackendError> {
            self.record(RecordedOp::Decode(bytes.len()));
            self.decode_results
                .lock()
                .unwrap()
                .pop()
                .map(|(dims, format)| blank_raster(dims, format))
                .ok_or_else(|| BackendError::Decode("no mock raster".to_string()))
        }

        fn resize(
            &self,
            raster: &Raster,
            target: Dimensions,
            filter: FilterKind,
        ) -> Result<Raster, BackendError> {
            self.record(RecordedOp::Resize {
                width: target.width,
                height: target.height,
                filter,
            });
            Ok(blank_raster(target, raster.source_format))
        }

        fn crop(&self, raster: &Raster, region: CropBox) -> Result<Raster, BackendError> {
            self.record(RecordedOp::Crop(region));
            Ok(blank_raster(
                Dimensions::new(region.width, region.height),
                raster.source_format,
            ))
        }

        fn encode(
            &self,
            raster: &Raster,
            format: OutputFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            let dims = raster.dimensions();
            self.record(RecordedOp::Encode {
                width: dims.width,
                height: dims.height,
                format,
                quality: quality.value(),
            });
            Ok(format!("{}:{}", format, dims).into_bytes())
        }
    }

    #[test]
    fn mock_decodes_configured_raster() {
        let backend =
            MockBackend::with_source(Dimensions::new(800, 600), Some(OutputFormat::Png));

        let raster = backend.decode(b"fake").unwrap();
        assert_eq!(raster.dimensions(), Dimensions::new(800, 600));
        assert_eq!(raster.source_format, Some(OutputFormat::Png));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(4)]);
    }

    #[test]
    fn mock_decode_fails_when_exhausted() {
        let backend = MockBackend::new();
        assert!(matches!(backend.decode(b""), Err(BackendError::Decode(_))));
    }

    #[test]
    fn mock_records_resize_and_crop() {
        let backend = MockBackend::new();
        let raster = blank_raster(Dimensions::new(100, 50), None);

        let resized = backend
            .resize(&raster, Dimensions::new(40, 20), FilterKind::CatmullRom)
            .unwrap();
        let cropped = backend
            .crop(
                &resized,
                CropBox {
                    x: 10,
                    y: 0,
                    width: 20,
                    height: 20,
                },
            )
            .unwrap();

        assert_eq!(cropped.dimensions(), Dimensions::new(20, 20));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 40,
                height: 20,
                filter: FilterKind::CatmullRom
            }
        ));
    }
}
