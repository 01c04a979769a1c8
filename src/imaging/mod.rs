//! Transform pipeline: scale-to-cover and center-crop, scale-to-fit, or
//! pass-through, then encode.
//!
//! | Request | Operation |
//! |---|---|
//! | width and height | cover-scale, then center-crop to exactly width x height |
//! | width only | proportional scale, height follows |
//! | height only | proportional scale, width follows |
//! | neither | encode the source unchanged |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for transform geometry (unit testable)
//! - **Parameters**: Requests, filters, output strategies
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`transform`] combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, Raster};
pub use calculations::{CropBox, TransformPlan};
pub use operations::{TransformError, TransformOutput, transform, transform_bytes};
pub use params::{
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_MAX_OUTPUT_PIXELS, FilterKind, OutputFormat,
    OutputStrategy, Quality, TransformConfig, TransformRequest,
};
pub use rust_backend::RustBackend;
