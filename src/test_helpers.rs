//! Shared test utilities.
//!
//! Synthetic rasters for codec tests. A gradient gives every pixel a
//! distinct-ish value so resampling and cropping produce observable changes,
//! unlike a flat fill.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// RGB gradient of the given size: red follows x, green follows y.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    DynamicImage::ImageRgb8(img)
}

/// [`gradient_image`] encoded in `format`.
pub fn encoded_gradient(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient_image(width, height)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}
