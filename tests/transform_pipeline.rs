//! End-to-end transform tests through the real `image` codecs.
//!
//! Run with: cargo test --test transform_pipeline

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use imgparity::imaging::{
    OutputFormat, OutputStrategy, RustBackend, TransformConfig, TransformError, TransformRequest,
    transform_bytes,
};
use std::io::Cursor;

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

fn decoded_dims(bytes: &[u8]) -> (u32, u32) {
    image::load_from_memory(bytes).unwrap().dimensions()
}

#[test]
fn width_only_keeps_aspect_ratio() {
    let source = encoded(1200, 600, ImageFormat::Jpeg);
    let out = transform_bytes(
        &RustBackend::new(),
        &source,
        &TransformRequest::new(300, 0),
        &TransformConfig::default(),
    )
    .unwrap();

    assert_eq!(out.content_type(), "image/jpeg");
    assert_eq!((out.dimensions.width, out.dimensions.height), (300, 150));
    assert_eq!(decoded_dims(&out.bytes), (300, 150));
}

#[test]
fn height_only_keeps_aspect_ratio() {
    let source = encoded(1200, 600, ImageFormat::Png);
    let out = transform_bytes(
        &RustBackend::new(),
        &source,
        &TransformRequest::new(0, 100),
        &TransformConfig::default(),
    )
    .unwrap();

    assert_eq!(out.format, OutputFormat::Png);
    assert_eq!(decoded_dims(&out.bytes), (200, 100));
}

#[test]
fn box_request_outputs_exact_size() {
    let backend = RustBackend::new();
    let config = TransformConfig::default();
    let source = encoded(1000, 500, ImageFormat::Png);

    for (w, h) in [(200, 200), (300, 100), (100, 300), (999, 1), (1, 499)] {
        let out = transform_bytes(
            &backend,
            &source,
            &TransformRequest::new(w, h),
            &config,
        )
        .unwrap();
        assert_eq!(decoded_dims(&out.bytes), (w as u32, h as u32), "request {w}x{h}");
    }
}

#[test]
fn square_box_from_wide_source_crops_center() {
    // 1000x500 into 200x200: scaled to 400x200, columns 100..300 kept.
    let source = encoded(1000, 500, ImageFormat::Png);
    let out = transform_bytes(
        &RustBackend::new(),
        &source,
        &TransformRequest::new(200, 200),
        &TransformConfig::default(),
    )
    .unwrap();
    assert_eq!(out.dimensions.width, 200);
    assert_eq!(out.dimensions.height, 200);
}

#[test]
fn no_dimensions_passes_through() {
    let source = encoded(64, 48, ImageFormat::Png);
    let out = transform_bytes(
        &RustBackend::new(),
        &source,
        &TransformRequest::default(),
        &TransformConfig::default(),
    )
    .unwrap();

    assert_eq!(out.format, OutputFormat::Png);
    assert_eq!(decoded_dims(&out.bytes), (64, 48));
    // PNG is lossless, so pixels survive the round trip.
    assert_eq!(
        image::load_from_memory(&out.bytes).unwrap().to_rgb8(),
        image::load_from_memory(&source).unwrap().to_rgb8()
    );
}

#[test]
fn same_input_gives_identical_bytes() {
    let backend = RustBackend::new();
    let config = TransformConfig::default();
    let source = encoded(640, 480, ImageFormat::Jpeg);
    let request = TransformRequest::new(160, 160).with_quality(70);

    let a = transform_bytes(&backend, &source, &request, &config).unwrap();
    let b = transform_bytes(&backend, &source, &request, &config).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn lower_quality_gives_smaller_jpeg() {
    let backend = RustBackend::new();
    let config = TransformConfig::default();
    let source = encoded(400, 300, ImageFormat::Jpeg);

    let low = transform_bytes(
        &backend,
        &source,
        &TransformRequest::new(200, 0).with_quality(10),
        &config,
    )
    .unwrap();
    let high = transform_bytes(
        &backend,
        &source,
        &TransformRequest::new(200, 0).with_quality(95),
        &config,
    )
    .unwrap();
    assert!(low.bytes.len() < high.bytes.len());
}

#[test]
fn lossless_webp_strategy() {
    let config = TransformConfig {
        strategy: OutputStrategy::LosslessWebp,
        ..TransformConfig::default()
    };
    let source = encoded(120, 80, ImageFormat::Jpeg);
    let out = transform_bytes(
        &RustBackend::new(),
        &source,
        &TransformRequest::new(60, 0),
        &config,
    )
    .unwrap();

    assert_eq!(out.content_type(), "image/webp");
    assert_eq!(
        image::guess_format(&out.bytes).unwrap(),
        ImageFormat::WebP
    );
    assert_eq!(decoded_dims(&out.bytes), (60, 40));
}

#[test]
fn undecodable_bytes_are_a_decode_error() {
    let result = transform_bytes(
        &RustBackend::new(),
        b"definitely not an image",
        &TransformRequest::new(10, 10),
        &TransformConfig::default(),
    );
    assert!(matches!(result, Err(TransformError::Decode(_))));
}

#[test]
fn negative_dimension_is_rejected_before_decode() {
    // Garbage bytes: a decode attempt would fail with Decode instead.
    let result = transform_bytes(
        &RustBackend::new(),
        b"garbage",
        &TransformRequest::new(-5, 10),
        &TransformConfig::default(),
    );
    assert!(matches!(result, Err(TransformError::InvalidRequest(_))));
}

#[test]
fn oversized_output_is_rejected() {
    let config = TransformConfig {
        max_output_bytes: Some(64),
        ..TransformConfig::default()
    };
    let source = encoded(200, 200, ImageFormat::Png);
    let result = transform_bytes(
        &RustBackend::new(),
        &source,
        &TransformRequest::default(),
        &config,
    );
    assert!(matches!(
        result,
        Err(TransformError::TooLarge { limit: 64, .. })
    ));
}
