//! Pure calculation functions for transform geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::Dimensions;

/// A crop region in the coordinates of the (already scaled) raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// What the pipeline will do to the source raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformPlan {
    /// Encode the source unchanged.
    PassThrough,
    /// Uniform scale to exactly these dimensions, no crop.
    Scale(Dimensions),
    /// Uniform scale to `scaled`, then cut `crop` out of it.
    CoverCrop { scaled: Dimensions, crop: CropBox },
}

impl TransformPlan {
    /// Pixel count of the largest raster the plan allocates beyond the
    /// decoded source. Zero for pass-through.
    pub fn working_pixels(&self) -> u64 {
        let area = |d: Dimensions| u64::from(d.width) * u64::from(d.height);
        match self {
            TransformPlan::PassThrough => 0,
            TransformPlan::Scale(target) => area(*target),
            TransformPlan::CoverCrop { scaled, .. } => area(*scaled),
        }
    }
}

/// Scale factor chosen by request orientation alone.
///
/// Landscape or square requests (`width >= height`) scale by width,
/// portrait requests by height. On its own this can under-cover the box,
/// e.g. a 1000x500 source into 200x200 scales to 200x100.
pub fn oriented_scale_factor(source: Dimensions, target: Dimensions) -> f64 {
    if target.width >= target.height {
        target.width as f64 / source.width as f64
    } else {
        target.height as f64 / source.height as f64
    }
}

/// Scale factor that makes the source cover the target box.
///
/// Starts from [`oriented_scale_factor`] and promotes to the other axis when
/// the oriented factor would leave the scaled raster short of the box. When
/// the oriented factor already covers, the two are equal.
pub fn cover_scale_factor(source: Dimensions, target: Dimensions) -> f64 {
    let by_width = target.width as f64 / source.width as f64;
    let by_height = target.height as f64 / source.height as f64;
    oriented_scale_factor(source, target).max(by_width.max(by_height))
}

/// Centered crop of `target` out of `scaled`.
///
/// Offsets use floor division, so an odd surplus puts the extra pixel on the
/// right/bottom edge.
pub fn center_crop_box(scaled: Dimensions, target: Dimensions) -> CropBox {
    CropBox {
        x: scaled.width.saturating_sub(target.width) / 2,
        y: scaled.height.saturating_sub(target.height) / 2,
        width: target.width,
        height: target.height,
    }
}

/// The other side of a proportional resize.
///
/// Given the source's `axis` length scaled to `target`, returns `other`
/// scaled by the same ratio, rounded, and at least 1.
///
/// ```
/// # use imgparity::imaging::calculations::proportional_dimension;
/// // 1200x600 at width 300 -> height 150
/// assert_eq!(proportional_dimension(600, 300, 1200), 150);
/// ```
pub fn proportional_dimension(other: u32, target: u32, axis: u32) -> u32 {
    let value = (other as f64 * target as f64 / axis as f64).round() as u32;
    value.max(1)
}

/// Plan a transform of `source` for a requested `width` x `height`.
///
/// Zero on an axis means "unconstrained". Callers must reject a zero-sized
/// source before asking for anything but pass-through.
pub fn plan_transform(source: Dimensions, width: u32, height: u32) -> TransformPlan {
    match (width, height) {
        (0, 0) => TransformPlan::PassThrough,
        (w, 0) => TransformPlan::Scale(Dimensions::new(
            w,
            proportional_dimension(source.height, w, source.width),
        )),
        (0, h) => TransformPlan::Scale(Dimensions::new(
            proportional_dimension(source.width, h, source.height),
            h,
        )),
        (w, h) => {
            let target = Dimensions::new(w, h);
            let factor = cover_scale_factor(source, target);
            let scaled = Dimensions::new(
                ((source.width as f64 * factor).round() as u32).max(w),
                ((source.height as f64 * factor).round() as u32).max(h),
            );
            TransformPlan::CoverCrop {
                scaled,
                crop: center_crop_box(scaled, target),
            }
        }
    }
}
