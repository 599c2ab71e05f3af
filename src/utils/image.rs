//! Image helpers shared by the gate and the tensor codec.

use crate::core::TriageResult;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use std::path::Path;

/// Computes dimensions whose longer side is at most `max_side`, preserving
/// the aspect ratio. Neither side drops below 1.
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side || longest == 0 {
        return (width, height);
    }
    let scale = max_side as f64 / longest as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_side);
    (scaled(width), scaled(height))
}

/// Returns an RGBA copy of `image` whose longer side is at most `max_side`.
///
/// Images already within bounds are converted without resampling.
pub fn downscale_to_max_side(image: &DynamicImage, max_side: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (target_w, target_h) = fit_within(width, height, max_side);
    if (target_w, target_h) == (width, height) {
        return image.to_rgba8();
    }
    image
        .resize_exact(target_w, target_h, FilterType::Triangle)
        .to_rgba8()
}

/// Resizes `image` to exactly `width`x`height` RGB with bilinear filtering.
pub fn resize_rgb(image: &DynamicImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.to_rgb8();
    }
    image
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8()
}

/// Loads and decodes an image from disk.
pub fn load_image(path: impl AsRef<Path>) -> TriageResult<DynamicImage> {
    Ok(image::open(path)?)
}
