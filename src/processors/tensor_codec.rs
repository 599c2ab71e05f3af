//! Conversions between images and model tensors.
//!
//! [`pack`] produces the exact input layout the lesion classifier was trained
//! with: `[1, side, side, 3]` float32, row-major, RGB, raw 0–255 magnitudes.
//! Any deviation (scaling, mean subtraction, BGR) silently invalidates the
//! probability, so the packing applies no normalization at all.
//!
//! [`to_overlay`] turns a saliency grid into a false-color image sized to the
//! packed preview, and [`blend_overlay`] composites it for display.

use super::color::jet;
use crate::core::{ProcessingStage, Tensor4D, TriageError, TriageResult};
use crate::utils::image::resize_rgb;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::{Array2, Array4, ArrayView2};

/// Minimum dynamic range treated as non-flat during saliency normalization.
pub const NORMALIZATION_EPSILON: f32 = 1e-6;

/// Blend strength used when compositing a heatmap onto its preview.
pub const DEFAULT_OVERLAY_STRENGTH: f32 = 0.45;

/// A packed model input together with the image it was packed from.
#[derive(Debug, Clone)]
pub struct PackedInput {
    /// `[1, side, side, 3]` float32 tensor.
    pub tensor: Tensor4D,
    /// The resized image whose pixels `tensor` holds.
    pub preview: RgbImage,
}

/// Resizes `image` to `side`x`side` and packs it as an NHWC float tensor.
///
/// # Errors
///
/// Returns [`TriageError::InvalidInput`] when `side` or either image dimension
/// is zero.
pub fn pack(image: &DynamicImage, side: u32) -> TriageResult<PackedInput> {
    let (width, height) = image.dimensions();
    if side == 0 || width == 0 || height == 0 {
        return Err(TriageError::InvalidInput {
            message: format!("cannot pack a {width}x{height} image at side {side}"),
        });
    }

    let preview = resize_rgb(image, side, side);
    let data: Vec<f32> = preview.as_raw().iter().map(|&v| v as f32).collect();
    let side = side as usize;
    let tensor = Array4::from_shape_vec((1, side, side, 3), data).map_err(|e| {
        TriageError::processing(
            ProcessingStage::TensorPacking,
            format!("failed to shape packed input as [1, {side}, {side}, 3]"),
            e,
        )
    })?;

    Ok(PackedInput { tensor, preview })
}

/// Min-max normalizes a saliency grid to `[0, 1]`.
///
/// A grid whose dynamic range is below [`NORMALIZATION_EPSILON`] (including a
/// grid with no finite values) collapses to 0.5 everywhere. Non-finite cells
/// map to 0.
pub fn normalize_saliency(saliency: ArrayView2<'_, f32>) -> Array2<f32> {
    let (min, max) = saliency
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    if !range.is_finite() || range < NORMALIZATION_EPSILON {
        return Array2::from_elem(saliency.raw_dim(), 0.5);
    }

    saliency.mapv(|v| {
        if v.is_finite() {
            ((v - min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        }
    })
}

/// Renders a saliency grid as a jet-colored overlay of `out_width`x`out_height`.
///
/// The colormap is applied at the grid's native resolution and the colored
/// tile is then upscaled bilinearly. The result is fully opaque; blending onto
/// the photo is the caller's job (see [`blend_overlay`]).
pub fn to_overlay(
    saliency: ArrayView2<'_, f32>,
    out_width: u32,
    out_height: u32,
) -> TriageResult<RgbaImage> {
    let (rows, cols) = saliency.dim();
    if rows == 0 || cols == 0 || out_width == 0 || out_height == 0 {
        return Err(TriageError::InvalidInput {
            message: format!(
                "cannot render a {cols}x{rows} saliency grid at {out_width}x{out_height}"
            ),
        });
    }

    let normalized = normalize_saliency(saliency);
    let tile = RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        Rgb(jet(normalized[[y as usize, x as usize]]))
    });

    let scaled = if (cols as u32, rows as u32) == (out_width, out_height) {
        tile
    } else {
        image::imageops::resize(&tile, out_width, out_height, FilterType::Triangle)
    };

    Ok(DynamicImage::ImageRgb8(scaled).to_rgba8())
}

/// Alpha-composites `overlay` onto `base` with the given strength.
///
/// The overlay's own alpha channel scales `strength` per pixel.
pub fn blend_overlay(
    base: &RgbImage,
    overlay: &RgbaImage,
    strength: f32,
) -> TriageResult<RgbImage> {
    if base.dimensions() != overlay.dimensions() {
        return Err(TriageError::InvalidInput {
            message: format!(
                "overlay {:?} does not match base image {:?}",
                overlay.dimensions(),
                base.dimensions()
            ),
        });
    }

    let strength = strength.clamp(0.0, 1.0);
    let mut out = base.clone();
    for (dst, Rgba(ov)) in out.pixels_mut().zip(overlay.pixels()) {
        let a = strength * ov[3] as f32 / 255.0;
        for c in 0..3 {
            let mixed = a * ov[c] as f32 + (1.0 - a) * dst[c] as f32;
            dst[c] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use ndarray::array;

    #[test]
    fn test_pack_layout_is_rgb_hwc_raw() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        img.put_pixel(1, 0, Rgb([40, 50, 60]));
        img.put_pixel(0, 1, Rgb([70, 80, 90]));
        img.put_pixel(1, 1, Rgb([100, 110, 120]));

        let packed = pack(&DynamicImage::ImageRgb8(img.clone()), 2).unwrap();
        assert_eq!(packed.tensor.shape(), &[1, 2, 2, 3]);
        assert_eq!(
            packed.tensor.as_slice().unwrap(),
            &[
                10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0
            ]
        );
        assert_eq!(packed.preview, img);
    }

    #[test]
    fn test_pack_resizes_to_side() {
        let img = RgbImage::from_pixel(640, 480, Rgb([200, 100, 50]));
        let packed = pack(&DynamicImage::ImageRgb8(img), 224).unwrap();
        assert_eq!(packed.preview.dimensions(), (224, 224));
        assert_eq!(packed.tensor.shape(), &[1, 224, 224, 3]);
        assert_eq!(packed.tensor[[0, 100, 100, 0]], 200.0);
        assert_eq!(packed.tensor[[0, 100, 100, 2]], 50.0);
    }

    #[test]
    fn test_pack_tensor_matches_preview() {
        let img = RgbImage::from_fn(37, 53, |x, y| Rgb([(x * 7) as u8, (y * 3) as u8, 90]));
        let packed = pack(&DynamicImage::ImageRgb8(img), 16).unwrap();
        for (x, y, px) in packed.preview.enumerate_pixels() {
            for c in 0..3 {
                assert_eq!(
                    packed.tensor[[0, y as usize, x as usize, c]],
                    px[c] as f32
                );
            }
        }
    }

    #[test]
    fn test_pack_rejects_zero_side() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(pack(&img, 0), Err(TriageError::InvalidInput { .. })));
    }

    #[test]
    fn test_normalize_spans_unit_range() {
        let grid = array![[2.0f32, 4.0], [6.0, 10.0]];
        let norm = normalize_saliency(grid.view());
        assert_eq!(norm, array![[0.0f32, 0.25], [0.5, 1.0]]);
    }

    #[test]
    fn test_normalize_flat_grid_is_mid_scale() {
        let grid = Array2::from_elem((8, 8), 3.7f32);
        let norm = normalize_saliency(grid.view());
        assert!(norm.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_normalize_ignores_non_finite() {
        let grid = array![[f32::NAN, 1.0], [3.0, f32::INFINITY]];
        let norm = normalize_saliency(grid.view());
        assert_eq!(norm, array![[0.0f32, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_constant_overlay_is_single_color() {
        let grid = Array2::from_elem((7, 7), 0.25f32);
        let overlay = to_overlay(grid.view(), 50, 30).unwrap();
        assert_eq!(overlay.dimensions(), (50, 30));
        let [r, g, b] = jet(0.5);
        assert!(overlay.pixels().all(|p| p.0 == [r, g, b, 255]));
    }

    #[test]
    fn test_overlay_hot_corner() {
        let mut grid = Array2::zeros((4, 4));
        grid[[0, 0]] = 1.0f32;
        let overlay = to_overlay(grid.view(), 4, 4).unwrap();
        let [r, g, b] = jet(1.0);
        assert_eq!(overlay.get_pixel(0, 0).0, [r, g, b, 255]);
        let [r, g, b] = jet(0.0);
        assert_eq!(overlay.get_pixel(3, 3).0, [r, g, b, 255]);
    }

    #[test]
    fn test_overlay_rejects_empty_grid() {
        let grid = Array2::<f32>::zeros((0, 4));
        assert!(to_overlay(grid.view(), 10, 10).is_err());
    }

    #[test]
    fn test_blend_overlay() {
        let base = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let overlay = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 0, 255]));
        let blended = blend_overlay(&base, &overlay, 0.5).unwrap();
        assert_eq!(blended.get_pixel(1, 1).0, [100, 50, 0]);

        let none = blend_overlay(&base, &overlay, 0.0).unwrap();
        assert_eq!(none, base);
    }

    #[test]
    fn test_blend_overlay_size_mismatch() {
        let base = RgbImage::new(2, 2);
        let overlay = RgbaImage::new(3, 2);
        assert!(blend_overlay(&base, &overlay, DEFAULT_OVERLAY_STRENGTH).is_err());
    }
}
