//! Pre-inference image quality gate.
//!
//! The gate decides whether a captured frame is eligible for analysis. It
//! samples a grid over the central disk of a downscaled copy, accumulates
//! brightness, luminance variance and a dual-space skin classification, and
//! applies its checks in a fixed order:
//!
//! 1. enough usable center samples
//! 2. not too dark
//! 3. not too bright
//! 4. not blurry (luminance standard deviation)
//! 5. enough skin coverage
//!
//! The first failing check determines the verdict. Rejections are values,
//! never errors.

use super::color::{rgb_to_hsv, rgb_to_ycbcr};
use crate::core::config::{ConfigValidator, GateConfig};
use crate::core::{TriageError, TriageResult};
use crate::utils::image::downscale_to_max_side;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;

/// Samples with alpha below this value are treated as transparent and skipped.
pub const ALPHA_FLOOR: u8 = 10;

/// Why a frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRejection {
    /// Too few usable samples inside the central disk.
    InsufficientSamples,
    /// Mean brightness below the configured minimum.
    TooDark,
    /// Mean brightness above the configured maximum.
    TooBright,
    /// Luminance variation too low to carry detail.
    TooBlurry,
    /// Too few samples look like skin.
    InsufficientSkin,
}

impl GateRejection {
    /// User-facing guidance text for this rejection.
    pub fn reason(&self) -> &'static str {
        match self {
            GateRejection::InsufficientSamples => "insufficient center samples",
            GateRejection::TooDark => "image too dark",
            GateRejection::TooBright => "image too bright",
            GateRejection::TooBlurry => "image too blurry",
            GateRejection::InsufficientSkin => "insufficient skin coverage",
        }
    }
}

impl std::fmt::Display for GateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Verdict and diagnostics of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    /// Whether the frame may be passed to inference.
    pub accepted: bool,
    /// Human-readable reason; empty iff accepted.
    pub reason: String,
    /// Typed form of `reason`.
    pub rejection: Option<GateRejection>,
    /// Fraction of retained samples classified as skin.
    pub skin_coverage: f32,
    /// Mean HSV value of retained samples.
    pub avg_brightness: f32,
    /// Standard deviation of BT.601 luminance (0–255 scale).
    pub luminance_std_dev: f32,
    /// Number of retained samples.
    pub samples_used: u32,
}

impl GateResult {
    fn accepted(stats: &SampleStats) -> Self {
        Self {
            accepted: true,
            reason: String::new(),
            rejection: None,
            skin_coverage: stats.skin_coverage(),
            avg_brightness: stats.avg_brightness(),
            luminance_std_dev: stats.luminance_std_dev(),
            samples_used: stats.count,
        }
    }

    fn rejected(rejection: GateRejection, stats: &SampleStats) -> Self {
        Self {
            accepted: false,
            reason: rejection.reason().to_string(),
            rejection: Some(rejection),
            ..Self::accepted(stats)
        }
    }
}

/// Running accumulators over retained samples.
///
/// Luminance variance uses Welford's update so that a constant image yields a
/// standard deviation of exactly zero.
#[derive(Debug, Default)]
struct SampleStats {
    count: u32,
    skin: u32,
    sum_value: f64,
    luma_mean: f64,
    luma_m2: f64,
}

impl SampleStats {
    fn push(&mut self, value: f32, luma: f32, is_skin: bool) {
        self.count += 1;
        if is_skin {
            self.skin += 1;
        }
        self.sum_value += value as f64;

        let luma = luma as f64;
        let delta = luma - self.luma_mean;
        self.luma_mean += delta / self.count as f64;
        self.luma_m2 += delta * (luma - self.luma_mean);
    }

    fn skin_coverage(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.skin as f64 / self.count as f64) as f32
    }

    fn avg_brightness(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_value / self.count as f64) as f32
    }

    fn luminance_std_dev(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.luma_m2 / self.count as f64).max(0.0).sqrt() as f32
    }
}

/// Dual-space skin test: both the HSV and the YCbCr windows must hold.
pub fn is_skin_pixel(r: u8, g: u8, b: u8) -> bool {
    let hsv = rgb_to_hsv(r, g, b);
    let hue_ok = (0.0..=50.0).contains(&hsv.h) || (330.0..=360.0).contains(&hsv.h);
    let hsv_ok = hue_ok && (0.15..=0.68).contains(&hsv.s) && hsv.v > 0.25;
    if !hsv_ok {
        return false;
    }

    let ycc = rgb_to_ycbcr(r, g, b);
    (20.0..=235.0).contains(&ycc.y)
        && (85.0..=135.0).contains(&ycc.cb)
        && (135.0..=180.0).contains(&ycc.cr)
}

/// Image quality gate with a validated configuration.
#[derive(Debug, Clone)]
pub struct ImageQualityGate {
    config: GateConfig,
}

impl Default for ImageQualityGate {
    fn default() -> Self {
        Self {
            config: GateConfig::default(),
        }
    }
}

impl ImageQualityGate {
    /// Creates a gate, validating the configuration.
    pub fn new(config: GateConfig) -> TriageResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the gate configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Evaluates a frame.
    ///
    /// The input is never modified; all work happens on a downscaled copy.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] for an image with a zero dimension.
    /// Every other outcome, including rejection, is an `Ok(GateResult)`.
    pub fn evaluate(&self, image: &DynamicImage) -> TriageResult<GateResult> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TriageError::InvalidInput {
                message: format!("cannot evaluate a {width}x{height} image"),
            });
        }

        let cfg = &self.config;
        let working = downscale_to_max_side(image, cfg.max_side);
        let stats = self.sample(&working);

        if stats.count < cfg.min_samples {
            tracing::debug!(
                samples = stats.count,
                min_samples = cfg.min_samples,
                "gate rejected frame: insufficient center samples"
            );
            return Ok(GateResult {
                accepted: false,
                reason: GateRejection::InsufficientSamples.reason().to_string(),
                rejection: Some(GateRejection::InsufficientSamples),
                skin_coverage: 0.0,
                avg_brightness: 0.0,
                luminance_std_dev: 0.0,
                samples_used: stats.count,
            });
        }

        let avg_brightness = stats.avg_brightness();
        let std_dev = stats.luminance_std_dev();
        let coverage = stats.skin_coverage();

        let rejection = if avg_brightness < cfg.min_brightness {
            Some(GateRejection::TooDark)
        } else if avg_brightness > cfg.max_brightness {
            Some(GateRejection::TooBright)
        } else if std_dev < cfg.blur_std_dev_threshold {
            Some(GateRejection::TooBlurry)
        } else if coverage < cfg.skin_coverage_threshold {
            Some(GateRejection::InsufficientSkin)
        } else {
            None
        };

        tracing::debug!(
            samples = stats.count,
            avg_brightness,
            luminance_std_dev = std_dev,
            skin_coverage = coverage,
            rejection = ?rejection,
            "gate evaluated frame"
        );

        Ok(match rejection {
            Some(rejection) => GateResult::rejected(rejection, &stats),
            None => GateResult::accepted(&stats),
        })
    }

    /// Walks the sampling grid over the central disk of `working`.
    fn sample(&self, working: &image::RgbaImage) -> SampleStats {
        let (width, height) = working.dimensions();
        let step = self.config.sample_step as usize;
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let radius = self.config.center_radius_factor * width.min(height) as f32;
        let radius_sq = radius * radius;

        let raw = working.as_raw();
        let row_stride = width as usize * 4;
        let mut stats = SampleStats::default();

        for y in (0..height as usize).step_by(step) {
            let dy = y as f32 - cy;
            let row = &raw[y * row_stride..(y + 1) * row_stride];
            for x in (0..width as usize).step_by(step) {
                let dx = x as f32 - cx;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let px = &row[x * 4..x * 4 + 4];
                if px[3] < ALPHA_FLOOR {
                    continue;
                }
                let (r, g, b) = (px[0], px[1], px[2]);
                let value = rgb_to_hsv(r, g, b).v;
                let luma = super::color::luminance(r as f32, g as f32, b as f32);
                stats.push(value, luma, is_skin_pixel(r, g, b));
            }
        }

        stats
    }
}

/// Evaluates `image` with `config`; shorthand for building a gate once.
pub fn evaluate(image: &DynamicImage, config: &GateConfig) -> TriageResult<GateResult> {
    ImageQualityGate::new(config.clone())?.evaluate(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const LIGHT_SKIN: [u8; 3] = [224, 172, 140];
    const DARK_SKIN: [u8; 3] = [180, 120, 95];

    fn checkerboard(size: u32, block: u32, a: [u8; 3], b: [u8; 3]) -> DynamicImage {
        let img = RgbaImage::from_fn(size, size, |x, y| {
            let c = if ((x / block) + (y / block)) % 2 == 0 { a } else { b };
            Rgba([c[0], c[1], c[2], 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn uniform(size: u32, c: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([c[0], c[1], c[2], 255])))
    }

    #[test]
    fn test_skin_pixel_heuristic() {
        assert!(is_skin_pixel(LIGHT_SKIN[0], LIGHT_SKIN[1], LIGHT_SKIN[2]));
        assert!(is_skin_pixel(DARK_SKIN[0], DARK_SKIN[1], DARK_SKIN[2]));
        // gray: no saturation
        assert!(!is_skin_pixel(128, 128, 128));
        // saturated orange passes hue but fails saturation
        assert!(!is_skin_pixel(255, 140, 0));
        // blue
        assert!(!is_skin_pixel(40, 60, 200));
    }

    #[test]
    fn test_accepts_textured_skin() {
        let image = checkerboard(256, 16, LIGHT_SKIN, DARK_SKIN);
        let result = ImageQualityGate::default().evaluate(&image).unwrap();
        assert!(result.accepted, "{result:?}");
        assert!(result.reason.is_empty());
        assert_eq!(result.rejection, None);
        assert!(result.skin_coverage > 0.99);
        assert!(result.luminance_std_dev > 10.0);
    }

    #[test]
    fn test_uniform_gray_is_blurry() {
        let result = ImageQualityGate::default()
            .evaluate(&uniform(256, [128, 128, 128]))
            .unwrap();
        assert!(!result.accepted);
        assert_eq!(result.rejection, Some(GateRejection::TooBlurry));
        assert_eq!(result.luminance_std_dev, 0.0);
        assert_eq!(result.reason, "image too blurry");
    }

    #[test]
    fn test_black_frame_is_too_dark() {
        let result = ImageQualityGate::default()
            .evaluate(&uniform(256, [0, 0, 0]))
            .unwrap();
        assert_eq!(result.rejection, Some(GateRejection::TooDark));
    }

    #[test]
    fn test_white_frame_is_too_bright() {
        let result = ImageQualityGate::default()
            .evaluate(&uniform(256, [255, 255, 255]))
            .unwrap();
        assert_eq!(result.rejection, Some(GateRejection::TooBright));
    }

    #[test]
    fn test_textured_non_skin_rejected_for_coverage() {
        let image = checkerboard(256, 16, [40, 60, 200], [20, 180, 60]);
        let result = ImageQualityGate::default().evaluate(&image).unwrap();
        assert_eq!(result.rejection, Some(GateRejection::InsufficientSkin));
        assert_eq!(result.skin_coverage, 0.0);
    }

    #[test]
    fn test_transparent_frame_has_no_samples() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            256,
            256,
            Rgba([224, 172, 140, 0]),
        ));
        let result = ImageQualityGate::default().evaluate(&image).unwrap();
        assert_eq!(result.rejection, Some(GateRejection::InsufficientSamples));
        assert_eq!(result.samples_used, 0);
    }

    #[test]
    fn test_zero_dimension_is_an_error() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(0, 10));
        assert!(matches!(
            ImageQualityGate::default().evaluate(&image),
            Err(TriageError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GateConfig {
            sample_step: 0,
            ..GateConfig::default()
        };
        assert!(matches!(
            ImageQualityGate::new(config),
            Err(TriageError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_large_frame_is_downscaled() {
        // 1024 px source is sampled on the 256 px working copy
        let image = checkerboard(1024, 64, LIGHT_SKIN, DARK_SKIN);
        let small = checkerboard(256, 16, LIGHT_SKIN, DARK_SKIN);
        let gate = ImageQualityGate::default();
        let large_result = gate.evaluate(&image).unwrap();
        let small_result = gate.evaluate(&small).unwrap();
        assert_eq!(large_result.samples_used, small_result.samples_used);
        assert!(large_result.accepted);
    }
}
