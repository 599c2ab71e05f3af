//! Quality gate configuration.

use super::errors::{ConfigError, ConfigValidator, ensure_positive, ensure_range};
use serde::{Deserialize, Serialize};

/// Thresholds for the pre-inference image quality gate.
///
/// Brightness values are HSV value in `[0, 1]`; the blur threshold is a
/// standard deviation of BT.601 luminance in 0–255 units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Longest side of the downscaled working copy.
    pub max_side: u32,
    /// Grid stride in pixels, applied on both axes.
    pub sample_step: u32,
    /// Radius of the evaluated central disk as a fraction of `min(width, height)`.
    pub center_radius_factor: f32,
    /// Minimum number of retained samples before any perceptual gate runs.
    pub min_samples: u32,
    /// Mean HSV value below which a frame is too dark.
    pub min_brightness: f32,
    /// Mean HSV value above which a frame is too bright.
    pub max_brightness: f32,
    /// Luminance standard deviation below which a frame is too blurry.
    pub blur_std_dev_threshold: f32,
    /// Fraction of samples that must look like skin.
    pub skin_coverage_threshold: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_side: 256,
            sample_step: 4,
            center_radius_factor: 0.45,
            min_samples: 200,
            min_brightness: 0.20,
            max_brightness: 0.95,
            blur_std_dev_threshold: 10.0,
            skin_coverage_threshold: 0.25,
        }
    }
}

impl ConfigValidator for GateConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("max_side", self.max_side)?;
        ensure_positive("sample_step", self.sample_step)?;
        if !(self.center_radius_factor > 0.0 && self.center_radius_factor <= 1.0) {
            return Err(ConfigError::invalid(
                "center_radius_factor",
                format!(
                    "expected a value in (0, 1], got {}",
                    self.center_radius_factor
                ),
            ));
        }
        ensure_range("min_brightness", self.min_brightness, 0.0, 1.0)?;
        ensure_range("max_brightness", self.max_brightness, 0.0, 1.0)?;
        if self.min_brightness >= self.max_brightness {
            return Err(ConfigError::invalid(
                "min_brightness",
                format!(
                    "must be below max_brightness ({} >= {})",
                    self.min_brightness, self.max_brightness
                ),
            ));
        }
        ensure_range(
            "blur_std_dev_threshold",
            self.blur_std_dev_threshold,
            0.0,
            f32::MAX,
        )?;
        ensure_range(
            "skin_coverage_threshold",
            self.skin_coverage_threshold,
            0.0,
            1.0,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn test_brightness_bounds_must_be_ordered() {
        let config = GateConfig {
            min_brightness: 0.6,
            max_brightness: 0.6,
            ..GateConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "min_brightness",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_radius_rejected() {
        let config = GateConfig {
            center_radius_factor: 0.0,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GateConfig = serde_json::from_str(r#"{ "sample_step": 2 }"#).unwrap();
        assert_eq!(config.sample_step, 2);
        assert_eq!(config.max_side, GateConfig::default().max_side);
    }
}
