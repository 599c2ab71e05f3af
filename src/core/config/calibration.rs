//! Decision threshold calibration.
//!
//! The calibrated threshold ships as a small side-channel asset next to the
//! model, e.g. `{"tau": 0.0112}`. A missing or unreadable asset never stops the
//! engine: the configured default is used instead and a warning is logged.

use serde_json::Value;
use std::path::{Path, PathBuf};

/// Threshold used when no calibration asset can be read.
pub const DEFAULT_THRESHOLD: f32 = 0.0112;

/// Keys accepted in the calibration object, in lookup order.
pub const THRESHOLD_KEYS: [&str; 2] = ["tau", "threshold_tau"];

/// Where a threshold came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdSource {
    /// Read from the calibration asset at this path.
    Calibration(PathBuf),
    /// The configured default was used.
    Default,
}

/// A resolved decision threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// The threshold `tau` in `[0, 1]`.
    pub tau: f32,
    /// Where `tau` came from.
    pub source: ThresholdSource,
}

impl Calibration {
    /// A calibration that uses `tau` directly.
    pub fn fixed(tau: f32) -> Self {
        Self {
            tau,
            source: ThresholdSource::Default,
        }
    }
}

/// Extracts the threshold from the contents of a calibration asset.
///
/// Accepts a JSON object carrying one of [`THRESHOLD_KEYS`] (as a number or a
/// numeric string) or a bare number. Values outside `[0, 1]` are rejected.
pub fn parse_threshold(text: &str) -> Option<f32> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => THRESHOLD_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(value_as_f32)),
        Ok(other) => value_as_f32(&other),
        Err(_) => text.trim().parse::<f32>().ok(),
    }?;

    (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(value)
}

fn value_as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// Resolves the decision threshold, falling back to `default_tau`.
pub fn load_threshold(path: Option<&Path>, default_tau: f32) -> Calibration {
    let Some(path) = path else {
        tracing::info!(
            tau = default_tau,
            "no calibration asset configured, using default threshold"
        );
        return Calibration::fixed(default_tau);
    };

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                tau = default_tau,
                "calibration asset unreadable, using default threshold"
            );
            return Calibration::fixed(default_tau);
        }
    };

    match parse_threshold(&text) {
        Some(tau) => {
            tracing::info!(path = %path.display(), tau, "loaded calibrated threshold");
            Calibration {
                tau,
                source: ThresholdSource::Calibration(path.to_path_buf()),
            }
        }
        None => {
            tracing::warn!(
                path = %path.display(),
                tau = default_tau,
                "calibration asset has no usable threshold, using default"
            );
            Calibration::fixed(default_tau)
        }
    }
}
