//! Inference engine configuration and the top-level config file.

use super::calibration::DEFAULT_THRESHOLD;
use super::errors::{ConfigError, ConfigValidator, ensure_positive, ensure_range};
use super::gate::GateConfig;
use super::onnx::OrtSessionConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Side length of the square RGB input the lesion classifier is exported at.
pub const DEFAULT_INPUT_SIDE: u32 = 224;

/// Settings for loading the lesion classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the ONNX model.
    pub model_path: PathBuf,
    /// Optional calibration asset carrying the decision threshold.
    #[serde(default)]
    pub calibration_path: Option<PathBuf>,
    /// Expected input side; the model must declare `[1, side, side, 3]`.
    #[serde(default = "EngineConfig::default_input_side")]
    pub input_side: u32,
    /// Threshold used when the calibration asset is missing or unusable.
    #[serde(default = "EngineConfig::default_threshold")]
    pub default_threshold: f32,
    /// ONNX Runtime session settings.
    #[serde(default)]
    pub session: OrtSessionConfig,
}

impl EngineConfig {
    /// Creates a config for `model_path` with every other field defaulted.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            calibration_path: None,
            input_side: DEFAULT_INPUT_SIDE,
            default_threshold: DEFAULT_THRESHOLD,
            session: OrtSessionConfig::default(),
        }
    }

    fn default_input_side() -> u32 {
        DEFAULT_INPUT_SIDE
    }

    fn default_threshold() -> f32 {
        DEFAULT_THRESHOLD
    }
}

impl ConfigValidator for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("input_side", self.input_side)?;
        ensure_range("default_threshold", self.default_threshold, 0.0, 1.0)?;
        Ok(())
    }
}

/// Complete configuration for the triage pipeline, as read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Quality gate thresholds.
    #[serde(default)]
    pub gate: GateConfig,
    /// Model and calibration settings.
    pub engine: EngineConfig,
}

impl TriageConfig {
    /// Reads and validates a config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = read_json_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Reads and deserializes a JSON config file without validating it.
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

impl ConfigValidator for TriageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.gate.validate()?;
        self.engine.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_engine_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "model_path": "models/lesion.onnx" }"#).unwrap();
        assert_eq!(config, EngineConfig::new("models/lesion.onnx"));
        assert_eq!(config.input_side, 224);
        assert_eq!(config.default_threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_triage_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "gate": {{ "min_samples": 50 }},
                "engine": {{
                    "model_path": "lesion.onnx",
                    "calibration_path": "threshold.json",
                    "input_side": 192
                }}
            }}"#
        )
        .unwrap();

        let config = TriageConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.gate.min_samples, 50);
        assert_eq!(config.gate.sample_step, GateConfig::default().sample_step);
        assert_eq!(config.engine.input_side, 192);
        assert_eq!(
            config.engine.calibration_path.as_deref(),
            Some(Path::new("threshold.json"))
        );
    }

    #[test]
    fn test_triage_config_rejects_invalid_gate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "gate": {{ "min_brightness": 0.9, "max_brightness": 0.1 }},
                "engine": {{ "model_path": "lesion.onnx" }}
            }}"#
        )
        .unwrap();

        assert!(matches!(
            TriageConfig::from_json_file(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_triage_config_missing_file() {
        assert!(matches!(
            TriageConfig::from_json_file("/no/such/config.json"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_read_json_file_errors() {
        let missing = read_json_file::<GateConfig>("/nonexistent/triage.json").unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let garbled = read_json_file::<GateConfig>(file.path()).unwrap_err();
        assert!(matches!(garbled, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_read_json_file_skips_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "sample_step": 0 }}"#).unwrap();
        let config: GateConfig = read_json_file(file.path()).unwrap();
        assert_eq!(config.sample_step, 0);
        assert!(config.validate().is_err());
    }
}
