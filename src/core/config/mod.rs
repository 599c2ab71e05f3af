//! Configuration management for the triage pipeline.
//!
//! This module provides configuration types, the validation trait, and the
//! calibration loader for the decision threshold.

pub mod calibration;
pub mod engine;
pub mod errors;
pub mod gate;
pub mod onnx;

pub use calibration::{
    Calibration, DEFAULT_THRESHOLD, THRESHOLD_KEYS, ThresholdSource, load_threshold,
    parse_threshold,
};
pub use engine::{DEFAULT_INPUT_SIDE, EngineConfig, TriageConfig, read_json_file};
pub use errors::{ConfigError, ConfigValidator};
pub use gate::GateConfig;
pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
