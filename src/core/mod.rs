//! The core module of the triage pipeline.
//!
//! This module contains the fundamental components shared by the gate and the
//! engine:
//! - Configuration management and threshold calibration
//! - Error handling
//! - Inference backend integration
//!
//! It also re-exports the most commonly used types.

pub mod config;
pub mod errors;
pub mod inference;

pub use config::{
    Calibration, ConfigError, ConfigValidator, DEFAULT_INPUT_SIDE, DEFAULT_THRESHOLD,
    EngineConfig, GateConfig, OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig,
    ThresholdSource, TriageConfig, load_threshold,
};
pub use errors::{ProcessingStage, TriageError, TriageResult};
pub use inference::{ModelBackend, OrtBackend, OutputTensor};

/// Packed NHWC input tensor, `[batch, height, width, channels]`.
pub type Tensor4D = ndarray::Array4<f32>;
