//! Core error types for the triage pipeline.
//!
//! This module defines the `TriageError` enum shared by the quality gate, the
//! tensor codec and the inference engine, together with the `ProcessingStage`
//! enum used to tag processing failures.
//!
//! Gate rejections are deliberately absent here: a rejected frame is a
//! [`GateResult`](crate::processors::GateResult), not an error.

use thiserror::Error;

/// Enum representing different stages of processing in the triage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred while packing the input tensor.
    TensorPacking,
    /// Error occurred while decoding model outputs.
    OutputDecoding,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorPacking => write!(f, "tensor packing"),
            ProcessingStage::OutputDecoding => write!(f, "output decoding"),
        }
    }
}

/// Errors that can occur in the triage core.
///
/// Load failures and calls against a closed handle are fatal to the call that
/// produced them; everything recoverable (missing calibration, unrecognized
/// output layouts) is degraded in place and never reaches this type.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Error occurred while decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// The model asset could not be loaded or does not match the expected input.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path (or name) of the model that failed to load.
        model_path: String,
        /// Short reason string.
        reason: String,
        /// Optional suggestion (prefixed with '; ' when present).
        suggestion: String,
        /// Underlying source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// `infer` was called on a handle that has been closed.
    #[error("inference engine for '{model_name}' has been closed")]
    EngineClosed {
        /// The model the closed handle was serving.
        model_name: String,
    },

    /// Error occurred while executing the model.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        /// The name of the model where inference failed.
        model_name: String,
        /// Additional context about the inference error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),
}

impl From<image::ImageError> for TriageError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for TriageError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl TriageError {
    /// Creates a model load error with an optional suggestion for recovery.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use lesion_triage::core::TriageError;
    /// let err = TriageError::model_load(
    ///     "models/lesion.onnx",
    ///     "input shape [1, 256, 256, 3] does not match expected side 224",
    ///     Some("re-export the model at 224x224"),
    ///     None,
    /// );
    /// assert!(matches!(err, TriageError::ModelLoad { .. }));
    /// assert!(err.to_string().contains("; re-export"));
    /// ```
    pub fn model_load(
        model_path: impl Into<String>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ModelLoad {
            model_path: model_path.into(),
            reason: reason.into(),
            suggestion: suggestion.map(|s| format!("; {s}")).unwrap_or_default(),
            source,
        }
    }

    /// Creates an inference error wrapping an execution failure.
    pub fn inference_error(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a processing error for the given stage.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a configuration error for invalid field values.
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }

    /// Returns true for errors the surrounding system should surface as
    /// "analysis unavailable" rather than as a problem with the frame.
    pub fn is_fatal_engine_error(&self) -> bool {
        matches!(
            self,
            Self::ModelLoad { .. }
                | Self::EngineClosed { .. }
                | Self::Inference { .. }
                | Self::Session(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_load_without_suggestion() {
        let err = TriageError::model_load("m.onnx", "file not found", None, None);
        assert_eq!(
            err.to_string(),
            "model load failed for 'm.onnx': file not found"
        );
    }

    #[test]
    fn test_fatal_classification() {
        let closed = TriageError::EngineClosed {
            model_name: "lesion".to_string(),
        };
        assert!(closed.is_fatal_engine_error());

        let input = TriageError::InvalidInput {
            message: "zero-sized image".to_string(),
        };
        assert!(!input.is_fatal_engine_error());
    }

    #[test]
    fn test_invalid_field_message() {
        let err = TriageError::invalid_field("sample_step", "> 0", "0");
        assert!(matches!(err, TriageError::ConfigError { .. }));
        assert!(err.to_string().contains("sample_step"));
    }
}
