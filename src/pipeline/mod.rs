//! The triage pipeline.
//!
//! [`TriagePipeline`] runs the quality gate and, only for accepted frames,
//! the lesion classifier. Rejected frames never reach the model.

use crate::core::TriageResult;
use crate::core::config::{ConfigValidator, TriageConfig};
use crate::predictors::{InferenceResult, ModelHandle};
use crate::processors::quality_gate::{GateResult, ImageQualityGate};
use crate::utils::load_image;
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Result of running one frame through the pipeline.
#[derive(Debug, Clone)]
pub enum TriageOutcome {
    /// The gate rejected the frame; no inference was run.
    Rejected(GateResult),
    /// The gate accepted the frame and the classifier scored it.
    Analyzed {
        /// Gate diagnostics for the accepted frame.
        gate: GateResult,
        /// Classifier output.
        inference: InferenceResult,
    },
}

impl TriageOutcome {
    /// Gate diagnostics, present for both variants.
    pub fn gate(&self) -> &GateResult {
        match self {
            Self::Rejected(gate) | Self::Analyzed { gate, .. } => gate,
        }
    }

    /// Classifier output, if inference ran.
    pub fn inference(&self) -> Option<&InferenceResult> {
        match self {
            Self::Rejected(_) => None,
            Self::Analyzed { inference, .. } => Some(inference),
        }
    }

    /// Serializable view without image payloads.
    pub fn report(&self) -> TriageReport {
        match self {
            Self::Rejected(gate) => TriageReport::Rejected { gate: gate.clone() },
            Self::Analyzed { gate, inference } => TriageReport::Analyzed {
                gate: gate.clone(),
                inference: InferenceSummary::from(inference),
            },
        }
    }
}

/// Image-free summary of an [`InferenceResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceSummary {
    /// Malignancy probability in `[0, 1]`.
    pub probability: f32,
    /// `probability >= threshold`.
    pub is_malignant: bool,
    /// Threshold the decision was made with.
    pub threshold: f32,
    /// Whether a saliency heatmap was produced.
    pub has_heatmap: bool,
}

impl From<&InferenceResult> for InferenceSummary {
    fn from(result: &InferenceResult) -> Self {
        Self {
            probability: result.probability,
            is_malignant: result.is_malignant,
            threshold: result.threshold,
            has_heatmap: result.heatmap.is_some(),
        }
    }
}

/// Serializable form of a [`TriageOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriageReport {
    /// Frame rejected by the gate.
    Rejected {
        /// Gate diagnostics, including the rejection reason.
        gate: GateResult,
    },
    /// Frame accepted and scored.
    Analyzed {
        /// Gate diagnostics for the accepted frame.
        gate: GateResult,
        /// Classifier summary without image payloads.
        inference: InferenceSummary,
    },
}

/// Gate-then-infer pipeline over a shared [`ModelHandle`].
#[derive(Debug, Clone)]
pub struct TriagePipeline {
    gate: ImageQualityGate,
    engine: Arc<ModelHandle>,
}

impl TriagePipeline {
    /// Creates a pipeline from a gate and a loaded handle.
    pub fn new(gate: ImageQualityGate, engine: Arc<ModelHandle>) -> Self {
        Self { gate, engine }
    }

    /// Validates `config` and loads the model it names.
    pub fn from_config(config: &TriageConfig) -> TriageResult<Self> {
        config.validate()?;
        let gate = ImageQualityGate::new(config.gate.clone())?;
        let engine = ModelHandle::from_config(&config.engine)?;
        Ok(Self::new(gate, Arc::new(engine)))
    }

    /// The quality gate in use.
    pub fn gate(&self) -> &ImageQualityGate {
        &self.gate
    }

    /// The shared model handle.
    pub fn engine(&self) -> &Arc<ModelHandle> {
        &self.engine
    }

    /// Runs one frame through the gate and, if accepted, the classifier.
    pub fn run(&self, image: &DynamicImage) -> TriageResult<TriageOutcome> {
        let gate = self.gate.evaluate(image)?;
        if !gate.accepted {
            tracing::debug!(reason = %gate.reason, "frame rejected by quality gate");
            return Ok(TriageOutcome::Rejected(gate));
        }

        let inference = self.engine.infer(image)?;
        Ok(TriageOutcome::Analyzed { gate, inference })
    }

    /// Loads the image at `path` and runs it.
    pub fn run_path(&self, path: impl AsRef<Path>) -> TriageResult<TriageOutcome> {
        let image = load_image(path)?;
        self.run(&image)
    }
}
