//! Lesion Inference Engine
//!
//! This module provides the public handle for scoring a frame with the lesion
//! classifier: loading the model and its calibrated threshold, running
//! inference, and closing the handle.

use crate::core::config::{
    Calibration, DEFAULT_INPUT_SIDE, DEFAULT_THRESHOLD, EngineConfig, OrtSessionConfig,
    ThresholdSource, load_threshold,
};
use crate::core::inference::{ModelBackend, OrtBackend};
use crate::core::{TriageError, TriageResult};
use crate::models::LesionClassifier;
use image::{DynamicImage, RgbImage, RgbaImage};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Returns true when `probability` meets the decision threshold.
///
/// The comparison is inclusive: `probability == tau` is malignant.
pub fn classify(probability: f32, tau: f32) -> bool {
    probability >= tau
}

/// Lesion inference result
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Malignancy probability in `[0, 1]`.
    pub probability: f32,
    /// `probability >= threshold`.
    pub is_malignant: bool,
    /// Threshold the decision was made with.
    pub threshold: f32,
    /// Saliency overlay aligned with `preview`, if the model produces one.
    pub heatmap: Option<RgbaImage>,
    /// The resized image the model scored.
    pub preview: RgbImage,
}

/// A loaded lesion classifier plus its decision threshold.
///
/// The handle is `Sync`; calls to [`infer`](Self::infer) are serialized
/// internally because the execution context is not reentrant. After
/// [`close`](Self::close) every `infer` call fails with
/// [`TriageError::EngineClosed`].
pub struct ModelHandle {
    model_name: String,
    calibration: Calibration,
    input_side: u32,
    output_count: usize,
    classifier: Mutex<Option<LesionClassifier>>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model_name", &self.model_name)
            .field("calibration", &self.calibration)
            .field("input_side", &self.input_side)
            .field("output_count", &self.output_count)
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    /// Create a new builder for the model handle
    pub fn builder() -> ModelHandleBuilder {
        ModelHandleBuilder::new()
    }

    /// Loads `model` and reads the threshold from `calibration`.
    ///
    /// The model must declare a `[1, side, side, 3]` input. A missing or
    /// unreadable calibration asset falls back to [`DEFAULT_THRESHOLD`].
    pub fn load(
        model: impl AsRef<Path>,
        calibration: Option<&Path>,
        input_side: u32,
    ) -> TriageResult<Self> {
        let mut builder = Self::builder().input_side(input_side);
        if let Some(path) = calibration {
            builder = builder.calibration_path(path);
        }
        builder.build(model)
    }

    /// Loads the handle described by an [`EngineConfig`].
    pub fn from_config(config: &EngineConfig) -> TriageResult<Self> {
        let mut builder = Self::builder()
            .input_side(config.input_side)
            .default_threshold(config.default_threshold)
            .ort_session(config.session.clone());
        if let Some(path) = &config.calibration_path {
            builder = builder.calibration_path(path);
        }
        builder.build(&config.model_path)
    }

    /// Wraps an already constructed backend.
    ///
    /// Validates the backend's input shape against `input_side` and requires
    /// at least one output.
    pub fn from_backend(
        backend: Box<dyn ModelBackend>,
        calibration: Calibration,
        input_side: u32,
    ) -> TriageResult<Self> {
        let classifier = LesionClassifier::new(backend, input_side)?;
        let model_name = classifier.name().to_string();
        let output_count = classifier.output_count();

        tracing::info!(
            model = %model_name,
            input_side,
            outputs = output_count,
            tau = calibration.tau,
            "lesion classifier loaded"
        );

        Ok(Self {
            model_name,
            calibration,
            input_side,
            output_count,
            classifier: Mutex::new(Some(classifier)),
        })
    }

    /// Scores one frame.
    ///
    /// # Errors
    ///
    /// [`TriageError::EngineClosed`] after [`close`](Self::close); execution
    /// failures from the backend. Unrecognized output layouts are not errors:
    /// they degrade the probability to 0 and the heatmap to `None`.
    pub fn infer(&self, image: &DynamicImage) -> TriageResult<InferenceResult> {
        let mut guard = self.lock();
        let classifier = guard.as_mut().ok_or_else(|| TriageError::EngineClosed {
            model_name: self.model_name.clone(),
        })?;

        let output = classifier.forward(image)?;
        let tau = self.calibration.tau;
        let is_malignant = classify(output.probability, tau);

        tracing::debug!(
            model = %self.model_name,
            probability = output.probability,
            tau,
            is_malignant,
            "inference complete"
        );

        Ok(InferenceResult {
            probability: output.probability,
            is_malignant,
            threshold: tau,
            heatmap: output.heatmap,
            preview: output.preview,
        })
    }

    /// Releases the execution context and the mapped model.
    ///
    /// Idempotent; the handle cannot be reopened.
    pub fn close(&self) {
        let released = self.lock().take();
        if released.is_some() {
            tracing::info!(model = %self.model_name, "lesion classifier closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Decision threshold in use.
    pub fn threshold(&self) -> f32 {
        self.calibration.tau
    }

    /// Where the threshold came from.
    pub fn threshold_source(&self) -> &ThresholdSource {
        &self.calibration.source
    }

    /// Side length of the model input.
    pub fn input_side(&self) -> u32 {
        self.input_side
    }

    /// Number of outputs the model declares.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Name of the loaded model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    // A panic inside a run leaves nothing half-written in the slot itself.
    fn lock(&self) -> MutexGuard<'_, Option<LesionClassifier>> {
        self.classifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`ModelHandle`]
#[derive(Debug, Clone)]
pub struct ModelHandleBuilder {
    input_side: u32,
    calibration_path: Option<PathBuf>,
    default_threshold: f32,
    ort_config: Option<OrtSessionConfig>,
}

impl ModelHandleBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            input_side: DEFAULT_INPUT_SIDE,
            calibration_path: None,
            default_threshold: DEFAULT_THRESHOLD,
            ort_config: None,
        }
    }

    /// Set the expected model input side
    pub fn input_side(mut self, side: u32) -> Self {
        self.input_side = side;
        self
    }

    /// Set the calibration asset to read the threshold from
    pub fn calibration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration_path = Some(path.into());
        self
    }

    /// Set the threshold used when calibration is missing or unusable
    pub fn default_threshold(mut self, tau: f32) -> Self {
        self.default_threshold = tau;
        self
    }

    /// Set the ONNX Runtime session configuration
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    /// Build the handle for the model at `model_path`
    pub fn build(self, model_path: impl AsRef<Path>) -> TriageResult<ModelHandle> {
        let calibration = self.calibration()?;
        let backend = OrtBackend::from_file(model_path.as_ref(), self.ort_config.as_ref())?;
        ModelHandle::from_backend(Box::new(backend), calibration, self.input_side)
    }

    /// Build the handle around a custom backend
    pub fn build_with_backend(self, backend: Box<dyn ModelBackend>) -> TriageResult<ModelHandle> {
        let calibration = self.calibration()?;
        ModelHandle::from_backend(backend, calibration, self.input_side)
    }

    fn calibration(&self) -> TriageResult<Calibration> {
        if !self.default_threshold.is_finite() || !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(TriageError::invalid_field(
                "default_threshold",
                "a value in [0, 1]",
                self.default_threshold.to_string(),
            ));
        }
        Ok(load_threshold(
            self.calibration_path.as_deref(),
            self.default_threshold,
        ))
    }
}

impl Default for ModelHandleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide lazily loaded [`ModelHandle`].
///
/// The first successful load wins; every later call returns the same `Arc`.
/// A failed load leaves the slot empty so a later call can retry.
#[derive(Debug, Default)]
pub struct SharedEngine {
    cell: OnceCell<Arc<ModelHandle>>,
}

impl SharedEngine {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the shared handle, loading it from `config` on first use.
    pub fn get_or_load(&self, config: &EngineConfig) -> TriageResult<Arc<ModelHandle>> {
        self.get_or_init_with(|| ModelHandle::from_config(config))
    }

    /// Returns the shared handle, constructing it with `init` on first use.
    pub fn get_or_init_with<F>(&self, init: F) -> TriageResult<Arc<ModelHandle>>
    where
        F: FnOnce() -> TriageResult<ModelHandle>,
    {
        self.cell.get_or_try_init(|| init().map(Arc::new)).cloned()
    }

    /// The handle, if one has been loaded.
    pub fn get(&self) -> Option<Arc<ModelHandle>> {
        self.cell.get().cloned()
    }
}
