//! Lesion classifier model.
//!
//! This module wraps a [`ModelBackend`] with the classifier's pre- and
//! post-processing:
//! - Preprocessing: packing the frame into the fixed-size NHWC tensor
//! - Inference: one backend run
//! - Postprocessing: deciding which output is the probability and which is the
//!   saliency map, reading the scalar, and rendering the heatmap
//!
//! Exported models disagree on output order and layout, so outputs are
//! identified by size rather than index. Anything unrecognized degrades the
//! affected field (probability to 0, heatmap to `None`) instead of failing.

use crate::core::inference::{ModelBackend, OutputTensor};
use crate::core::{ProcessingStage, TriageError, TriageResult};
use crate::processors::tensor_codec::{pack, to_overlay};
use image::{DynamicImage, RgbImage, RgbaImage};
use ndarray::Array2;
use std::time::Instant;

/// Which output index holds which quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// A single probability output.
    ProbabilityOnly {
        /// Index of the probability output.
        probability: usize,
    },
    /// A probability output plus a saliency grid.
    WithSaliency {
        /// Index of the probability output.
        probability: usize,
        /// Index of the saliency output.
        saliency: usize,
    },
    /// Outputs that cannot be told apart (none, or equal sizes).
    Unrecognized,
}

/// Decides the output layout from per-output element counts.
///
/// With two or more outputs, the first two are compared: the strictly smaller
/// one is the probability and the larger one is the saliency grid.
pub fn resolve_output_layout(element_counts: &[usize]) -> OutputLayout {
    match element_counts {
        [] => OutputLayout::Unrecognized,
        [_] => OutputLayout::ProbabilityOnly { probability: 0 },
        [first, second, ..] if first < second => OutputLayout::WithSaliency {
            probability: 0,
            saliency: 1,
        },
        [first, second, ..] if second < first => OutputLayout::WithSaliency {
            probability: 1,
            saliency: 0,
        },
        _ => OutputLayout::Unrecognized,
    }
}

/// Reads the probability scalar from a `[]`, `[1]` or `[1, 1]` output.
///
/// Returns `None` for any other layout or a non-finite value. Finite values
/// are clamped to `[0, 1]`.
pub fn read_probability(output: &OutputTensor) -> Option<f32> {
    let recognized = match output.shape.as_slice() {
        [1] | [1, 1] => true,
        [] => output.data.len() == 1,
        // dynamic batch dimension
        [d] | [d, 1] | [1, d] if *d < 0 => output.data.len() == 1,
        _ => false,
    };
    if !recognized {
        return None;
    }
    output
        .data
        .first()
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

/// Saliency grid dimensions derived from an output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaliencyDims {
    /// Grid height.
    pub height: usize,
    /// Grid width.
    pub width: usize,
    /// False when the shape was unrecognized and the fallback side was used.
    pub from_shape: bool,
}

/// Derives the saliency grid size from `[1, H, W, 1]`, `[H, W, 1]` or `[H, W]`,
/// falling back to `fallback_side` x `fallback_side`.
pub fn saliency_dims(shape: &[i64], fallback_side: u32) -> SaliencyDims {
    let dims = match shape {
        [1, h, w, 1] | [h, w, 1] | [h, w] => Some((*h, *w)),
        _ => None,
    };
    match dims {
        Some((h, w)) if h > 0 && w > 0 => SaliencyDims {
            height: h as usize,
            width: w as usize,
            from_shape: true,
        },
        _ => SaliencyDims {
            height: fallback_side as usize,
            width: fallback_side as usize,
            from_shape: false,
        },
    }
}

/// Reshapes a saliency output into a grid.
///
/// # Errors
///
/// Returns a [`ProcessingStage::OutputDecoding`] error when the data length
/// does not match the derived grid size.
pub fn decode_saliency(output: &OutputTensor, fallback_side: u32) -> TriageResult<Array2<f32>> {
    let dims = saliency_dims(&output.shape, fallback_side);
    if !dims.from_shape {
        tracing::warn!(
            shape = ?output.shape,
            fallback_side,
            "unrecognized saliency shape, assuming input resolution"
        );
    }
    Array2::from_shape_vec((dims.height, dims.width), output.data.clone()).map_err(|e| {
        TriageError::processing(
            ProcessingStage::OutputDecoding,
            format!(
                "saliency output {:?} with {} values does not fit a {}x{} grid",
                output.shape,
                output.data.len(),
                dims.height,
                dims.width
            ),
            e,
        )
    })
}

/// Decoded result of one classifier forward pass.
#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    /// Malignancy probability in `[0, 1]`.
    pub probability: f32,
    /// False-color saliency overlay sized like `preview`, if the model has one.
    pub heatmap: Option<RgbaImage>,
    /// The resized image the model actually scored.
    pub preview: RgbImage,
    /// How the outputs were interpreted.
    pub layout: OutputLayout,
}

/// The lesion classifier: a backend plus its fixed input resolution.
pub struct LesionClassifier {
    backend: Box<dyn ModelBackend>,
    input_side: u32,
}

impl std::fmt::Debug for LesionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LesionClassifier")
            .field("backend", &self.backend.name())
            .field("input_side", &self.input_side)
            .finish()
    }
}

impl LesionClassifier {
    /// Wraps `backend`, checking that it accepts `[1, side, side, 3]` and
    /// produces at least one output.
    pub fn new(backend: Box<dyn ModelBackend>, input_side: u32) -> TriageResult<Self> {
        let side = input_side as i64;
        let shape_ok = match backend.input_shape() {
            [batch, h, w, 3] => (*batch == 1 || *batch < 0) && *h == side && *w == side,
            _ => false,
        };
        if input_side == 0 || !shape_ok {
            return Err(TriageError::model_load(
                backend.name(),
                format!(
                    "input shape {:?} does not match expected [1, {side}, {side}, 3]",
                    backend.input_shape()
                ),
                Some("check the configured input side against the exported model"),
                None,
            ));
        }
        if backend.output_count() == 0 {
            return Err(TriageError::model_load(
                backend.name(),
                "model declares no outputs",
                None,
                None,
            ));
        }

        Ok(Self {
            backend,
            input_side,
        })
    }

    /// Name of the underlying model.
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Side length of the model input.
    pub fn input_side(&self) -> u32 {
        self.input_side
    }

    /// Number of outputs the model declares.
    pub fn output_count(&self) -> usize {
        self.backend.output_count()
    }

    /// Runs the complete forward pass: pack -> run -> decode.
    pub fn forward(&mut self, image: &DynamicImage) -> TriageResult<ClassifierOutput> {
        let start = Instant::now();
        let packed = pack(image, self.input_side)?;
        let packed_at = start.elapsed();

        let outputs = self.backend.run(&packed.tensor)?;
        let run_at = start.elapsed();

        let counts: Vec<usize> = outputs.iter().map(OutputTensor::element_count).collect();
        let layout = resolve_output_layout(&counts);
        let preview = packed.preview;

        let (probability, heatmap) = match layout {
            OutputLayout::ProbabilityOnly { probability } => {
                (self.probability_or_zero(&outputs[probability]), None)
            }
            OutputLayout::WithSaliency {
                probability,
                saliency,
            } => {
                let heatmap = decode_saliency(&outputs[saliency], self.input_side)
                    .and_then(|grid| to_overlay(grid.view(), preview.width(), preview.height()));
                let heatmap = match heatmap {
                    Ok(overlay) => Some(overlay),
                    Err(err) => {
                        tracing::warn!(
                            model = self.backend.name(),
                            error = %err,
                            "dropping saliency heatmap"
                        );
                        None
                    }
                };
                (self.probability_or_zero(&outputs[probability]), heatmap)
            }
            OutputLayout::Unrecognized => {
                tracing::warn!(
                    model = self.backend.name(),
                    element_counts = ?counts,
                    "cannot tell probability from saliency output, degrading result"
                );
                (0.0, None)
            }
        };

        tracing::debug!(
            model = self.backend.name(),
            pack_ms = packed_at.as_secs_f64() * 1000.0,
            run_ms = (run_at - packed_at).as_secs_f64() * 1000.0,
            total_ms = start.elapsed().as_secs_f64() * 1000.0,
            probability,
            heatmap = heatmap.is_some(),
            "classifier forward pass"
        );

        Ok(ClassifierOutput {
            probability,
            heatmap,
            preview,
            layout,
        })
    }

    fn probability_or_zero(&self, output: &OutputTensor) -> f32 {
        read_probability(output).unwrap_or_else(|| {
            tracing::warn!(
                model = self.backend.name(),
                shape = ?output.shape,
                "unrecognized probability output, falling back to 0"
            );
            0.0
        })
    }
}
