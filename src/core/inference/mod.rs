//! Inference backends.
//!
//! The engine talks to the model through [`ModelBackend`], so the decoding and
//! classification logic can run against any execution context. [`OrtBackend`]
//! is the production implementation on top of ONNX Runtime.

mod ort_backend;
mod ort_infer_config;

pub use ort_backend::OrtBackend;

use crate::core::{Tensor4D, TriageResult};

/// A single output tensor returned by a backend run.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    /// Shape reported for this output.
    pub shape: Vec<i64>,
    /// Row-major float data.
    pub data: Vec<f32>,
}

impl OutputTensor {
    /// Creates an output tensor.
    pub fn new(shape: Vec<i64>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Number of elements implied by the shape.
    ///
    /// Falls back to the data length when the shape has dynamic or
    /// non-positive dimensions.
    pub fn element_count(&self) -> usize {
        if !self.shape.is_empty() && self.shape.iter().all(|&d| d > 0) {
            self.shape.iter().product::<i64>() as usize
        } else {
            self.data.len()
        }
    }
}

/// An execution context for a loaded model.
///
/// Implementations are not required to be reentrant: `run` takes `&mut self`
/// and callers serialize access.
pub trait ModelBackend: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Declared shape of the (single) input tensor.
    fn input_shape(&self) -> &[i64];

    /// Number of output tensors the model produces.
    fn output_count(&self) -> usize;

    /// Runs the model on a packed `[1, side, side, 3]` input.
    fn run(&mut self, input: &Tensor4D) -> TriageResult<Vec<OutputTensor>>;
}
