//! ONNX Runtime backend over a memory-mapped model file.

use super::{ModelBackend, OutputTensor};
use crate::core::config::OrtSessionConfig;
use crate::core::{Tensor4D, TriageError, TriageResult};
use memmap2::Mmap;
use ort::session::Session;
use ort::value::Tensor;
use std::fs::File;
use std::path::Path;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// ONNX Runtime execution context that owns its mapped model bytes.
///
/// Dropping the backend tears down the session and then unmaps the file.
pub struct OrtBackend {
    // Declared before `_mmap` so the session is dropped first.
    session: Session,
    name: String,
    input_shape: Vec<i64>,
    output_count: usize,
    _mmap: Mmap,
}

impl std::fmt::Debug for OrtBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtBackend")
            .field("name", &self.name)
            .field("input_shape", &self.input_shape)
            .field("output_count", &self.output_count)
            .finish_non_exhaustive()
    }
}

impl OrtBackend {
    /// Maps `path` and builds a session from the mapped bytes.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`TriageError::ModelLoad`]: missing file,
    /// empty file, a blob ONNX Runtime cannot parse, or a model without a
    /// tensor input.
    pub fn from_file(path: &Path, config: Option<&OrtSessionConfig>) -> TriageResult<Self> {
        let model_path = path.display().to_string();
        let load_err = |reason: &str, suggestion: Option<&str>, source: Option<BoxedError>| {
            TriageError::model_load(model_path.clone(), reason, suggestion, source)
        };

        let file = File::open(path).map_err(|e| {
            load_err(
                "cannot open model asset",
                Some("check that the model file exists and is readable"),
                Some(Box::new(e)),
            )
        })?;
        // SAFETY: the map is read-only and owned by this backend; the asset is
        // not expected to be modified while the process runs.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| load_err("cannot map model asset", None, Some(Box::new(e))))?;
        if mmap.is_empty() {
            return Err(load_err("model asset is empty", None, None));
        }

        let mut builder = Session::builder()
            .map_err(|e| load_err("cannot create session builder", None, Some(Box::new(e))))?;
        if let Some(cfg) = config {
            builder = Self::apply_ort_config(builder, cfg).map_err(|e| {
                load_err("invalid session configuration", None, Some(Box::new(e)))
            })?;
        }
        let session = builder.commit_from_memory(&mmap).map_err(|e| {
            load_err(
                "model asset is corrupt or unsupported",
                Some("re-export the model as ONNX"),
                Some(Box::new(e)),
            )
        })?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| load_err("model declares no inputs", None, None))?;
        let input_shape: Vec<i64> = input
            .input_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect())
            .ok_or_else(|| load_err("model input is not a tensor", None, None))?;
        let output_count = session.outputs.len();

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_path.clone());

        tracing::info!(
            model = %model_path,
            bytes = mmap.len(),
            input_shape = ?input_shape,
            outputs = output_count,
            "mapped model asset"
        );

        Ok(Self {
            session,
            name,
            input_shape,
            output_count,
            _mmap: mmap,
        })
    }
}

impl ModelBackend for OrtBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> &[i64] {
        &self.input_shape
    }

    fn output_count(&self) -> usize {
        self.output_count
    }

    fn run(&mut self, input: &Tensor4D) -> TriageResult<Vec<OutputTensor>> {
        let tensor = Tensor::from_array(input.clone())?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| TriageError::inference_error(self.name.clone(), "session run failed", e))?;

        let mut decoded = Vec::with_capacity(outputs.len());
        for index in 0..outputs.len() {
            let (shape, data) = outputs[index].try_extract_tensor::<f32>().map_err(|e| {
                TriageError::inference_error(
                    self.name.clone(),
                    format!("output {index} is not a float tensor"),
                    e,
                )
            })?;
            decoded.push(OutputTensor::new(
                shape.iter().copied().collect(),
                data.to_vec(),
            ));
        }
        Ok(decoded)
    }
}
