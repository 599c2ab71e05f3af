//! # Lesion Triage
//!
//! On-device core of a skin-lesion triage tool: a quality gate that decides
//! whether a captured frame is eligible for analysis, and an inference engine
//! that turns an eligible frame into a calibrated malignancy probability plus
//! an optional saliency heatmap.
//!
//! ## Features
//!
//! - Skin-content and exposure gate over raw pixel statistics
//! - Exact NHWC float packing for the exported classifier
//! - Output-order-agnostic decoding of probability and saliency tensors
//! - Calibrated decision threshold with a safe default fallback
//! - False-color saliency overlays aligned with the scored image
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, and the inference backend seam
//! * [`processors`] - Color conversions, quality gate, tensor codec
//! * [`models`] - The lesion classifier wrapper
//! * [`predictors`] - The public [`ModelHandle`](predictors::ModelHandle)
//! * [`pipeline`] - Gate-then-infer convenience pipeline
//! * [`utils`] - Image helpers and tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lesion_triage::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = load_image("lesion.jpg")?;
//!
//! let gate = ImageQualityGate::default().evaluate(&image)?;
//! if !gate.accepted {
//!     println!("retake: {}", gate.reason);
//!     return Ok(());
//! }
//!
//! let handle = ModelHandle::load(
//!     "models/lesion.onnx",
//!     Some(Path::new("models/calibration.json")),
//!     224,
//! )?;
//! let result = handle.infer(&image)?;
//! println!("p={:.4} malignant={}", result.probability, result.is_malignant);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod models;
pub mod pipeline;
pub mod predictors;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use lesion_triage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::config::{EngineConfig, GateConfig, TriageConfig};
    pub use crate::core::{TriageError, TriageResult};
    pub use crate::pipeline::{TriageOutcome, TriagePipeline};
    pub use crate::predictors::{InferenceResult, ModelHandle, SharedEngine, classify};
    pub use crate::processors::{
        DEFAULT_OVERLAY_STRENGTH, GateRejection, GateResult, ImageQualityGate, blend_overlay,
    };
    pub use crate::utils::load_image;
}
