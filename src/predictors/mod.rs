//! High-level predictor API.
//!
//! [`ModelHandle`] is the public entry point for running the lesion
//! classifier; [`SharedEngine`] holds the process-wide instance.

pub mod inference_engine;

pub use inference_engine::{
    InferenceResult, ModelHandle, ModelHandleBuilder, SharedEngine, classify,
};
