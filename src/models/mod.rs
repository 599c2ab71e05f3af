//! Model wrappers.
//!
//! A model couples a [`ModelBackend`](crate::core::ModelBackend) with the
//! pre- and post-processing its exported graph expects.

pub mod lesion_classifier;

pub use lesion_classifier::{
    ClassifierOutput, LesionClassifier, OutputLayout, SaliencyDims, decode_saliency,
    read_probability, resolve_output_layout, saliency_dims,
};
