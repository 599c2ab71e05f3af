//! Error types for the triage core.

mod types;

pub use types::{ProcessingStage, TriageError};

/// Result alias used throughout the crate.
pub type TriageResult<T> = Result<T, TriageError>;
