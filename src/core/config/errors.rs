//! Configuration errors and the validation trait shared by config types.

use thiserror::Error;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its allowed range.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// What was expected and what was found.
        message: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file '{path}'")]
    Read {
        /// Path of the file.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the target type.
    #[error("failed to parse config file '{path}'")]
    Parse {
        /// Path of the file.
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Implemented by every configuration type that carries invariants.
pub trait ConfigValidator {
    /// Checks the configuration's invariants.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Fails unless `value` lies in `[min, max]`.
pub(crate) fn ensure_range(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::invalid(
            field,
            format!("expected a value in [{min}, {max}], got {value}"),
        ));
    }
    Ok(())
}

/// Fails unless `value` is strictly positive.
pub(crate) fn ensure_positive(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "expected a value > 0, got 0"));
    }
    Ok(())
}
