//! Configuration resolution for the CLI.
//!
//! Settings come from an optional JSON file; command-line flags override it.

use crate::ModelArgs;
use lesion_triage::core::config::{
    ConfigError, ConfigValidator, EngineConfig, GateConfig, read_json_file,
};
use serde::Deserialize;
use std::path::Path;

/// Contents of `--config`. The engine section is optional so a gate-only
/// run does not need a model path.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let config: FileConfig = read_json_file(path)?;
    config.gate.validate()?;
    Ok(config)
}

/// Builds the engine settings from the file and the flags.
pub fn resolve_engine(
    file: Option<&FileConfig>,
    args: &ModelArgs,
) -> Result<EngineConfig, Box<dyn std::error::Error + Send + Sync>> {
    let mut engine = match (file.and_then(|f| f.engine.clone()), &args.model) {
        (Some(mut engine), Some(model)) => {
            engine.model_path = model.clone();
            engine
        }
        (Some(engine), None) => engine,
        (None, Some(model)) => EngineConfig::new(model),
        (None, None) => {
            return Err(
                "a model is required: pass --model or set engine.model_path in --config".into(),
            );
        }
    };

    if let Some(calibration) = &args.calibration {
        engine.calibration_path = Some(calibration.clone());
    }
    if let Some(side) = args.side {
        engine.input_side = side;
    }
    engine.validate()?;
    Ok(engine)
}
