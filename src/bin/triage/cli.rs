//! Subcommand implementations.

use lesion_triage::core::config::{EngineConfig, GateConfig};
use lesion_triage::pipeline::{InferenceSummary, TriageOutcome, TriagePipeline};
use lesion_triage::predictors::{InferenceResult, ModelHandle};
use lesion_triage::processors::{DEFAULT_OVERLAY_STRENGTH, ImageQualityGate, blend_overlay};
use lesion_triage::utils::load_image;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Run the quality gate on a local file
pub fn run_gate(path: &Path, config: GateConfig) -> CliResult {
    let image = load_image(path)?;
    let gate = ImageQualityGate::new(config)?;

    let start = Instant::now();
    let result = gate.evaluate(&image)?;
    info!(
        "Gate evaluated in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    print_json(&result)
}

/// Score a local file with the classifier
pub fn run_infer(path: &Path, engine: &EngineConfig, heatmap_out: Option<&Path>) -> CliResult {
    let image = load_image(path)?;

    let start = Instant::now();
    let handle = ModelHandle::from_config(engine)?;
    info!(
        "Engine initialized in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let infer_start = Instant::now();
    let result = handle.infer(&image)?;
    info!(
        "Inference completed in {:.2}ms",
        infer_start.elapsed().as_secs_f64() * 1000.0
    );
    handle.close();

    if let Some(out) = heatmap_out {
        save_heatmap(&result, out)?;
    }
    print_json(&InferenceSummary::from(&result))
}

/// Gate a local file and score it if accepted
pub fn run_triage(
    path: &Path,
    gate_config: GateConfig,
    engine: &EngineConfig,
    heatmap_out: Option<&Path>,
) -> CliResult {
    let image = load_image(path)?;
    let gate = ImageQualityGate::new(gate_config)?;
    let handle = Arc::new(ModelHandle::from_config(engine)?);
    let pipeline = TriagePipeline::new(gate, handle);

    let start = Instant::now();
    let outcome = pipeline.run(&image)?;
    info!(
        "Triage completed in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    pipeline.engine().close();

    if let (TriageOutcome::Analyzed { inference, .. }, Some(out)) = (&outcome, heatmap_out) {
        save_heatmap(inference, out)?;
    }
    print_json(&outcome.report())
}

fn save_heatmap(result: &InferenceResult, out: &Path) -> CliResult {
    let Some(heatmap) = &result.heatmap else {
        warn!("Model produced no saliency map, skipping {}", out.display());
        return Ok(());
    };
    let blended = blend_overlay(&result.preview, heatmap, DEFAULT_OVERLAY_STRENGTH)?;
    blended.save(out)?;
    info!("Heatmap written to {}", out.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
