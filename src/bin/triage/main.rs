//! Lesion Triage CLI
//!
//! Runs the quality gate and the lesion classifier on a single image and
//! prints a JSON summary.
//!
//! # Usage
//!
//! ```bash
//! lesion-triage gate --file lesion.jpg
//! lesion-triage infer --file lesion.jpg --model models/lesion.onnx --calibration models/calibration.json --heatmap overlay.png
//! lesion-triage triage --file lesion.jpg --config triage.json
//! ```

mod cli;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "lesion-triage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Skin lesion quality gate and malignancy triage", long_about = None)]
struct Cli {
    /// JSON file with gate and engine settings
    #[arg(long, global = true, env = "LESION_TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Model options shared by `infer` and `triage`.
#[derive(clap::Args)]
struct ModelArgs {
    /// Path to the ONNX lesion classifier
    #[arg(long, env = "LESION_MODEL")]
    model: Option<PathBuf>,

    /// Path to the calibration asset carrying the threshold
    #[arg(long, env = "LESION_CALIBRATION")]
    calibration: Option<PathBuf>,

    /// Model input side length
    #[arg(long)]
    side: Option<u32>,

    /// Write the saliency heatmap blended onto the scored image to this PNG
    #[arg(long)]
    heatmap: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run only the quality gate
    Gate {
        /// Local file path of the image to check
        #[arg(long)]
        file: PathBuf,
    },
    /// Run only the classifier, skipping the gate
    Infer {
        /// Local file path of the image to score
        #[arg(long)]
        file: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Run the gate and, if the frame is accepted, the classifier
    Triage {
        /// Local file path of the image to triage
        #[arg(long)]
        file: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    lesion_triage::utils::init_tracing();

    let cli = Cli::parse();
    let file_config = cli
        .config
        .as_deref()
        .map(config::load_file_config)
        .transpose()?;

    match cli.command {
        Commands::Gate { file } => {
            let gate_config = file_config.map(|c| c.gate).unwrap_or_default();
            info!("Checking file: {}", file.display());
            cli::run_gate(&file, gate_config)?;
        }
        Commands::Infer { file, model } => {
            let engine = config::resolve_engine(file_config.as_ref(), &model)?;
            info!("Scoring file: {}", file.display());
            cli::run_infer(&file, &engine, model.heatmap.as_deref())?;
        }
        Commands::Triage { file, model } => {
            let engine = config::resolve_engine(file_config.as_ref(), &model)?;
            let gate_config = file_config.map(|c| c.gate).unwrap_or_default();
            info!("Triaging file: {}", file.display());
            cli::run_triage(&file, gate_config, &engine, model.heatmap.as_deref())?;
        }
    }

    Ok(())
}
