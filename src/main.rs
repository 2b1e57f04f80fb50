//! Command-line entry point.
//!
//! ```text
//! ecg-cascade [--config <cascade.json>] [--model-dir <dir>] <image>
//! ```
//!
//! Prints exactly one JSON record on stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ecg_cascade::core::config::CascadeConfig;
use ecg_cascade::core::{EcgError, init_tracing};
use ecg_cascade::domain::ClassificationResult;
use ecg_cascade::pipeline::{CascadeBuilder, CascadeOrchestrator};
use tracing::error;

/// Command-line arguments
#[derive(Parser)]
#[command(name = "ecg-cascade")]
#[command(about = "Classifies an ECG image and prints the result as JSON")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that relative model paths resolve against
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// ECG image to classify
    image: Option<PathBuf>,
}

fn build_cascade(args: &Args) -> Result<CascadeOrchestrator, EcgError> {
    let mut config = match &args.config {
        Some(path) => CascadeConfig::from_file(path)?,
        None => CascadeConfig::default(),
    };
    if let Some(dir) = &args.model_dir {
        config = config.with_model_dir(dir);
    }
    CascadeBuilder::new(config).build()
}

fn emit(result: &ClassificationResult) {
    match result.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            println!(
                "{{\"success\":false,\"error\":\"serialization failed\",\"message\":\"Prediction failed: serialization failed\"}}"
            );
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let Some(image) = args.image.clone() else {
        emit(&ClassificationResult::Failed {
            error: "No image path provided".to_string(),
        });
        return ExitCode::from(1);
    };

    let result = match build_cascade(&args) {
        Ok(cascade) => cascade.classify(&image),
        Err(e) => {
            error!("Failed to initialize cascade: {}", e);
            ClassificationResult::failed(&e)
        }
    };
    emit(&result);
    ExitCode::SUCCESS
}
