//! # ECG Cascade
//!
//! Classifies ECG images with a cascade of models: an optional validator rejects
//! images that are not ECGs, a binary screen separates normal from abnormal tracings,
//! and abnormal tracings are digitized into 12 lead signals and classified into
//! disease categories by a CNN + graph network over the leads.
//!
//! ## Features
//!
//! - Two digitizers: grid subtraction over stacked lead bands, and trace following
//!   over a rows x cols grid of lead cells
//! - Native CNN + GCN / GraphSAGE inference on `ndarray` from safetensors weights
//! - ONNX Runtime for the image models and, optionally, the multi-label model
//! - Per-class thresholds with a sentinel for "abnormal, category unknown"
//! - One JSON record per image
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, inference and model traits
//! * [`digitizer`] - Image to lead-signal conversion
//! * [`domain`] - Signals, lead graphs, labels and results
//! * [`models`] - Image scorers and graph classifiers
//! * [`pipeline`] - Cascade builder and orchestrator
//! * [`processors`] - Image and signal processing primitives
//! * [`utils`] - Image loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecg_cascade::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CascadeConfig::from_file("cascade.json")?;
//! let cascade = CascadeBuilder::new(config).build()?;
//!
//! match cascade.classify(Path::new("ecg.png")) {
//!     ClassificationResult::MultiLabel { labels, .. } => println!("{:?}", labels),
//!     other => println!("{}", other.to_json()?),
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod digitizer;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ecg_cascade::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::config::CascadeConfig;
    pub use crate::core::{EcgError, EcgResult, init_tracing};
    pub use crate::digitizer::{DigitizerConfig, DigitizerMode, LeadDigitizer};
    pub use crate::domain::{
        ClassProbabilities, ClassificationResult, DigitizedSignal, GraphTopology, LeadGraph,
        RiskLevel, ThresholdTable,
    };
    pub use crate::pipeline::{CascadeBuilder, CascadeOrchestrator};
    pub use crate::utils::load_image;
}
