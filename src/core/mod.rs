//! Core building blocks of the cascade.
//!
//! This module contains:
//! - Configuration and its validation
//! - Constants shared across stages
//! - Error handling
//! - ONNX Runtime integration
//! - Traits at the model seams

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod tensor;
pub mod traits;

pub use config::{CascadeConfig, ConfigError, ConfigValidator};
pub use constants::*;
pub use errors::{DigitizationError, EcgError, EcgResult, ProcessingStage};
pub use inference::OrtInfer;
pub use tensor::{Tensor1D, Tensor2D, Tensor3D, Tensor4D};
pub use traits::{ImageScorer, MultiLabelClassifier};

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so that stdout carries only results. The filter comes from
/// `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
