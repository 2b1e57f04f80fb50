//! Error types for the ECG cascade.
//!
//! This module defines the errors that can occur while loading images and models,
//! digitizing leads, running inference, and validating configuration.

use thiserror::Error;

/// Enum representing different stages of processing in the cascade.
///
/// This enum is used to identify which stage an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred during tensor operations.
    TensorOperation,
    /// Error occurred during image normalization.
    Normalization,
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred while digitizing lead waveforms.
    Digitization,
    /// Error occurred while mixing lead features over the lead graph.
    GraphMixing,
    /// Error occurred during post-processing.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Digitization => write!(f, "digitization"),
            ProcessingStage::GraphMixing => write!(f, "graph mixing"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Errors raised by the lead digitizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigitizationError {
    /// The decoded image has zero width or height.
    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// A lead band or cell would have zero area for the given layout.
    #[error(
        "lead region {index} is degenerate: {width}x{height} pixels for a {rows}x{cols} layout"
    )]
    DegenerateCell {
        index: usize,
        width: u32,
        height: u32,
        rows: usize,
        cols: usize,
    },

    /// The grid layout does not hold exactly one cell per lead.
    #[error("layout {rows}x{cols} cannot hold {leads} leads")]
    InvalidLayout {
        rows: usize,
        cols: usize,
        leads: usize,
    },

    /// The lead permutation table is not a bijection on the lead indices.
    #[error("lead permutation is not a bijection on 0..{leads}: {table:?}")]
    InvalidPermutation { table: Vec<usize>, leads: usize },

    /// The configured target length is unusable.
    #[error("target length must be at least 2, got {0}")]
    InvalidTargetLength(usize),
}

/// Enum representing various errors that can occur in the cascade.
#[derive(Error, Debug)]
pub enum EcgError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during model inference.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        model_name: String,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// A model file could not be loaded.
    #[error("failed to load model '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        model_path: String,
        reason: String,
        suggestion: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A weight file only partially matched the network and partial loads are disallowed.
    #[error(
        "model '{model_path}' is missing {} parameters (first: {})",
        .missing.len(),
        .missing.first().map(String::as_str).unwrap_or("-")
    )]
    ModelLoadIncomplete {
        model_path: String,
        missing: Vec<String>,
    },

    /// Error raised by the digitizer.
    #[error("digitization")]
    Digitization(#[from] DigitizationError),

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json")]
    Json(#[from] serde_json::Error),
}

/// A plain message error, used as the source of errors that have no underlying cause.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}
