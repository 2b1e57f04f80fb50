//! Seams between the cascade and its models.
//!
//! The cascade only talks to models through these traits, so tests can swap in
//! doubles and the binary screen, the validator and the multi-label stage can each
//! be backed by ONNX Runtime or by native code.

use std::fmt::Debug;

use image::RgbImage;

use crate::core::errors::EcgError;
use crate::domain::{ClassProbabilities, DigitizedSignal, LeadGraph};

/// A whole-image model producing a single probability.
pub trait ImageScorer: Send + Sync + Debug {
    /// Scores an image, returning a probability in `[0, 1]`.
    fn score(&self, image: &RgbImage) -> Result<f32, EcgError>;

    /// Human-readable model name for logs and errors.
    fn name(&self) -> &str;
}

/// A classifier assigning independent probabilities to disease categories.
pub trait MultiLabelClassifier: Send + Sync + Debug {
    /// Classifies a digitized signal using the lead graph for feature mixing.
    fn classify(
        &self,
        signal: &DigitizedSignal,
        graph: &LeadGraph,
    ) -> Result<ClassProbabilities, EcgError>;

    /// Class names in the order the classifier emits them.
    fn class_names(&self) -> &[String];

    /// Whether the classifier was loaded with missing parameters.
    fn is_degraded(&self) -> bool {
        false
    }
}
