//! Whole-image classifiers.
//!
//! The validator and the binary screen share one architecture contract: a square RGB
//! image in, one logit out.

mod image_scorer;

pub use image_scorer::{OnnxImageScorer, OnnxImageScorerBuilder, ScorerPreprocessConfig};
