//! Model adapters used by the cascade.
//!
//! Whole-image scorers back the validator and the binary screen; the graph models back
//! the multi-label stage.

pub mod classification;
pub mod graph;

pub use classification::*;
pub use graph::{GraphNetClassifier, OnnxGraphClassifier};
