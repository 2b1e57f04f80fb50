//! Domain types shared by the digitizer, the classifiers and the cascade.

pub mod graph;
pub mod labels;
pub mod result;
pub mod signal;

pub use graph::{GraphTopology, LeadGraph, LeadGraphBuilder};
pub use labels::{
    ClassProbabilities, RiskLevel, ThresholdTable, decide, default_risk_levels, overall_risk,
    sigmoid,
};
pub use result::ClassificationResult;
pub use signal::{DigitizedSignal, SignalNormalization};
