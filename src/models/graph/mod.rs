//! Lead-graph multi-label classifiers.
//!
//! [`GraphNetClassifier`] runs a CNN + graph network natively on `ndarray` from
//! safetensors weights; [`OnnxGraphClassifier`] delegates to an exported ONNX model.

pub mod layers;
mod network;
mod onnx;
pub mod weights;

pub use network::{
    ConvSpec, GraphAggregation, GraphLayerSpec, GraphNet, GraphNetClassifier, GraphNetPreset,
    GraphNetSpec, LinearSpec, NodePooling,
};
pub use onnx::OnnxGraphClassifier;
pub use weights::{LoadResult, ParamStore};
