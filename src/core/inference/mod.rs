//! Structures and helpers for ONNX Runtime inference.
//!
//! [`OrtInfer`] owns a small pool of sessions for one model file and exposes typed
//! entry points for the two input shapes the cascade feeds: normalized images and
//! lead signals.

pub mod ort_infer;

pub use ort_infer::{EDGE_INDEX_INPUT, OrtInfer};
