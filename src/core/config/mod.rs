//! Configuration management for the cascade.
//!
//! This module provides the [`CascadeConfig`] file format, ONNX Runtime session
//! options and the validation trait shared by configuration types.

pub mod cascade;
pub mod errors;
pub mod onnx;

// Re-export commonly used types
pub use cascade::{CascadeConfig, GraphConfig, NetworkConfig};
pub use errors::{ConfigError, ConfigValidator};
pub use onnx::*;
