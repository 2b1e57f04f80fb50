//! Core ONNX Runtime inference engine with session pooling.

use crate::core::errors::EcgError;
use ort::session::Session;
use std::sync::Mutex;

/// Name of the optional graph input accepted by lead-graph models.
pub const EDGE_INDEX_INPUT: &str = "edge_index";

#[path = "ort_infer_builders.rs"]
mod ort_infer_builders;
#[path = "ort_infer_execution.rs"]
mod ort_infer_execution;

/// A pool of ONNX Runtime sessions for one model.
///
/// `Session::run` needs exclusive access, so each session sits behind a mutex and
/// calls are spread round-robin across the pool.
pub struct OrtInfer {
    pub(super) sessions: Vec<Mutex<Session>>,
    pub(super) next_idx: std::sync::atomic::AtomicUsize,
    pub(super) input_name: String,
    pub(super) input_names: Vec<String>,
    pub(super) model_path: std::path::PathBuf,
    pub(super) model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("input_names", &self.input_names)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Whether the model declares an input with the given name.
    pub fn has_input(&self, name: &str) -> bool {
        self.input_names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_model_load_error() {
        let err = OrtInfer::from_config("/nonexistent/binary_screen.onnx", None, 2, None)
            .unwrap_err();
        assert!(matches!(err, EcgError::ModelLoad { .. }));
        assert!(err.to_string().contains("binary_screen.onnx"));
    }
}
