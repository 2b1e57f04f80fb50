use super::*;
use crate::core::config::{OrtGraphOptimizationLevel, OrtSessionConfig};
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;
use std::sync::Mutex;

impl OrtInfer {
    /// Creates a pool of `pool_size` sessions, applying the optional ORT session configuration.
    ///
    /// When `input_name` is `None` the first input declared by the model is used.
    pub fn from_config(
        model_path: impl AsRef<Path>,
        ort_session: Option<&OrtSessionConfig>,
        pool_size: usize,
        input_name: Option<&str>,
    ) -> Result<Self, EcgError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(EcgError::model_load_error(
                path,
                "model file not found",
                Some("check the model directory and file name in the configuration"),
                None::<std::io::Error>,
            ));
        }
        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Session::builder()?.with_log_level(LogLevel::Error)?;
            let builder = match ort_session {
                Some(cfg) => Self::apply_ort_config(builder, cfg)?,
                None => builder,
            };
            let session = builder.commit_from_file(path).map_err(|e| {
                EcgError::model_load_error(
                    path,
                    "failed to create ONNX session",
                    Some("verify model path and compatibility with the installed ONNX Runtime"),
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let input_names: Vec<String> = sessions
            .first()
            .and_then(|s| s.lock().ok())
            .map(|s| s.inputs.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default();

        let input_name = match input_name {
            Some(name) => name.to_string(),
            None => input_names.first().cloned().ok_or_else(|| {
                EcgError::model_load_error(
                    path,
                    "model declares no inputs",
                    None,
                    None::<ort::Error>,
                )
            })?,
        };

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        tracing::debug!(
            "Loaded ONNX model '{}' ({} session(s), inputs {:?})",
            model_name,
            pool_size,
            input_names
        );

        Ok(OrtInfer {
            sessions,
            next_idx: std::sync::atomic::AtomicUsize::new(0),
            input_name,
            input_names,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        Ok(builder)
    }
}
