//! The cascade configuration file.
//!
//! Every field has a default, so an empty JSON object is a valid configuration:
//!
//! ```rust
//! use ecg_cascade::core::config::CascadeConfig;
//!
//! let config: CascadeConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(config.abnormal_threshold, 0.4);
//! assert_eq!(config.class_names.len(), 5);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};
use super::onnx::OrtSessionConfig;
use crate::core::constants::{
    DEFAULT_ABNORMAL_THRESHOLD, DEFAULT_CLASS_NAMES, DEFAULT_CLASS_THRESHOLD, DEFAULT_INPUT_SIZE,
    DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MISSING_VALIDATOR_CONFIDENCE, DEFAULT_VALIDATION_THRESHOLD,
    DEFAULT_VALIDATOR_ERROR_CONFIDENCE,
};
use crate::core::errors::EcgError;
use crate::digitizer::DigitizerConfig;
use crate::domain::{GraphTopology, RiskLevel, default_risk_levels};
use crate::models::graph::GraphNetPreset;

/// Lead graph settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub topology: GraphTopology,
}

/// Native multi-label network settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub preset: GraphNetPreset,
}

/// Configuration for the whole cascade, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Directory that relative model paths resolve against.
    pub model_dir: Option<PathBuf>,
    /// ONNX model scoring whether an image is an ECG at all.
    pub validator_model: PathBuf,
    /// When false the validator is treated as absent.
    pub validator_enabled: bool,
    /// ONNX model scoring normal vs. abnormal.
    pub binary_model: PathBuf,
    /// Multi-label model: `.onnx` runs through ONNX Runtime, anything else is read as
    /// safetensors weights for the native network.
    pub multilabel_model: PathBuf,

    pub validation_threshold: f32,
    /// Probability reported when no validator model is available.
    pub missing_model_confidence: f32,
    /// Probability reported when the validator fails on an image.
    pub error_confidence: f32,

    pub abnormal_threshold: f32,
    /// Side length of the square image fed to the image models.
    pub input_size: u32,

    pub digitizer: DigitizerConfig,
    pub graph: GraphConfig,
    pub network: NetworkConfig,

    pub class_names: Vec<String>,
    /// Inline per-class thresholds. Takes precedence over `thresholds_path`.
    pub thresholds: Option<BTreeMap<String, f32>>,
    /// NumPy vector of per-class thresholds in `class_names` order.
    pub thresholds_path: Option<PathBuf>,
    pub default_threshold: f32,

    pub risk_levels: BTreeMap<String, RiskLevel>,
    /// Accept weight files that do not cover every parameter, flagging results as degraded.
    pub allow_partial_weights: bool,
    pub max_image_bytes: u64,

    pub ort_session: Option<OrtSessionConfig>,
    pub session_pool_size: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            validator_model: PathBuf::from("ecg_validator.onnx"),
            validator_enabled: true,
            binary_model: PathBuf::from("binary_screen.onnx"),
            multilabel_model: PathBuf::from("multilabel.safetensors"),
            validation_threshold: DEFAULT_VALIDATION_THRESHOLD,
            missing_model_confidence: DEFAULT_MISSING_VALIDATOR_CONFIDENCE,
            error_confidence: DEFAULT_VALIDATOR_ERROR_CONFIDENCE,
            abnormal_threshold: DEFAULT_ABNORMAL_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
            digitizer: DigitizerConfig::default(),
            graph: GraphConfig::default(),
            network: NetworkConfig::default(),
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            thresholds: None,
            thresholds_path: None,
            default_threshold: DEFAULT_CLASS_THRESHOLD,
            risk_levels: default_risk_levels(),
            allow_partial_weights: true,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            ort_session: None,
            session_pool_size: 1,
        }
    }
}

impl CascadeConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EcgError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EcgError::config_error(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!("Loaded cascade configuration from {}", path.display());
        Ok(config)
    }

    /// Overrides the model directory.
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Resolves a model path against `model_dir` unless it is absolute.
    pub fn resolve_model_path(&self, path: &Path) -> PathBuf {
        match &self.model_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Whether the multi-label model is an ONNX file rather than native weights.
    pub fn multilabel_is_onnx(&self) -> bool {
        self.multilabel_model
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("onnx"))
    }
}

impl ConfigValidator for CascadeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_probability(self.validation_threshold, "validation_threshold")?;
        self.validate_probability(self.missing_model_confidence, "missing_model_confidence")?;
        self.validate_probability(self.error_confidence, "error_confidence")?;
        self.validate_probability(self.abnormal_threshold, "abnormal_threshold")?;
        self.validate_probability(self.default_threshold, "default_threshold")?;
        self.validate_positive(self.input_size as usize, "input_size")?;
        self.validate_thread_count(self.session_pool_size)?;

        if self.class_names.is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "class_names must not be empty".to_string(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.class_names.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ConfigError::InvalidConfig {
                message: format!("duplicate class name '{}'", dup),
            });
        }
        if let Some(thresholds) = &self.thresholds {
            for (class, &value) in thresholds {
                self.validate_probability(value, &format!("thresholds.{}", class))?;
            }
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "max_image_bytes must be greater than 0".to_string(),
            });
        }
        self.digitizer.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digitizer::DigitizerMode;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = CascadeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.validation_threshold, 0.5);
        assert_eq!(config.missing_model_confidence, 0.95);
        assert_eq!(config.error_confidence, 0.90);
        assert!(!config.multilabel_is_onnx());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CascadeConfig = serde_json::from_str(
            r#"{
                "abnormal_threshold": 0.3,
                "multilabel_model": "graph.ONNX",
                "digitizer": {"mode": "cell_tracing"},
                "graph": {"topology": "fully_connected"},
                "network": {"preset": "gcn_mean"},
                "thresholds": {"MI": 0.35}
            }"#,
        )
        .unwrap();
        assert_eq!(config.abnormal_threshold, 0.3);
        assert_eq!(config.digitizer.mode, DigitizerMode::CellTracing);
        assert_eq!(config.graph.topology, GraphTopology::FullyConnected);
        assert_eq!(config.network.preset, GraphNetPreset::GcnMean);
        assert_eq!(config.input_size, 224);
        assert!(config.multilabel_is_onnx());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CascadeConfig {
            abnormal_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CascadeConfig {
            class_names: vec!["MI".to_string(), "MI".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CascadeConfig {
            session_pool_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_model_path() {
        let config = CascadeConfig::default().with_model_dir("/models");
        assert_eq!(
            config.resolve_model_path(Path::new("binary.onnx")),
            PathBuf::from("/models/binary.onnx")
        );
        assert_eq!(
            config.resolve_model_path(Path::new("/abs/binary.onnx")),
            PathBuf::from("/abs/binary.onnx")
        );
        let config = CascadeConfig::default();
        assert_eq!(
            config.resolve_model_path(Path::new("binary.onnx")),
            PathBuf::from("binary.onnx")
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"input_size": 128}}"#).unwrap();
        let config = CascadeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.input_size, 128);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"validation_threshold": 2.0}}"#).unwrap();
        assert!(matches!(
            CascadeConfig::from_file(bad.path()),
            Err(EcgError::ConfigError { .. })
        ));
    }
}
