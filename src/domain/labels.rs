//! Class probabilities, decision thresholds and risk levels.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use ndarray::Array1;
use ndarray_npy::ReadNpyExt;
use serde::{Deserialize, Serialize};

use crate::core::constants::{ABNORMAL_SENTINEL_LABEL, DEFAULT_CLASS_THRESHOLD};
use crate::core::errors::{EcgError, SimpleError};

/// Per-class probabilities in canonical class order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities {
    entries: Vec<(String, f32)>,
}

impl ClassProbabilities {
    /// Pairs class names with probabilities.
    ///
    /// Probabilities are clamped to `[0, 1]`; non-finite values become zero.
    pub fn new(class_names: &[String], probabilities: &[f32]) -> Result<Self, EcgError> {
        if class_names.len() != probabilities.len() {
            return Err(EcgError::shape_mismatch(
                "ClassProbabilities",
                &[class_names.len()],
                &[probabilities.len()],
            ));
        }
        let entries = class_names
            .iter()
            .zip(probabilities)
            .map(|(name, &p)| {
                let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
                (name.clone(), p)
            })
            .collect();
        Ok(Self { entries })
    }

    /// Applies a sigmoid to each logit and pairs the result with its class.
    pub fn from_logits(class_names: &[String], logits: &[f32]) -> Result<Self, EcgError> {
        let probs: Vec<f32> = logits.iter().map(|&x| sigmoid(x)).collect();
        Self::new(class_names, &probs)
    }

    pub fn get(&self, class: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(name, _)| name == class)
            .map(|&(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Logistic function.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-class decision thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    thresholds: BTreeMap<String, f32>,
    default_threshold: f32,
}

impl ThresholdTable {
    /// Builds a table from explicit entries. Classes without an entry use `default_threshold`.
    pub fn new(thresholds: BTreeMap<String, f32>, default_threshold: f32) -> Result<Self, EcgError> {
        for (class, &t) in thresholds.iter() {
            if !(0.0..=1.0).contains(&t) {
                return Err(EcgError::config_error_with_context(
                    &format!("thresholds.{}", class),
                    &t.to_string(),
                    "threshold must be between 0.0 and 1.0",
                ));
            }
        }
        Ok(Self {
            thresholds,
            default_threshold,
        })
    }

    /// Every class uses the same threshold.
    pub fn uniform(default_threshold: f32) -> Self {
        Self {
            thresholds: BTreeMap::new(),
            default_threshold,
        }
    }

    /// Reads a NumPy `.npy` vector holding one threshold per class in canonical order.
    pub fn from_npy(
        path: impl AsRef<Path>,
        class_names: &[String],
        default_threshold: f32,
    ) -> Result<Self, EcgError> {
        let path = path.as_ref();
        let values = match Array1::<f32>::read_npy(File::open(path)?) {
            Ok(values) => values,
            // NumPy saves float64 by default.
            Err(_) => Array1::<f64>::read_npy(File::open(path)?)
                .map(|values| values.mapv(|v| v as f32))
                .map_err(|e| {
                    EcgError::model_load_error(
                        path,
                        "failed to read threshold vector",
                        Some("store thresholds as a 1-D float32 or float64 .npy array"),
                        Some(SimpleError::new(e.to_string())),
                    )
                })?,
        };
        if values.len() != class_names.len() {
            return Err(EcgError::config_error(format!(
                "threshold vector {} has {} entries for {} classes",
                path.display(),
                values.len(),
                class_names.len()
            )));
        }
        let thresholds = class_names
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect();
        Self::new(thresholds, default_threshold)
    }

    pub fn threshold(&self, class: &str) -> f32 {
        self.thresholds
            .get(class)
            .copied()
            .unwrap_or(self.default_threshold)
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::uniform(DEFAULT_CLASS_THRESHOLD)
    }
}

/// Selects every class whose probability reaches its threshold.
///
/// The result keeps canonical class order. When nothing passes, the result is the
/// single sentinel label `ABNORMAL`.
pub fn decide(probs: &ClassProbabilities, thresholds: &ThresholdTable) -> Vec<String> {
    let labels: Vec<String> = probs
        .iter()
        .filter(|&(class, p)| p >= thresholds.threshold(class))
        .map(|(class, _)| class.to_string())
        .collect();
    if labels.is_empty() {
        vec![ABNORMAL_SENTINEL_LABEL.to_string()]
    } else {
        labels
    }
}

/// Clinical risk attached to a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => f.write_str("Low"),
            RiskLevel::Moderate => f.write_str("Moderate"),
            RiskLevel::High => f.write_str("High"),
        }
    }
}

/// Default class to risk mapping.
pub fn default_risk_levels() -> BTreeMap<String, RiskLevel> {
    [
        ("NORM", RiskLevel::Low),
        ("MI", RiskLevel::High),
        ("STTC", RiskLevel::High),
        ("HYP", RiskLevel::Moderate),
        ("CD", RiskLevel::Moderate),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Highest risk among the labels. Unknown labels, including the sentinel, are `Moderate`.
pub fn overall_risk(labels: &[String], table: &BTreeMap<String, RiskLevel>) -> RiskLevel {
    labels
        .iter()
        .map(|label| table.get(label).copied().unwrap_or(RiskLevel::Moderate))
        .max()
        .unwrap_or(RiskLevel::Moderate)
}
