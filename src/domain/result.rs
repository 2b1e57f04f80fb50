//! The single record produced for each classified image.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::constants::{NORMAL_LABEL, PERCENT_DECIMALS, PROBABILITY_DECIMALS};
use crate::domain::labels::{ClassProbabilities, RiskLevel};

const NORMAL_EXPLANATION: &str = "ECG morphology consistent with normal patterns";
const MULTI_LABEL_EXPLANATION: &str =
    "Abnormal ECG detected \u{2192} lead-wise graph analysis performed";
const REJECTED_ERROR: &str = "Not a valid ECG image";

/// Outcome of one pass through the cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResult {
    /// The validator judged the image not to be an ECG.
    Rejected {
        /// Validator probability in `[0, 1]`.
        validation_confidence: f32,
    },
    /// The binary screen judged the ECG normal.
    NormalByScreen {
        /// `1 - p_abnormal`.
        confidence: f32,
    },
    /// The multi-label stage ran.
    MultiLabel {
        labels: Vec<String>,
        probabilities: ClassProbabilities,
        binary_abnormal_prob: f32,
        risk_level: RiskLevel,
        degraded: bool,
    },
    /// A stage failed.
    Failed { error: String },
}

impl ClassificationResult {
    /// Builds a `Failed` record from an error and its source chain.
    pub fn failed(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        ClassificationResult::Failed { error: text }
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassificationResult::Rejected { .. } => "rejected",
            ClassificationResult::NormalByScreen { .. } => "normal_by_screen",
            ClassificationResult::MultiLabel { .. } => "multi_label",
            ClassificationResult::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ClassificationResult::NormalByScreen { .. } | ClassificationResult::MultiLabel { .. }
        )
    }

    /// Compact JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn round_to(value: f32, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value as f64 * factor).round() / factor
}

fn round_probability(value: f32) -> f64 {
    round_to(value, PROBABILITY_DECIMALS)
}

fn as_percent(value: f32) -> f64 {
    round_to(value * 100.0, PERCENT_DECIMALS)
}

/// Serializes probabilities as an object in canonical class order.
struct RoundedProbabilities<'a>(&'a ClassProbabilities);

impl Serialize for RoundedProbabilities<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (class, p) in self.0.iter() {
            map.serialize_entry(class, &round_probability(p))?;
        }
        map.end()
    }
}

impl Serialize for ClassificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            ClassificationResult::Rejected {
                validation_confidence,
            } => {
                let percent = as_percent(*validation_confidence);
                map.serialize_entry("success", &false)?;
                map.serialize_entry("is_valid_ecg", &false)?;
                map.serialize_entry("validation_confidence", &percent)?;
                map.serialize_entry("error", REJECTED_ERROR)?;
                map.serialize_entry(
                    "message",
                    &format!(
                        "The uploaded image does not appear to be a valid ECG. Confidence: {:.2}%",
                        percent
                    ),
                )?;
            }
            ClassificationResult::NormalByScreen { confidence } => {
                map.serialize_entry("stage", "BINARY")?;
                map.serialize_entry("prediction", NORMAL_LABEL)?;
                map.serialize_entry("confidence", &round_probability(*confidence))?;
                map.serialize_entry("risk_level", &RiskLevel::Low)?;
                map.serialize_entry("explanation", NORMAL_EXPLANATION)?;
            }
            ClassificationResult::MultiLabel {
                labels,
                probabilities,
                binary_abnormal_prob,
                risk_level,
                degraded,
            } => {
                map.serialize_entry("stage", "MULTI")?;
                map.serialize_entry("prediction", labels)?;
                map.serialize_entry("probabilities", &RoundedProbabilities(probabilities))?;
                map.serialize_entry(
                    "binary_abnormal_prob",
                    &round_probability(*binary_abnormal_prob),
                )?;
                map.serialize_entry("risk_level", risk_level)?;
                map.serialize_entry("degraded", degraded)?;
                map.serialize_entry("explanation", MULTI_LABEL_EXPLANATION)?;
            }
            ClassificationResult::Failed { error } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("message", &format!("Prediction failed: {}", error))?;
            }
        }
        map.end()
    }
}
