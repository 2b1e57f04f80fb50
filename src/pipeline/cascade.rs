//! The cascade state machine.
//!
//! ```text
//! Validating -> BinaryScreening -> Done(NormalByScreen)
//!                               -> Digitizing -> ClassifyingMultiLabel -> ThresholdDecision -> Done(MultiLabel)
//! ```
//!
//! Any stage error ends the run with a `Failed` result; [`CascadeOrchestrator::classify`]
//! always returns a well-formed [`ClassificationResult`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;

use super::gates::{BinaryScreen, ImageValidator};
use super::stats::{CascadeStats, StatsManager};
use crate::core::errors::EcgError;
use crate::core::traits::MultiLabelClassifier;
use crate::digitizer::LeadDigitizer;
use crate::domain::{
    ClassProbabilities, ClassificationResult, DigitizedSignal, LeadGraph, RiskLevel,
    ThresholdTable, decide, overall_risk,
};
use crate::utils::load_image;

/// Everything the cascade needs, built once and shared read-only between calls.
#[derive(Debug)]
pub struct CascadeContext {
    pub validator: ImageValidator,
    pub screen: BinaryScreen,
    pub digitizer: LeadDigitizer,
    pub classifier: Arc<dyn MultiLabelClassifier>,
    pub graph: Arc<LeadGraph>,
    pub thresholds: ThresholdTable,
    pub risk_levels: BTreeMap<String, RiskLevel>,
    pub max_image_bytes: u64,
}

/// Where a run currently is.
#[derive(Debug)]
pub enum CascadeState {
    Validating {
        image: RgbImage,
    },
    BinaryScreening {
        image: RgbImage,
    },
    Digitizing {
        image: RgbImage,
        p_abnormal: f32,
    },
    ClassifyingMultiLabel {
        signal: DigitizedSignal,
        p_abnormal: f32,
    },
    ThresholdDecision {
        probabilities: ClassProbabilities,
        p_abnormal: f32,
    },
    /// Terminal state, including normal and rejected outcomes.
    Done(ClassificationResult),
}

impl CascadeState {
    pub fn name(&self) -> &'static str {
        match self {
            CascadeState::Validating { .. } => "validating",
            CascadeState::BinaryScreening { .. } => "binary_screening",
            CascadeState::Digitizing { .. } => "digitizing",
            CascadeState::ClassifyingMultiLabel { .. } => "classifying_multi_label",
            CascadeState::ThresholdDecision { .. } => "threshold_decision",
            CascadeState::Done(_) => "done",
        }
    }

    /// Advances one stage.
    pub fn step(self, ctx: &CascadeContext) -> Result<CascadeState, EcgError> {
        match self {
            CascadeState::Validating { image } => {
                let p_valid = ctx.validator.score(&image);
                if ctx.validator.is_valid(p_valid) {
                    Ok(CascadeState::BinaryScreening { image })
                } else {
                    tracing::info!("Image rejected by validator (p_valid = {:.3})", p_valid);
                    Ok(CascadeState::Done(ClassificationResult::Rejected {
                        validation_confidence: p_valid,
                    }))
                }
            }
            CascadeState::BinaryScreening { image } => {
                let p_abnormal = ctx.screen.score(&image)?;
                tracing::debug!("Binary screen p_abnormal = {:.4}", p_abnormal);
                if ctx.screen.is_abnormal(p_abnormal) {
                    Ok(CascadeState::Digitizing { image, p_abnormal })
                } else {
                    Ok(CascadeState::Done(ClassificationResult::NormalByScreen {
                        confidence: 1.0 - p_abnormal,
                    }))
                }
            }
            CascadeState::Digitizing { image, p_abnormal } => {
                let signal = ctx.digitizer.digitize(&image)?;
                Ok(CascadeState::ClassifyingMultiLabel { signal, p_abnormal })
            }
            CascadeState::ClassifyingMultiLabel { signal, p_abnormal } => {
                let probabilities = ctx.classifier.classify(&signal, &ctx.graph)?;
                Ok(CascadeState::ThresholdDecision {
                    probabilities,
                    p_abnormal,
                })
            }
            CascadeState::ThresholdDecision {
                probabilities,
                p_abnormal,
            } => {
                let labels = decide(&probabilities, &ctx.thresholds);
                let risk_level = overall_risk(&labels, &ctx.risk_levels);
                Ok(CascadeState::Done(ClassificationResult::MultiLabel {
                    labels,
                    probabilities,
                    binary_abnormal_prob: p_abnormal,
                    risk_level,
                    degraded: ctx.classifier.is_degraded(),
                }))
            }
            done @ CascadeState::Done(_) => Ok(done),
        }
    }
}

/// Runs images through the cascade.
///
/// Holds only immutable models plus outcome counters, so one instance can be shared
/// across threads.
#[derive(Debug)]
pub struct CascadeOrchestrator {
    context: Arc<CascadeContext>,
    stats: StatsManager,
}

impl CascadeOrchestrator {
    pub fn new(context: Arc<CascadeContext>) -> Self {
        Self {
            context,
            stats: StatsManager::new(),
        }
    }

    pub fn context(&self) -> &CascadeContext {
        &self.context
    }

    pub fn stats(&self) -> CascadeStats {
        self.stats.snapshot()
    }

    /// Classifies an image file.
    pub fn classify(&self, path: &Path) -> ClassificationResult {
        let start = Instant::now();
        let result = match load_image(path, self.context.max_image_bytes) {
            Ok(image) => self.run(image),
            Err(e) => {
                tracing::warn!("Could not load {}: {}", path.display(), e);
                ClassificationResult::failed(&e)
            }
        };
        self.finish(result, start)
    }

    /// Classifies an already decoded image.
    pub fn classify_image(&self, image: &RgbImage) -> ClassificationResult {
        let start = Instant::now();
        let result = self.run(image.clone());
        self.finish(result, start)
    }

    fn finish(&self, result: ClassificationResult, start: Instant) -> ClassificationResult {
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!("Cascade finished as {} in {:.2} ms", result.kind(), elapsed_ms);
        self.stats.record(&result, elapsed_ms);
        result
    }

    fn run(&self, image: RgbImage) -> ClassificationResult {
        let mut state = CascadeState::Validating { image };
        loop {
            if let CascadeState::Done(result) = state {
                return result;
            }
            let stage = state.name();
            let stage_start = Instant::now();
            state = match state.step(&self.context) {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!("Cascade stage {} failed: {}", stage, e);
                    return ClassificationResult::failed(&e);
                }
            };
            tracing::debug!(
                "{} -> {} ({:.2} ms)",
                stage,
                state.name(),
                stage_start.elapsed().as_secs_f64() * 1000.0
            );
        }
    }
}
