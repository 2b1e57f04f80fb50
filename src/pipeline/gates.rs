//! The two whole-image gates in front of the digitizer.

use std::sync::Arc;

use image::RgbImage;

use crate::core::errors::EcgError;
use crate::core::traits::ImageScorer;

/// Decides whether an image is an ECG at all.
///
/// Scoring never fails: without a model every image gets `missing_confidence`, and a
/// scoring error yields `error_confidence`.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    scorer: Option<Arc<dyn ImageScorer>>,
    threshold: f32,
    missing_confidence: f32,
    error_confidence: f32,
}

impl ImageValidator {
    pub fn new(
        scorer: Option<Arc<dyn ImageScorer>>,
        threshold: f32,
        missing_confidence: f32,
        error_confidence: f32,
    ) -> Self {
        Self {
            scorer,
            threshold,
            missing_confidence,
            error_confidence,
        }
    }

    /// Probability that the image is an ECG.
    pub fn score(&self, image: &RgbImage) -> f32 {
        let Some(scorer) = &self.scorer else {
            return self.missing_confidence;
        };
        match scorer.score(image) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    "Validator '{}' failed, assuming confidence {}: {}",
                    scorer.name(),
                    self.error_confidence,
                    e
                );
                self.error_confidence
            }
        }
    }

    pub fn is_valid(&self, probability: f32) -> bool {
        probability >= self.threshold
    }

    pub fn has_model(&self) -> bool {
        self.scorer.is_some()
    }
}

/// Normal vs. abnormal screen.
#[derive(Debug, Clone)]
pub struct BinaryScreen {
    scorer: Arc<dyn ImageScorer>,
    abnormal_threshold: f32,
}

impl BinaryScreen {
    pub fn new(scorer: Arc<dyn ImageScorer>, abnormal_threshold: f32) -> Self {
        Self {
            scorer,
            abnormal_threshold,
        }
    }

    /// Probability that the ECG is abnormal.
    pub fn score(&self, image: &RgbImage) -> Result<f32, EcgError> {
        self.scorer.score(image)
    }

    /// Whether `p_abnormal` routes the image to the multi-label stage.
    pub fn is_abnormal(&self, p_abnormal: f32) -> bool {
        p_abnormal >= self.abnormal_threshold
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::errors::SimpleError;

    /// Scorer returning a fixed probability, or failing when given `None`.
    #[derive(Debug)]
    pub(crate) struct FixedScorer(pub Option<f32>);

    impl ImageScorer for FixedScorer {
        fn score(&self, _image: &RgbImage) -> Result<f32, EcgError> {
            self.0.ok_or_else(|| {
                EcgError::inference_error("fixed", "scorer failure", SimpleError::new("boom"))
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn image() -> RgbImage {
        RgbImage::new(4, 4)
    }

    #[test]
    fn test_validator_without_model_uses_missing_confidence() {
        let validator = ImageValidator::new(None, 0.5, 0.95, 0.90);
        assert_eq!(validator.score(&image()), 0.95);
        assert!(validator.is_valid(0.95));
        assert!(!validator.has_model());
    }

    #[test]
    fn test_validator_error_uses_error_confidence() {
        let validator = ImageValidator::new(Some(Arc::new(FixedScorer(None))), 0.5, 0.95, 0.90);
        assert_eq!(validator.score(&image()), 0.90);
    }

    #[test]
    fn test_validator_threshold_boundary() {
        let validator = ImageValidator::new(Some(Arc::new(FixedScorer(Some(0.5)))), 0.5, 0.95, 0.9);
        let p = validator.score(&image());
        assert!(validator.is_valid(p));
        assert!(!validator.is_valid(0.499));
    }

    #[test]
    fn test_binary_screen_propagates_errors() {
        let screen = BinaryScreen::new(Arc::new(FixedScorer(None)), 0.4);
        assert!(screen.score(&image()).is_err());

        let screen = BinaryScreen::new(Arc::new(FixedScorer(Some(0.35))), 0.4);
        let p = screen.score(&image()).unwrap();
        assert!(!screen.is_abnormal(p));
        assert!(screen.is_abnormal(0.4));
    }
}
