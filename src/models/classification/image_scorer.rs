//! ONNX image scorer.
//!
//! Resizes to a square input, applies ImageNet normalization, runs the model and turns
//! its logit into a probability.

use crate::core::config::OrtSessionConfig;
use crate::core::constants::{DEFAULT_INPUT_SIZE, IMAGENET_MEAN, IMAGENET_STD};
use crate::core::errors::{EcgError, SimpleError};
use crate::core::inference::OrtInfer;
use crate::core::tensor::{Tensor2D, Tensor4D};
use crate::core::traits::ImageScorer;
use crate::domain::sigmoid;
use crate::processors::{NormalizeImage, resize_square};
use image::RgbImage;

/// Preprocessing settings for an image scorer.
#[derive(Debug, Clone)]
pub struct ScorerPreprocessConfig {
    /// Side length of the square model input
    pub input_size: u32,
    /// Scaling factor applied before normalization
    pub normalize_scale: f32,
    /// Mean values for normalization (RGB order)
    pub normalize_mean: [f32; 3],
    /// Standard deviation values for normalization (RGB order)
    pub normalize_std: [f32; 3],
}

impl Default for ScorerPreprocessConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            normalize_scale: 1.0 / 255.0,
            normalize_mean: IMAGENET_MEAN,
            normalize_std: IMAGENET_STD,
        }
    }
}

/// A whole-image model returning one probability per image.
#[derive(Debug)]
pub struct OnnxImageScorer {
    name: String,
    inference: OrtInfer,
    normalizer: NormalizeImage,
    input_size: u32,
}

impl OnnxImageScorer {
    /// Resizes and normalizes an image into a batch of one.
    pub fn preprocess(&self, image: &RgbImage) -> Result<Tensor4D, EcgError> {
        let resized = resize_square(image, self.input_size);
        self.normalizer.normalize_to(&resized)
    }

    /// Runs the model on a preprocessed batch.
    pub fn infer(&self, batch_tensor: &Tensor4D) -> Result<Tensor2D, EcgError> {
        self.inference
            .infer_2d(batch_tensor)
            .map_err(|e| EcgError::Inference {
                model_name: self.name.clone(),
                context: format!(
                    "failed to run inference on batch with shape {:?}",
                    batch_tensor.shape()
                ),
                source: Box::new(e),
            })
    }

    /// Converts model output into a probability.
    pub fn postprocess(&self, predictions: &Tensor2D) -> Result<f32, EcgError> {
        scores_to_probability(&self.name, predictions)
    }
}

/// Reads the first row of model output as a probability.
///
/// A single column is a logit. Two columns are normal/abnormal logits and are
/// softmaxed.
fn scores_to_probability(model_name: &str, predictions: &Tensor2D) -> Result<f32, EcgError> {
    let row = predictions.rows().into_iter().next().ok_or_else(|| {
        EcgError::post_processing(
            &format!("model '{}' returned no rows", model_name),
            SimpleError::new("empty output"),
        )
    })?;
    let probability = match row.len() {
        1 => sigmoid(row[0]),
        2 => sigmoid(row[1] - row[0]),
        n => return Err(EcgError::shape_mismatch(model_name, &[1, 1], &[1, n])),
    };
    if !probability.is_finite() {
        return Err(EcgError::post_processing(
            &format!("model '{}' produced a non-finite score", model_name),
            SimpleError::new("NaN logit"),
        ));
    }
    Ok(probability)
}

impl ImageScorer for OnnxImageScorer {
    fn score(&self, image: &RgbImage) -> Result<f32, EcgError> {
        let batch_tensor = self.preprocess(image)?;
        let predictions = self.infer(&batch_tensor)?;
        self.postprocess(&predictions)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`OnnxImageScorer`].
#[derive(Debug)]
pub struct OnnxImageScorerBuilder {
    name: String,
    session_pool_size: usize,
    preprocess_config: ScorerPreprocessConfig,
    ort_config: Option<OrtSessionConfig>,
}

impl OnnxImageScorerBuilder {
    /// Creates a builder for a scorer reported under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session_pool_size: 1,
            preprocess_config: ScorerPreprocessConfig::default(),
            ort_config: None,
        }
    }

    /// Sets the session pool size for ONNX Runtime.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = size;
        self
    }

    /// Sets the square input size.
    pub fn input_size(mut self, size: u32) -> Self {
        self.preprocess_config.input_size = size;
        self
    }

    /// Sets the preprocessing configuration.
    pub fn preprocess_config(mut self, config: ScorerPreprocessConfig) -> Self {
        self.preprocess_config = config;
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_config(mut self, config: Option<OrtSessionConfig>) -> Self {
        self.ort_config = config;
        self
    }

    /// Loads the model and builds the scorer.
    pub fn build(self, model_path: &std::path::Path) -> Result<OnnxImageScorer, EcgError> {
        let inference = OrtInfer::from_config(
            model_path,
            self.ort_config.as_ref(),
            self.session_pool_size,
            None,
        )?;

        let normalizer = NormalizeImage::new(
            Some(self.preprocess_config.normalize_scale),
            Some(self.preprocess_config.normalize_mean),
            Some(self.preprocess_config.normalize_std),
        )?;

        Ok(OnnxImageScorer {
            name: self.name,
            inference,
            normalizer,
            input_size: self.preprocess_config.input_size,
        })
    }
}
