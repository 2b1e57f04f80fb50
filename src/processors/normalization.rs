//! Image normalization for the whole-image models.
//!
//! Pixels are mapped channel-wise as `x * alpha + beta` with `alpha = scale / std` and
//! `beta = -mean / std`, which folds scaling and standardization into one pass.

use crate::core::constants::{IMAGENET_MEAN, IMAGENET_STD};
use crate::core::errors::EcgError;
use crate::core::tensor::Tensor4D;
use image::RgbImage;

/// Normalizes RGB images into `(1, 3, H, W)` model input tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std)
    pub beta: [f32; 3],
}

impl NormalizeImage {
    /// Creates a new NormalizeImage instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Optional scaling factor (defaults to 1.0/255.0)
    /// * `mean` - Optional mean values for each channel (defaults to ImageNet)
    /// * `std` - Optional standard deviation values for each channel (defaults to ImageNet)
    ///
    /// # Errors
    ///
    /// Returns an error if the scale or any standard deviation is not positive.
    pub fn new(
        scale: Option<f32>,
        mean: Option<[f32; 3]>,
        std: Option<[f32; 3]>,
    ) -> Result<Self, EcgError> {
        let scale = scale.unwrap_or(1.0 / 255.0);
        let mean = mean.unwrap_or(IMAGENET_MEAN);
        let std = std.unwrap_or(IMAGENET_STD);

        if scale <= 0.0 {
            return Err(EcgError::config_error("Scale must be greater than 0"));
        }

        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(EcgError::config_error(format!(
                    "Standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let alpha = std.map(|s| scale / s);
        let beta = [0, 1, 2].map(|c| -mean[c] / std[c]);

        Ok(Self { alpha, beta })
    }

    /// ImageNet statistics, 1/255 scaling, CHW layout.
    pub fn imagenet() -> Self {
        Self {
            alpha: IMAGENET_STD.map(|s| (1.0 / 255.0) / s),
            beta: [0, 1, 2].map(|c| -IMAGENET_MEAN[c] / IMAGENET_STD[c]),
        }
    }

    /// Normalizes a single image and returns it as a batch of one.
    pub fn normalize_to(&self, img: &RgbImage) -> Result<Tensor4D, EcgError> {
        let (width, height) = img.dimensions();
        let (w, h) = (width as usize, height as usize);

        let mut tensor = Tensor4D::zeros((1, 3, h, w));

        for (x, y, pixel) in img.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                tensor[[0, c, y, x]] = pixel[c] as f32 * self.alpha[c] + self.beta[c];
            }
        }

        if tensor.iter().any(|v| !v.is_finite()) {
            return Err(EcgError::normalization(
                "normalized tensor contains non-finite values",
                crate::core::errors::SimpleError::new("check mean/std configuration"),
            ));
        }
        Ok(tensor)
    }
}
