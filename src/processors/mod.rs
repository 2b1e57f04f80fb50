//! Image and signal processing primitives.
//!
//! * `normalization` - channel normalization into model input tensors
//! * `resize` - fixed-size resizing for the image models
//! * `threshold` - adaptive and fixed binarization
//! * `morphology` - openings with line structuring elements
//! * `resample` - 1-D resampling of lead profiles

pub mod morphology;
mod normalization;
pub mod resample;
pub mod resize;
pub mod threshold;

pub use morphology::{LineOrientation, line_mask, open_line, saturating_add, saturating_sub};
pub use normalization::NormalizeImage;
pub use resample::{resample_linear, truncate_or_interpolate};
pub use resize::resize_square;
pub use threshold::{adaptive_gaussian_threshold, ink_mask, mean_brightness, sigma_for_block};
