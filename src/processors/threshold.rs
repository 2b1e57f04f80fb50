//! Binarization of grayscale scans.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Gaussian sigma matching a square block of `block_size` pixels.
///
/// Uses the conventional `0.3 * ((k - 1) / 2 - 1) + 0.8` rule.
pub fn sigma_for_block(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Adaptive Gaussian binarization.
///
/// A pixel becomes foreground (255) iff it is brighter than the Gaussian-weighted
/// mean of its `block_size` neighbourhood minus `offset`. With a positive offset uniform
/// regions are foreground and only pixels darker than their surroundings drop out.
pub fn adaptive_gaussian_threshold(img: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(img, sigma_for_block(block_size).max(0.1));
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let value = img.get_pixel(x, y)[0] as f32;
        let mean = local_mean.get_pixel(x, y)[0] as f32;
        Luma([if value > mean - offset { 255 } else { 0 }])
    })
}

/// Inverse fixed-threshold binarization: ink (255) iff `luma <= threshold`.
pub fn ink_mask(img: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([if img.get_pixel(x, y)[0] <= threshold { 255 } else { 0 }])
    })
}

/// Mean brightness of an image, zero for an empty image.
pub fn mean_brightness(img: &GrayImage) -> f64 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    sum as f64 / count as f64
}
