//! Resizing for the fixed-size image models.

use image::RgbImage;
use image::imageops::{self, FilterType};

/// Resizes to a `size x size` square with bilinear filtering, ignoring aspect ratio.
pub fn resize_square(img: &RgbImage, size: u32) -> RgbImage {
    if img.dimensions() == (size, size) {
        return img.clone();
    }
    imageops::resize(img, size, size, FilterType::Triangle)
}
