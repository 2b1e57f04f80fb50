//! Morphological operations with line structuring elements.

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_open};

/// Longest line `imageproc` accepts as a mask.
pub const MAX_LINE_LENGTH: u32 = 511;

/// Orientation of a line structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrientation {
    Horizontal,
    Vertical,
}

/// A centered line mask of `length` pixels, clamped to `1..=MAX_LINE_LENGTH`.
pub fn line_mask(length: u32, orientation: LineOrientation) -> Mask {
    let length = length.clamp(1, MAX_LINE_LENGTH);
    let center = ((length - 1) / 2) as u8;
    match orientation {
        LineOrientation::Horizontal => {
            Mask::from_image(&GrayImage::from_pixel(length, 1, Luma([255])), center, 0)
        }
        LineOrientation::Vertical => {
            Mask::from_image(&GrayImage::from_pixel(1, length, Luma([255])), 0, center)
        }
    }
}

/// Erosion followed by dilation with a line of `length` pixels.
///
/// Keeps only runs of foreground at least `length` pixels long in the given direction.
pub fn open_line(img: &GrayImage, length: u32, orientation: LineOrientation) -> GrayImage {
    grayscale_open(img, &line_mask(length, orientation))
}

/// Pixel-wise saturating sum.
pub fn saturating_add(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0].saturating_add(b.get_pixel(x, y)[0])])
    })
}

/// Pixel-wise saturating difference `a - b`.
pub fn saturating_sub(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0].saturating_sub(b.get_pixel(x, y)[0])])
    })
}
