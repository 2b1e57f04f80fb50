//! Band digitization with grid subtraction.

use image::RgbImage;
use image::imageops;
use imageproc::filter::gaussian_blur_f32;
use ndarray::Array2;

use super::DigitizerConfig;
use crate::core::errors::DigitizationError;
use crate::processors::{
    LineOrientation, adaptive_gaussian_threshold, mean_brightness, open_line, resample_linear,
    saturating_add, saturating_sub,
};

/// Added to the profile maximum before rescaling.
const PROFILE_EPS: f32 = 1e-6;

/// Scans brighter than this on average are dark ink on light paper.
const INVERT_ABOVE: f64 = 127.0;

/// Digitizes `lead_count` vertically stacked bands into an un-normalized `(T, L)` matrix.
pub(super) fn digitize_bands(
    image: &RgbImage,
    config: &DigitizerConfig,
) -> Result<Array2<f32>, DigitizationError> {
    let (width, height) = image.dimensions();
    let leads = config.lead_count;
    let band_height = height / leads as u32;
    if band_height == 0 {
        return Err(DigitizationError::DegenerateCell {
            index: 0,
            width,
            height: band_height,
            rows: leads,
            cols: 1,
        });
    }

    let gray = imageops::grayscale(image);
    let mut blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    if mean_brightness(&blurred) > INVERT_ABOVE {
        imageops::invert(&mut blurred);
    }

    let binary = adaptive_gaussian_threshold(&blurred, config.block_size, config.offset);
    let horizontal = open_line(&binary, config.grid_kernel, LineOrientation::Horizontal);
    let vertical = open_line(&binary, config.grid_kernel, LineOrientation::Vertical);
    let grid = saturating_add(&horizontal, &vertical);
    let trace = saturating_sub(&binary, &grid);

    let target = config.target_length;
    let mut data = Array2::<f32>::zeros((target, leads));
    for lead in 0..leads {
        let top = lead as u32 * band_height;
        // Inverted intensity: columns crossed by the trace dip below the blank level.
        let profile: Vec<f32> = (0..width)
            .map(|x| {
                (top..top + band_height)
                    .map(|y| (255 - trace.get_pixel(x, y)[0]) as f32 / 255.0)
                    .sum()
            })
            .collect();

        let max = profile.iter().copied().fold(0.0f32, f32::max);
        if max <= 0.0 {
            tracing::debug!("Lead {} has an empty trace band, emitting zeros", lead);
            continue;
        }
        let scaled: Vec<f32> = profile.iter().map(|v| v / (max + PROFILE_EPS)).collect();
        let samples = resample_linear(&scaled, target, width as f64);
        for (t, value) in samples.into_iter().enumerate() {
            data[[t, lead]] = value;
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn config() -> DigitizerConfig {
        DigitizerConfig {
            target_length: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_long_grid_lines_are_removed() {
        let mut horizontal = RgbImage::from_pixel(240, 240, Rgb([250, 250, 250]));
        for x in 0..240 {
            horizontal.put_pixel(x, 70, Rgb([0, 0, 0]));
        }
        let mut vertical = RgbImage::from_pixel(240, 240, Rgb([250, 250, 250]));
        for y in 0..240 {
            vertical.put_pixel(150, y, Rgb([0, 0, 0]));
        }
        for img in [horizontal, vertical] {
            let data = digitize_bands(&img, &config()).unwrap();
            assert_eq!(data.dim(), (100, 12));
            // Nothing is left of the trace, so every band sits at its blank level.
            let blank = data[[0, 0]];
            assert!(blank > 0.99 && blank <= 1.0);
            assert!(data.iter().all(|&v| v == blank));
        }
    }

    #[test]
    fn test_trace_columns_dip_below_blank_columns() {
        // A short dark stroke in the middle of the first band only.
        let mut img = RgbImage::from_pixel(240, 240, Rgb([255, 255, 255]));
        for x in 100..110 {
            img.put_pixel(x, 10, Rgb([0, 0, 0]));
        }
        let cfg = DigitizerConfig {
            target_length: 240,
            ..Default::default()
        };
        let data = digitize_bands(&img, &cfg).unwrap();
        let first = data.column(0);
        let peak = first.iter().copied().fold(f32::MIN, f32::max);
        assert!(peak > 0.99 && peak <= 1.0);
        assert_eq!(first[0], peak);
        assert!(first[0] > first[105]);

        let last = data.column(11);
        assert!(last.iter().all(|&v| v == last[0]));
    }
}
