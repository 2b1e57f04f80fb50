//! Recovery of per-lead waveforms from ECG images.
//!
//! [`LeadDigitizer`] turns a decoded image into a [`DigitizedSignal`] of exactly
//! `(target_length, lead_count)` samples. Two layouts are supported:
//!
//! * [`DigitizerMode::GridSubtraction`]: leads are stacked as horizontal bands. The
//!   printed grid is estimated with line openings and subtracted before each band is
//!   profiled column by column.
//! * [`DigitizerMode::CellTracing`]: leads are printed in a rows x cols grid of cells
//!   (6 x 2 by default). The trace in each cell is followed column by column and the
//!   cells are remapped to canonical lead order through a [`LeadPermutation`].
//!
//! ```rust
//! use ecg_cascade::digitizer::{DigitizerConfig, LeadDigitizer};
//! use image::RgbImage;
//!
//! let digitizer = LeadDigitizer::new(DigitizerConfig::default()).unwrap();
//! let signal = digitizer.digitize(&RgbImage::new(300, 240)).unwrap();
//! assert_eq!(signal.view().dim(), (1000, 12));
//! ```

mod cells;
mod grid;

pub use cells::LeadPermutation;

use image::RgbImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{DEFAULT_TARGET_LENGTH, LEAD_COUNT};
use crate::core::errors::DigitizationError;
use crate::domain::{DigitizedSignal, SignalNormalization};
use crate::processors::morphology::MAX_LINE_LENGTH;

/// How leads are laid out on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitizerMode {
    /// One horizontal band per lead, grid removed by morphology.
    #[default]
    GridSubtraction,
    /// A rows x cols grid of cells, one trace per cell.
    CellTracing,
}

impl DigitizerMode {
    /// Normalization applied when the configuration does not choose one.
    pub fn default_normalization(self) -> SignalNormalization {
        match self {
            DigitizerMode::GridSubtraction => SignalNormalization::WholeMatrix,
            DigitizerMode::CellTracing => SignalNormalization::PerLead,
        }
    }
}

/// Arrangement of lead regions on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadLayout {
    pub rows: usize,
    pub cols: usize,
}

impl LeadLayout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// One band per lead, stacked vertically.
    pub fn bands(leads: usize) -> Self {
        Self::new(leads, 1)
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Digitizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitizerConfig {
    pub mode: DigitizerMode,
    /// Samples per lead in the output.
    pub target_length: usize,
    pub lead_count: usize,
    /// Cell grid rows (cell tracing).
    pub rows: usize,
    /// Cell grid columns (cell tracing).
    pub cols: usize,
    /// Cell index to lead index table (cell tracing). Defaults to column-major order.
    pub permutation: Option<Vec<usize>>,
    /// Overrides the mode's default normalization.
    pub normalization: Option<SignalNormalization>,
    /// Luma at or below which a pixel is ink (cell tracing).
    pub ink_threshold: u8,
    /// Peak amplitude of a traced lead before normalization (cell tracing).
    pub amplitude: f32,
    /// Length of the line openings that estimate the printed grid (grid subtraction).
    pub grid_kernel: u32,
    /// Neighbourhood size of the adaptive threshold (grid subtraction).
    pub block_size: u32,
    /// Offset above the local mean a pixel needs to be foreground (grid subtraction).
    pub offset: f32,
    /// Sigma of the denoising blur (grid subtraction).
    pub blur_sigma: f32,
}

impl Default for DigitizerConfig {
    fn default() -> Self {
        Self {
            mode: DigitizerMode::default(),
            target_length: DEFAULT_TARGET_LENGTH,
            lead_count: LEAD_COUNT,
            rows: 6,
            cols: 2,
            permutation: None,
            normalization: None,
            ink_threshold: 120,
            amplitude: 1.5,
            grid_kernel: 25,
            block_size: 11,
            offset: 2.0,
            blur_sigma: 1.1,
        }
    }
}

impl DigitizerConfig {
    /// Effective normalization policy.
    pub fn normalization(&self) -> SignalNormalization {
        self.normalization
            .unwrap_or_else(|| self.mode.default_normalization())
    }

    /// Layout implied by the mode.
    pub fn layout(&self) -> LeadLayout {
        match self.mode {
            DigitizerMode::GridSubtraction => LeadLayout::bands(self.lead_count),
            DigitizerMode::CellTracing => LeadLayout::new(self.rows, self.cols),
        }
    }
}

impl ConfigValidator for DigitizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidConfig { message };

        if self.target_length < 2 {
            return Err(invalid(
                DigitizationError::InvalidTargetLength(self.target_length).to_string(),
            ));
        }
        self.validate_positive(self.lead_count, "digitizer.lead_count")?;
        if self.mode == DigitizerMode::CellTracing && self.rows * self.cols != self.lead_count {
            return Err(invalid(
                DigitizationError::InvalidLayout {
                    rows: self.rows,
                    cols: self.cols,
                    leads: self.lead_count,
                }
                .to_string(),
            ));
        }
        if let Some(table) = &self.permutation {
            LeadPermutation::new(table.clone(), self.lead_count)
                .map_err(|e| invalid(e.to_string()))?;
        }
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(invalid(format!(
                "digitizer.block_size must be odd and at least 3, got {}",
                self.block_size
            )));
        }
        self.validate_positive(self.grid_kernel as usize, "digitizer.grid_kernel")?;
        if self.grid_kernel > MAX_LINE_LENGTH {
            return Err(invalid(format!(
                "digitizer.grid_kernel must be at most {}, got {}",
                MAX_LINE_LENGTH, self.grid_kernel
            )));
        }
        if !(self.blur_sigma > 0.0 && self.blur_sigma.is_finite()) {
            return Err(invalid(format!(
                "digitizer.blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if !self.amplitude.is_finite() || !self.offset.is_finite() {
            return Err(invalid(
                "digitizer.amplitude and digitizer.offset must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Converts ECG images into fixed-shape lead signals.
#[derive(Debug, Clone)]
pub struct LeadDigitizer {
    config: DigitizerConfig,
    permutation: LeadPermutation,
    normalization: SignalNormalization,
}

impl LeadDigitizer {
    /// Creates a digitizer, checking the target length, layout and permutation table.
    pub fn new(config: DigitizerConfig) -> Result<Self, DigitizationError> {
        if config.target_length < 2 {
            return Err(DigitizationError::InvalidTargetLength(config.target_length));
        }
        let permutation = match &config.permutation {
            Some(table) => LeadPermutation::new(table.clone(), config.lead_count)?,
            None => LeadPermutation::column_major(config.rows, config.cols),
        };
        if config.mode == DigitizerMode::CellTracing && permutation.len() != config.lead_count {
            return Err(DigitizationError::InvalidLayout {
                rows: config.rows,
                cols: config.cols,
                leads: config.lead_count,
            });
        }
        let normalization = config.normalization();
        Ok(Self {
            config,
            permutation,
            normalization,
        })
    }

    pub fn config(&self) -> &DigitizerConfig {
        &self.config
    }

    pub fn mode(&self) -> DigitizerMode {
        self.config.mode
    }

    /// Digitizes with the configured layout.
    pub fn digitize(&self, image: &RgbImage) -> Result<DigitizedSignal, DigitizationError> {
        self.digitize_with_layout(image, self.config.layout())
    }

    /// Digitizes with an explicit layout.
    ///
    /// The layout must hold exactly one region per lead. In cell tracing mode a layout
    /// other than the configured one uses column-major lead order.
    pub fn digitize_with_layout(
        &self,
        image: &RgbImage,
        layout: LeadLayout,
    ) -> Result<DigitizedSignal, DigitizationError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DigitizationError::EmptyImage { width, height });
        }
        let leads = self.config.lead_count;
        if layout.cell_count() != leads {
            return Err(DigitizationError::InvalidLayout {
                rows: layout.rows,
                cols: layout.cols,
                leads,
            });
        }

        let mut data: Array2<f32> = match self.config.mode {
            DigitizerMode::GridSubtraction => {
                if layout.cols != 1 {
                    return Err(DigitizationError::InvalidLayout {
                        rows: layout.rows,
                        cols: layout.cols,
                        leads,
                    });
                }
                grid::digitize_bands(image, &self.config)?
            }
            DigitizerMode::CellTracing => {
                let configured = self.config.layout();
                let custom;
                let permutation = if layout == configured {
                    &self.permutation
                } else {
                    custom = LeadPermutation::column_major(layout.rows, layout.cols);
                    &custom
                };
                cells::digitize_cells(image, layout, permutation, &self.config)?
            }
        };

        self.normalization.apply(&mut data);
        Ok(DigitizedSignal::from_digitized(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn cell_config() -> DigitizerConfig {
        DigitizerConfig {
            mode: DigitizerMode::CellTracing,
            ..Default::default()
        }
    }

    #[test]
    fn test_shape_is_fixed_for_any_resolution() {
        for mode in [DigitizerMode::GridSubtraction, DigitizerMode::CellTracing] {
            let digitizer = LeadDigitizer::new(DigitizerConfig {
                mode,
                target_length: 250,
                ..Default::default()
            })
            .unwrap();
            for (w, h) in [(24, 12), (100, 60), (640, 480), (1500, 1200)] {
                let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
                for x in 0..w {
                    img.put_pixel(x, (x * 7) % h, Rgb([0, 0, 0]));
                }
                let signal = digitizer.digitize(&img).unwrap();
                assert_eq!(signal.view().dim(), (250, 12), "{:?} {}x{}", mode, w, h);
                assert!(signal.view().iter().all(|v| v.is_finite()));
            }
        }
    }

    #[test]
    fn test_all_black_grid_mode_is_zero() {
        let digitizer = LeadDigitizer::new(DigitizerConfig::default()).unwrap();
        let img = RgbImage::new(400, 360);
        let signal = digitizer.digitize(&img).unwrap();
        assert_eq!(signal.view().dim(), (1000, 12));
        assert!(signal.view().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let digitizer = LeadDigitizer::new(DigitizerConfig::default()).unwrap();
        let err = digitizer.digitize(&RgbImage::new(0, 10)).unwrap_err();
        assert_eq!(err, DigitizationError::EmptyImage { width: 0, height: 10 });
    }

    #[test]
    fn test_image_smaller_than_grid_is_degenerate() {
        let digitizer = LeadDigitizer::new(cell_config()).unwrap();
        let err = digitizer.digitize(&RgbImage::new(1, 40)).unwrap_err();
        assert!(matches!(err, DigitizationError::DegenerateCell { .. }));

        let digitizer = LeadDigitizer::new(DigitizerConfig::default()).unwrap();
        let err = digitizer.digitize(&RgbImage::new(40, 5)).unwrap_err();
        assert!(matches!(err, DigitizationError::DegenerateCell { .. }));
    }

    #[test]
    fn test_layout_must_match_lead_count() {
        let digitizer = LeadDigitizer::new(cell_config()).unwrap();
        let err = digitizer
            .digitize_with_layout(&RgbImage::new(100, 100), LeadLayout::new(5, 2))
            .unwrap_err();
        assert!(matches!(err, DigitizationError::InvalidLayout { .. }));

        let signal = digitizer
            .digitize_with_layout(&RgbImage::new(120, 120), LeadLayout::new(4, 3))
            .unwrap();
        assert_eq!(signal.lead_count(), 12);
    }

    #[test]
    fn test_new_rejects_bad_permutation_and_length() {
        let bad = DigitizerConfig {
            permutation: Some(vec![0; 12]),
            ..cell_config()
        };
        assert!(matches!(
            LeadDigitizer::new(bad),
            Err(DigitizationError::InvalidPermutation { .. })
        ));
        let short = DigitizerConfig {
            target_length: 1,
            ..Default::default()
        };
        assert_eq!(
            LeadDigitizer::new(short).unwrap_err(),
            DigitizationError::InvalidTargetLength(1)
        );
    }

    #[test]
    fn test_default_normalization_per_mode() {
        assert_eq!(
            DigitizerConfig::default().normalization(),
            SignalNormalization::WholeMatrix
        );
        assert_eq!(cell_config().normalization(), SignalNormalization::PerLead);
        let overridden = DigitizerConfig {
            normalization: Some(SignalNormalization::None),
            ..cell_config()
        };
        assert_eq!(overridden.normalization(), SignalNormalization::None);
    }

    #[test]
    fn test_config_validation() {
        assert!(DigitizerConfig::default().validate().is_ok());
        let even_block = DigitizerConfig {
            block_size: 10,
            ..Default::default()
        };
        assert!(even_block.validate().is_err());
        let bad_layout = DigitizerConfig {
            rows: 5,
            ..cell_config()
        };
        assert!(bad_layout.validate().is_err());
        let long_kernel = DigitizerConfig {
            grid_kernel: 600,
            ..Default::default()
        };
        assert!(long_kernel.validate().is_err());
    }
}
