//! Cell-grid digitization by trace following.

use image::{GrayImage, RgbImage, imageops};
use ndarray::Array2;

use super::{DigitizerConfig, LeadLayout};
use crate::core::errors::DigitizationError;
use crate::processors::{ink_mask, truncate_or_interpolate};

/// Added to the peak magnitude before scaling a traced lead.
const TRACE_EPS: f32 = 1e-8;

/// A bijection from cell index (row-major over the printed grid) to lead index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadPermutation {
    cell_to_lead: Vec<usize>,
}

impl LeadPermutation {
    /// Validates that `table` maps `0..leads` onto itself one-to-one.
    pub fn new(table: Vec<usize>, leads: usize) -> Result<Self, DigitizationError> {
        let mut seen = vec![false; leads];
        let valid = table.len() == leads
            && table.iter().all(|&lead| {
                lead < leads && !std::mem::replace(&mut seen[lead], true)
            });
        if !valid {
            return Err(DigitizationError::InvalidPermutation { table, leads });
        }
        Ok(Self {
            cell_to_lead: table,
        })
    }

    pub fn identity(leads: usize) -> Self {
        Self {
            cell_to_lead: (0..leads).collect(),
        }
    }

    /// Leads run down each column first: the cell at `(row, col)` holds lead
    /// `col * rows + row`. For a 6 x 2 print this puts I..aVF on the left and V1..V6
    /// on the right.
    pub fn column_major(rows: usize, cols: usize) -> Self {
        let cell_to_lead = (0..rows * cols)
            .map(|cell| (cell % cols) * rows + cell / cols)
            .collect();
        Self { cell_to_lead }
    }

    /// Lead index printed in a cell.
    pub fn lead_for_cell(&self, cell: usize) -> usize {
        self.cell_to_lead[cell]
    }

    /// The lead to cell mapping.
    pub fn inverse(&self) -> Self {
        let mut lead_to_cell = vec![0; self.cell_to_lead.len()];
        for (cell, &lead) in self.cell_to_lead.iter().enumerate() {
            lead_to_cell[lead] = cell;
        }
        Self {
            cell_to_lead: lead_to_cell,
        }
    }

    /// Applies `self` and then `next`.
    pub fn then(&self, next: &LeadPermutation) -> Self {
        Self {
            cell_to_lead: self
                .cell_to_lead
                .iter()
                .map(|&i| next.cell_to_lead[i])
                .collect(),
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.cell_to_lead
    }

    pub fn len(&self) -> usize {
        self.cell_to_lead.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_to_lead.is_empty()
    }
}

/// Digitizes a rows x cols grid of cells into an un-normalized `(T, L)` matrix.
pub(super) fn digitize_cells(
    image: &RgbImage,
    layout: LeadLayout,
    permutation: &LeadPermutation,
    config: &DigitizerConfig,
) -> Result<Array2<f32>, DigitizationError> {
    let (width, height) = image.dimensions();
    let cell_height = height / layout.rows as u32;
    let cell_width = width / layout.cols as u32;
    if cell_height == 0 || cell_width == 0 {
        return Err(DigitizationError::DegenerateCell {
            index: 0,
            width: cell_width,
            height: cell_height,
            rows: layout.rows,
            cols: layout.cols,
        });
    }

    let gray = imageops::grayscale(image);
    let target = config.target_length;
    let mut data = Array2::<f32>::zeros((target, layout.cell_count()));

    for cell in 0..layout.cell_count() {
        let row = (cell / layout.cols) as u32;
        let col = (cell % layout.cols) as u32;
        let region = imageops::crop_imm(
            &gray,
            col * cell_width,
            row * cell_height,
            cell_width,
            cell_height,
        )
        .to_image();

        let waveform = trace_cell(&region, config.ink_threshold, config.amplitude);
        let samples = truncate_or_interpolate(&waveform, target);
        let lead = permutation.lead_for_cell(cell);
        for (t, value) in samples.into_iter().enumerate() {
            data[[t, lead]] = value;
        }
    }
    Ok(data)
}

/// Follows the ink trace in one cell, one value per pixel column.
fn trace_cell(cell: &GrayImage, ink_threshold: u8, amplitude: f32) -> Vec<f32> {
    let mask = ink_mask(cell, ink_threshold);
    let (width, height) = mask.dimensions();

    let mut ys = Vec::with_capacity(width as usize);
    let mut previous = height as f32 / 2.0;
    for x in 0..width {
        let (count, sum) = (0..height)
            .filter(|&y| mask.get_pixel(x, y)[0] > 0)
            .fold((0u32, 0u64), |(n, s), y| (n + 1, s + y as u64));
        if count > 0 {
            previous = sum as f32 / count as f32;
        }
        ys.push(previous);
    }

    let mut waveform: Vec<f32> = ys.iter().map(|y| height as f32 - y).collect();
    let mean = waveform.iter().sum::<f32>() / waveform.len().max(1) as f32;
    for v in &mut waveform {
        *v -= mean;
    }
    let peak = waveform.iter().fold(0.0f32, |m, v| m.max(v.abs())) + TRACE_EPS;
    for v in &mut waveform {
        *v = amplitude * (*v / peak);
    }
    waveform
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_default_permutation_table() {
        let p = LeadPermutation::column_major(6, 2);
        assert_eq!(p.as_slice(), &[0, 6, 1, 7, 2, 8, 3, 9, 4, 10, 5, 11]);
    }

    #[test]
    fn test_permutation_composed_with_inverse_is_identity() {
        for p in [
            LeadPermutation::column_major(6, 2),
            LeadPermutation::column_major(3, 4),
            LeadPermutation::new(vec![3, 0, 2, 1], 4).unwrap(),
        ] {
            let n = p.len();
            assert_eq!(p.then(&p.inverse()), LeadPermutation::identity(n));
            assert_eq!(p.inverse().then(&p), LeadPermutation::identity(n));
        }
    }

    #[test]
    fn test_permutation_rejects_non_bijection() {
        assert!(LeadPermutation::new(vec![0, 1, 1], 3).is_err());
        assert!(LeadPermutation::new(vec![0, 1, 3], 3).is_err());
        assert!(LeadPermutation::new(vec![0, 1], 3).is_err());
        assert!(LeadPermutation::new(vec![2, 0, 1], 3).is_ok());
    }

    #[test]
    fn test_trace_cell_follows_ink_and_carries_forward() {
        let mut cell = GrayImage::from_pixel(4, 10, Luma([255]));
        cell.put_pixel(0, 2, Luma([0]));
        cell.put_pixel(2, 8, Luma([0]));
        let wf = trace_cell(&cell, 120, 1.5);
        // Heights before centring: 8, 8 (carried), 2, 2 (carried).
        assert_eq!(wf.len(), 4);
        assert!((wf[0] - 1.5).abs() < 1e-5);
        assert!((wf[1] - 1.5).abs() < 1e-5);
        assert!((wf[2] + 1.5).abs() < 1e-5);
        assert!((wf[3] + 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_blank_cell_is_flat() {
        let cell = GrayImage::from_pixel(5, 6, Luma([255]));
        assert!(trace_cell(&cell, 120, 1.5).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_cells_are_remapped_to_lead_order() {
        // Ink only in the top-right cell, which holds V1 (lead 6).
        let config = DigitizerConfig {
            target_length: 20,
            ..Default::default()
        };
        let mut img = RgbImage::from_pixel(40, 60, Rgb([255, 255, 255]));
        for x in 20..40 {
            let y = if x < 30 { 1 } else { 8 };
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
        let data = digitize_cells(
            &img,
            LeadLayout::new(6, 2),
            &LeadPermutation::column_major(6, 2),
            &config,
        )
        .unwrap();
        assert!(data.column(6).iter().any(|&v| v != 0.0));
        for lead in (0..12).filter(|&l| l != 6) {
            assert!(data.column(lead).iter().all(|&v| v == 0.0), "lead {}", lead);
        }
    }
}
