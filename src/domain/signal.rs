//! Digitized lead signals.
//!
//! A [`DigitizedSignal`] is a dense `(T, L)` matrix: `T` samples for each of `L`
//! leads, leads in canonical physiological order. The shape is fixed by configuration
//! and never depends on the resolution of the source image.

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut, Axis, Dimension};
use serde::{Deserialize, Serialize};

use crate::core::errors::EcgError;

/// Epsilon added to the standard deviation when normalizing the whole matrix.
pub const MATRIX_NORMALIZATION_EPS: f64 = 1e-6;

/// Epsilon added to the standard deviation when normalizing each lead.
pub const LEAD_NORMALIZATION_EPS: f64 = 1e-8;

/// How a digitized matrix is standardized before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalNormalization {
    /// Zero mean and unit variance over all samples of all leads.
    WholeMatrix,
    /// Zero mean and unit variance within each lead.
    PerLead,
    /// Leave values as digitized.
    None,
}

impl SignalNormalization {
    /// Applies the policy to a `(T, L)` matrix in place.
    pub fn apply(self, data: &mut Array2<f32>) {
        match self {
            SignalNormalization::WholeMatrix => standardize(data.view_mut(), MATRIX_NORMALIZATION_EPS),
            SignalNormalization::PerLead => {
                for lead in data.axis_iter_mut(Axis(1)) {
                    standardize(lead, LEAD_NORMALIZATION_EPS);
                }
            }
            SignalNormalization::None => {}
        }
    }
}

/// Standardizes values to zero mean and unit (population) variance.
///
/// Statistics are accumulated in `f64`. A constant input maps to zeros.
fn standardize<D: Dimension>(mut values: ArrayViewMut<'_, f32, D>, eps: f64) {
    let count = values.len();
    if count == 0 {
        return;
    }
    let mean = values.fold(0.0f64, |acc, &v| acc + v as f64) / count as f64;
    let var = values.fold(0.0f64, |acc, &v| {
        let d = v as f64 - mean;
        acc + d * d
    }) / count as f64;
    let denom = var.sqrt() + eps;
    values.mapv_inplace(|v| ((v as f64 - mean) / denom) as f32);
}

/// A fixed-shape `(T, L)` waveform matrix recovered from an ECG image.
///
/// The matrix is read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitizedSignal {
    data: Array2<f32>,
}

impl DigitizedSignal {
    /// Wraps a matrix after checking it is exactly `(samples, leads)`.
    ///
    /// Non-finite values are replaced by zero.
    pub fn from_array(
        mut data: Array2<f32>,
        samples: usize,
        leads: usize,
    ) -> Result<Self, EcgError> {
        if data.dim() != (samples, leads) {
            return Err(EcgError::shape_mismatch(
                "DigitizedSignal",
                &[samples, leads],
                data.shape(),
            ));
        }
        data.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });
        Ok(Self { data })
    }

    /// Wraps a matrix whose shape the caller already guarantees.
    pub(crate) fn from_digitized(mut data: Array2<f32>) -> Self {
        data.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });
        Self { data }
    }

    /// Number of samples per lead (`T`).
    pub fn samples(&self) -> usize {
        self.data.nrows()
    }

    /// Number of leads (`L`).
    pub fn lead_count(&self) -> usize {
        self.data.ncols()
    }

    /// Read-only view of the `(T, L)` matrix.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Samples of one lead.
    pub fn lead(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.column(index)
    }

    /// Smallest and largest sample value.
    pub fn range(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_array_rejects_wrong_shape() {
        let err = DigitizedSignal::from_array(Array2::zeros((10, 11)), 10, 12).unwrap_err();
        assert!(matches!(err, EcgError::InvalidInput { .. }));
    }

    #[test]
    fn test_from_array_replaces_non_finite() {
        let data = array![[f32::NAN, 1.0], [f32::INFINITY, -2.0]];
        let signal = DigitizedSignal::from_array(data, 2, 2).unwrap();
        assert_eq!(signal.view(), array![[0.0, 1.0], [0.0, -2.0]].view());
    }

    #[test]
    fn test_whole_matrix_normalization_of_zero_matrix_is_zero() {
        let mut data = Array2::<f32>::zeros((100, 12));
        SignalNormalization::WholeMatrix.apply(&mut data);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_constant_matrix_normalizes_to_exact_zero() {
        let level = 255.0 * 20.0 / (255.0 * 20.0 + 1e-6f32);
        let mut data = Array2::<f32>::from_elem((1000, 12), level);
        SignalNormalization::WholeMatrix.apply(&mut data);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_none_leaves_values() {
        let mut data = array![[1.0f32, 2.0], [3.0, 4.0]];
        SignalNormalization::None.apply(&mut data);
        assert_eq!(data, array![[1.0f32, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_whole_matrix_normalization_moments() {
        let mut data = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
        SignalNormalization::WholeMatrix.apply(&mut data);
        let mean: f32 = data.iter().sum::<f32>() / 6.0;
        let var: f32 = data.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / 6.0;
        assert!(mean.abs() < 1e-6);
        assert!((var - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_per_lead_normalization_is_independent() {
        let mut data = array![[0.0f32, 10.0], [2.0, 10.0], [4.0, 10.0]];
        SignalNormalization::PerLead.apply(&mut data);
        let lead0 = data.column(0);
        assert!((lead0[0] + lead0[2]).abs() < 1e-6);
        assert!(lead0[1].abs() < 1e-6);
        // A constant lead collapses to zero rather than dividing by zero.
        assert!(data.column(1).iter().all(|&v| v == 0.0));
    }
}
