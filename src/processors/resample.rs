//! One-dimensional resampling of lead profiles.

/// Piecewise-linear resampling to exactly `target` points.
///
/// Sample `k` is read at position `k * span / (target - 1)` on the index axis of
/// `values`; positions past the last sample take the last value. An empty input yields
/// zeros.
pub fn resample_linear(values: &[f32], target: usize, span: f64) -> Vec<f32> {
    if values.is_empty() {
        return vec![0.0; target];
    }
    if target == 1 {
        return vec![values[0]];
    }
    let last = values.len() - 1;
    (0..target)
        .map(|k| {
            let pos = (k as f64 * span / (target - 1) as f64).max(0.0);
            let i0 = pos.floor() as usize;
            if i0 >= last {
                return values[last];
            }
            let frac = (pos - i0 as f64) as f32;
            values[i0] + (values[i0 + 1] - values[i0]) * frac
        })
        .collect()
}

/// Keeps the first `target` samples when there are enough, otherwise interpolates
/// linearly across the whole input.
pub fn truncate_or_interpolate(values: &[f32], target: usize) -> Vec<f32> {
    if values.len() >= target {
        values[..target].to_vec()
    } else {
        let span = values.len().saturating_sub(1) as f64;
        resample_linear(values, target, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_linear_endpoints() {
        let out = resample_linear(&[0.0, 1.0, 2.0], 5, 2.0);
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_resample_linear_clamps_past_end() {
        // Span equal to the width reads one position past the last sample.
        let out = resample_linear(&[0.0, 1.0], 3, 2.0);
        assert_eq!(out, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_resample_empty_and_single() {
        assert_eq!(resample_linear(&[], 4, 0.0), vec![0.0; 4]);
        assert_eq!(resample_linear(&[3.0], 3, 0.0), vec![3.0; 3]);
    }

    #[test]
    fn test_truncate_or_interpolate() {
        let long: Vec<f32> = (0..10).map(|v| v as f32).collect();
        assert_eq!(truncate_or_interpolate(&long, 4), vec![0.0, 1.0, 2.0, 3.0]);
        let short = truncate_or_interpolate(&[0.0, 4.0], 5);
        assert_eq!(short, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
