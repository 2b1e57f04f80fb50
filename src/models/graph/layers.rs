//! Inference-only neural network layers on `ndarray`.
//!
//! Feature maps are `(channels, time)` for the per-lead CNN and `(nodes, features)` for
//! graph layers. Weight layouts follow the usual `(out, in, ...)` convention.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};

use crate::core::errors::EcgError;
use crate::domain::LeadGraph;

/// Rectified linear unit, in place.
pub fn relu_inplace<D: ndarray::Dimension>(x: &mut ndarray::Array<f32, D>) {
    x.mapv_inplace(|v| v.max(0.0));
}

/// 1-D convolution over `(in_channels, time)` inputs.
#[derive(Debug, Clone)]
pub struct Conv1d {
    /// `(out_channels, in_channels, kernel)`
    pub weight: Array3<f32>,
    pub bias: Array1<f32>,
    pub stride: usize,
    pub padding: usize,
}

impl Conv1d {
    pub fn out_channels(&self) -> usize {
        self.weight.shape()[0]
    }

    pub fn output_length(&self, input_length: usize) -> Option<usize> {
        let kernel = self.weight.shape()[2];
        let padded = input_length + 2 * self.padding;
        if padded < kernel || self.stride == 0 {
            return None;
        }
        Some((padded - kernel) / self.stride + 1)
    }

    /// Convolves via an im2col matrix and one matrix product.
    pub fn forward(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>, EcgError> {
        let (out_ch, in_ch, kernel) = self.weight.dim();
        let (x_ch, length) = x.dim();
        if x_ch != in_ch {
            return Err(EcgError::shape_mismatch(
                "Conv1d",
                &[in_ch, length],
                &[x_ch, length],
            ));
        }
        let out_len = self.output_length(length).ok_or_else(|| {
            EcgError::invalid_input(format!(
                "Conv1d input of length {} is shorter than kernel {}",
                length, kernel
            ))
        })?;

        let mut cols = Array2::<f32>::zeros((in_ch * kernel, out_len));
        for c in 0..in_ch {
            for k in 0..kernel {
                let mut row = cols.row_mut(c * kernel + k);
                for t in 0..out_len {
                    let pos = (t * self.stride + k) as isize - self.padding as isize;
                    if pos >= 0 && (pos as usize) < length {
                        row[t] = x[[c, pos as usize]];
                    }
                }
            }
        }

        let w = self
            .weight
            .view()
            .into_shape_with_order((out_ch, in_ch * kernel))?;
        let mut out = w.dot(&cols);
        out += &self.bias.view().insert_axis(Axis(1));
        Ok(out)
    }
}

/// Batch normalization with frozen running statistics.
#[derive(Debug, Clone)]
pub struct BatchNorm1d {
    pub weight: Array1<f32>,
    pub bias: Array1<f32>,
    pub running_mean: Array1<f32>,
    pub running_var: Array1<f32>,
    pub eps: f32,
}

impl BatchNorm1d {
    /// Normalizes a `(channels, time)` map in place.
    pub fn forward_inplace(&self, x: &mut Array2<f32>) {
        for (c, mut row) in x.axis_iter_mut(Axis(0)).enumerate() {
            let scale = self.weight[c] / (self.running_var[c] + self.eps).sqrt();
            let shift = self.bias[c] - self.running_mean[c] * scale;
            row.mapv_inplace(|v| v * scale + shift);
        }
    }
}

/// Fully connected layer.
#[derive(Debug, Clone)]
pub struct Linear {
    /// `(out_features, in_features)`
    pub weight: Array2<f32>,
    pub bias: Option<Array1<f32>>,
}

impl Linear {
    pub fn forward(&self, x: ArrayView1<'_, f32>) -> Result<Array1<f32>, EcgError> {
        let (out_dim, in_dim) = self.weight.dim();
        if x.len() != in_dim {
            return Err(EcgError::shape_mismatch("Linear", &[in_dim], &[x.len()]));
        }
        let mut y = self.weight.dot(&x);
        if let Some(bias) = &self.bias {
            y += bias;
        }
        debug_assert_eq!(y.len(), out_dim);
        Ok(y)
    }

    /// Applies the layer to every row of `(rows, in_features)`.
    pub fn forward_rows(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>, EcgError> {
        let (out_dim, in_dim) = self.weight.dim();
        if x.ncols() != in_dim {
            return Err(EcgError::shape_mismatch(
                "Linear",
                &[x.nrows(), in_dim],
                &[x.nrows(), x.ncols()],
            ));
        }
        let mut y = x.dot(&self.weight.t());
        if let Some(bias) = &self.bias {
            y += &bias.view().insert_axis(Axis(0));
        }
        debug_assert_eq!(y.ncols(), out_dim);
        Ok(y)
    }
}

/// Graph convolution with symmetric degree normalization.
///
/// `H' = D^-1/2 (A + I) D^-1/2 H W^T + b_lin + b`
#[derive(Debug, Clone)]
pub struct GcnConv {
    pub lin: Linear,
    pub bias: Array1<f32>,
}

impl GcnConv {
    pub fn forward(
        &self,
        h: ArrayView2<'_, f32>,
        graph: &LeadGraph,
    ) -> Result<Array2<f32>, EcgError> {
        let norm = normalized_adjacency(graph, h.nrows())?;
        let mixed = norm.dot(&h);
        let mut out = self.lin.forward_rows(mixed.view())?;
        out += &self.bias.view().insert_axis(Axis(0));
        Ok(out)
    }
}

/// `D^-1/2 (A + I) D^-1/2` for the lead graph.
pub fn normalized_adjacency(graph: &LeadGraph, nodes: usize) -> Result<Array2<f32>, EcgError> {
    if graph.lead_count() != nodes {
        return Err(EcgError::shape_mismatch(
            "lead graph",
            &[nodes],
            &[graph.lead_count()],
        ));
    }
    let mut adj = graph.adjacency();
    for i in 0..nodes {
        adj[[i, i]] += 1.0;
    }
    let inv_sqrt: Vec<f32> = adj
        .rows()
        .into_iter()
        .map(|row| {
            let degree = row.sum();
            if degree > 0.0 { degree.powf(-0.5) } else { 0.0 }
        })
        .collect();
    for ((i, j), v) in adj.indexed_iter_mut() {
        *v *= inv_sqrt[i] * inv_sqrt[j];
    }
    Ok(adj)
}

/// GraphSAGE layer with mean aggregation.
///
/// `H'_i = W_l mean_{j in N(i)} h_j + b_l + W_r h_i`; isolated nodes aggregate to zero.
#[derive(Debug, Clone)]
pub struct SageConv {
    pub lin_l: Linear,
    pub lin_r: Linear,
}

impl SageConv {
    pub fn forward(
        &self,
        h: ArrayView2<'_, f32>,
        graph: &LeadGraph,
    ) -> Result<Array2<f32>, EcgError> {
        let (nodes, features) = h.dim();
        if graph.lead_count() != nodes {
            return Err(EcgError::shape_mismatch(
                "lead graph",
                &[nodes],
                &[graph.lead_count()],
            ));
        }
        let mut aggregated = Array2::<f32>::zeros((nodes, features));
        for i in 0..nodes {
            let neighbors = graph.neighbors(i);
            if neighbors.is_empty() {
                continue;
            }
            let mut row = aggregated.row_mut(i);
            for &j in neighbors {
                row += &h.row(j);
            }
            row /= neighbors.len() as f32;
        }
        let mut out = self.lin_l.forward_rows(aggregated.view())?;
        out += &self.lin_r.forward_rows(h)?;
        Ok(out)
    }
}

/// Mean over the time axis of a `(channels, time)` map.
pub fn time_mean(x: &Array2<f32>) -> Array1<f32> {
    x.mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(x.nrows()))
}

/// Flattens `(nodes, features)` row by row, keeping node order.
pub fn concat_nodes(h: &Array2<f32>) -> Array1<f32> {
    h.iter().copied().collect()
}
