//! Tensor aliases used at model boundaries.

/// 1-D float tensor.
pub type Tensor1D = ndarray::Array1<f32>;

/// 2-D float tensor, typically `(batch, classes)`.
pub type Tensor2D = ndarray::Array2<f32>;

/// 3-D float tensor, typically `(batch, leads, samples)`.
pub type Tensor3D = ndarray::Array3<f32>;

/// 4-D float tensor in `(batch, channels, height, width)` layout.
pub type Tensor4D = ndarray::Array4<f32>;
