//! Tensor bridge: row-major host buffers to burn tensors and back.
//!
//! The data side works with flat `Vec<i64>` / `Vec<f32>` matrices so it can be
//! built and sliced without a backend; the model needs `Tensor<B, 2>` inputs.

use burn::prelude::*;
use burn::tensor::TensorData;

/// Build a `(rows, cols)` integer tensor from a row-major code buffer.
///
/// # Panics
/// Panics if `codes.len() != rows * cols`.
pub fn codes_to_tensor<B: Backend>(
    codes: &[i64],
    rows: usize,
    cols: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    assert_eq!(
        codes.len(),
        rows * cols,
        "code buffer has length {}, expected {rows}x{cols}",
        codes.len()
    );
    Tensor::from_data(TensorData::new(codes.to_vec(), [rows, cols]), device)
}

/// Build a `(rows, cols)` float tensor from a row-major buffer.
///
/// # Panics
/// Panics if `values.len() != rows * cols`.
pub fn features_to_tensor<B: Backend>(
    values: &[f32],
    rows: usize,
    cols: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    assert_eq!(
        values.len(),
        rows * cols,
        "feature buffer has length {}, expected {rows}x{cols}",
        values.len()
    );
    Tensor::from_data(TensorData::new(values.to_vec(), [rows, cols]), device)
}

/// Flatten a float tensor of any rank into `f64` values in row-major order.
pub fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> anyhow::Result<Vec<f64>> {
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to read tensor data: {e:?}"))?;
    Ok(values.into_iter().map(f64::from).collect())
}

/// Extract a single `f64` scalar from a one-element tensor.
pub fn tensor_to_f64<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    tensor.into_scalar().elem::<f64>()
}
