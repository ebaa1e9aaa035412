//! Root-mean-squared-error loss for fare regression.

use burn::nn::loss::{MseLoss, Reduction};
use burn::prelude::*;

/// RMSE: `sqrt(mean((prediction - target)^2))`.
///
/// # Arguments
/// - `prediction`: shape `(rows, 1)`
/// - `target`: shape `(rows, 1)`
///
/// # Returns
/// Scalar loss tensor of shape `(1,)`.
pub fn rmse_loss<B: Backend>(prediction: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
    MseLoss::new()
        .forward(prediction, target, Reduction::Mean)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::backend::Autodiff;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    fn column<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(values.to_vec(), [values.len(), 1]), device)
    }

    #[test]
    fn test_rmse_perfect() {
        let device = Default::default();
        let pred = column::<TestBackend>(&[3.0, 7.5, 12.0], &device);
        let target = column::<TestBackend>(&[3.0, 7.5, 12.0], &device);

        let loss: f32 = rmse_loss(pred, target).into_scalar().elem();
        assert!(loss.abs() < 1e-6, "Perfect prediction should give zero loss, got {loss}");
    }

    #[test]
    fn test_rmse_known_value() {
        let device = Default::default();
        // Errors 2, -2, 2, -2 → MSE 4 → RMSE 2
        let pred = column::<TestBackend>(&[1.0, 6.0, 3.0, 8.0], &device);
        let target = column::<TestBackend>(&[3.0, 4.0, 5.0, 6.0], &device);

        let loss: f32 = rmse_loss(pred, target).into_scalar().elem();
        assert!((loss - 2.0).abs() < 1e-5, "Expected 2.0, got {loss}");
    }

    #[test]
    fn test_rmse_is_sqrt_of_mse() {
        let device = Default::default();
        // Errors 1, 3 → MSE 5 → RMSE sqrt(5)
        let pred = column::<TestBackend>(&[1.0, 3.0], &device);
        let target = column::<TestBackend>(&[0.0, 0.0], &device);

        let loss: f32 = rmse_loss(pred, target).into_scalar().elem();
        assert!((loss - 5.0_f32.sqrt()).abs() < 1e-5, "Expected sqrt(5), got {loss}");
    }

    #[test]
    fn test_rmse_gradient_direction() {
        let device = Default::default();
        // Over-predicting → positive gradient, so a descent step lowers the prediction.
        let pred = column::<TestAutodiffBackend>(&[10.0, 4.0], &device).require_grad();
        let target = column::<TestAutodiffBackend>(&[8.0, 6.0], &device);

        let grads = rmse_loss(pred.clone(), target).backward();
        let grad: Vec<f32> = pred.grad(&grads).unwrap().into_data().to_vec().unwrap();
        assert!(grad[0] > 0.0, "over-prediction gradient should be positive, got {}", grad[0]);
        assert!(grad[1] < 0.0, "under-prediction gradient should be negative, got {}", grad[1]);
    }
}
