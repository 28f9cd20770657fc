use crate::assert_err;
use crate::errors::TensorError;
use crate::metrics::{mse, psnr, psnr_from_mse};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_psnr_of_identical_images_is_infinite() {
    let img = Tensor::full(&[3, 4, 4], 0.3);
    assert_eq!(psnr(&img, &img).unwrap(), f32::INFINITY);
    assert_eq!(psnr_from_mse(0.0), f32::INFINITY);
}

#[test]
fn test_psnr_known_values() {
    assert_abs_diff_eq!(psnr_from_mse(0.01), 20.0, epsilon = 1e-5);
    assert_abs_diff_eq!(psnr_from_mse(1.0), 0.0);

    let a = Tensor::zeros(&[1, 3, 2, 2]);
    let b = Tensor::full(&[1, 3, 2, 2], 0.1);
    assert_abs_diff_eq!(mse(&a, &b).unwrap(), 0.01, epsilon = 1e-7);
    assert_abs_diff_eq!(psnr(&a, &b).unwrap(), 20.0, epsilon = 1e-4);
}

#[test]
fn test_psnr_shape_mismatch() {
    let a = Tensor::zeros(&[3, 4, 4]);
    let b = Tensor::zeros(&[3, 4, 5]);
    assert_err!(psnr(&a, &b), TensorError::OperatorError { .. });
}
