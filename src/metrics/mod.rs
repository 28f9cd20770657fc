/*
 * @Date         : 2026-02-08
 * @Description  : 图像质量指标：PSNR 与 SSIM（纯张量计算，不参与自动微分）
 */

mod ssim;

pub use ssim::{SSIM_WINDOW_SIZE, ssim};

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;

#[cfg(test)]
mod tests;

/// 由均方误差计算峰值信噪比（像素值域为 [0, 1]）：`10·log10(1 / mse)`
///
/// `mse == 0` 时返回 `f32::INFINITY`，是否截断由调用方决定。
pub fn psnr_from_mse(mse: f32) -> f32 {
    10.0 * (1.0 / mse).log10()
}

/// 两张同形状图像之间的均方误差
pub fn mse(a: &Tensor, b: &Tensor) -> Result<f32, TensorError> {
    check_same_shape(a, b, Operator::Compare)?;
    let diff = a - b;
    Ok(diff.square().mean())
}

/// 两张同形状图像之间的峰值信噪比（dB）
pub fn psnr(a: &Tensor, b: &Tensor) -> Result<f32, TensorError> {
    mse(a, b).map(psnr_from_mse)
}

fn check_same_shape(a: &Tensor, b: &Tensor, operator: Operator) -> Result<(), TensorError> {
    if a.shape() == b.shape() {
        Ok(())
    } else {
        Err(TensorError::OperatorError {
            operator,
            tensor1_shape: a.shape().to_vec(),
            tensor2_shape: b.shape().to_vec(),
        })
    }
}
