/*
 * @Date         : 2026-02-08
 * @Description  : 结构相似性（SSIM）
 *
 * 每个通道独立地用 11x11、σ = 1.5 的归一化高斯窗口做零填充（padding = 5）滤波，
 * 得到局部均值、方差与协方差，再对整张 SSIM 图取平均。
 * 二维高斯核可分离，因此先横向、再纵向各做一次一维滤波。
 */

use super::check_same_shape;
use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::{Array2, ArrayView2, Axis, Ix4};
use rayon::prelude::*;

/// 高斯窗口边长
pub const SSIM_WINDOW_SIZE: usize = 11;
const SIGMA: f32 = 1.5;
const C1: f32 = 0.01 * 0.01;
const C2: f32 = 0.03 * 0.03;

/// 计算两批图像之间的平均 SSIM
///
/// 输入可以是 `[C, H, W]` 或 `[N, C, H, W]`，两者形状必须一致。
pub fn ssim(a: &Tensor, b: &Tensor) -> Result<f32, TensorError> {
    check_same_shape(a, b, Operator::Compare)?;
    let (a, b) = match a.dimension() {
        3 => (a.reshape(&batched(a.shape())), b.reshape(&batched(b.shape()))),
        4 => (a.clone(), b.clone()),
        _ => {
            return Err(TensorError::DimensionMismatch {
                expected: 4,
                shape: a.shape().to_vec(),
            });
        }
    };
    let shape = a.shape().to_vec();
    let (n, c) = (shape[0], shape[1]);
    let a = into_4d(&a)?;
    let b = into_4d(&b)?;

    let window = gaussian_window();
    let (sum, count) = (0..n * c)
        .into_par_iter()
        .map(|k| {
            let (i, ch) = (k / c, k % c);
            let x = a.index_axis(Axis(0), i).index_axis_move(Axis(0), ch);
            let y = b.index_axis(Axis(0), i).index_axis_move(Axis(0), ch);
            let map = ssim_map(x, y, &window);
            (map.sum(), map.len())
        })
        .reduce(|| (0.0, 0), |(s1, n1), (s2, n2)| (s1 + s2, n1 + n2));

    Ok(if count == 0 { 0.0 } else { sum / count as f32 })
}

fn batched(shape: &[usize]) -> Vec<usize> {
    std::iter::once(1).chain(shape.iter().copied()).collect()
}

fn into_4d(t: &Tensor) -> Result<ndarray::Array4<f32>, TensorError> {
    t.view()
        .clone()
        .into_dimensionality::<Ix4>()
        .map_err(|_| TensorError::DimensionMismatch {
            expected: 4,
            shape: t.shape().to_vec(),
        })
}

/// 归一化的一维高斯核
fn gaussian_window() -> Vec<f32> {
    let center = (SSIM_WINDOW_SIZE / 2) as f32;
    let raw: Vec<f32> = (0..SSIM_WINDOW_SIZE)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * SIGMA * SIGMA)).exp()
        })
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

/// 零填充的可分离高斯滤波，输出与输入同尺寸
fn gaussian_filter(x: &Array2<f32>, window: &[f32]) -> Array2<f32> {
    let (h, w) = x.dim();
    let half = (window.len() / 2) as isize;
    let sample = |len: usize, center: usize, k: usize| -> Option<usize> {
        let pos = center as isize + k as isize - half;
        (0..len as isize).contains(&pos).then_some(pos as usize)
    };

    let mut horizontal = Array2::<f32>::zeros((h, w));
    for ((row, col), out) in horizontal.indexed_iter_mut() {
        *out = window
            .iter()
            .enumerate()
            .filter_map(|(k, wk)| sample(w, col, k).map(|j| wk * x[[row, j]]))
            .sum();
    }

    let mut filtered = Array2::<f32>::zeros((h, w));
    for ((row, col), out) in filtered.indexed_iter_mut() {
        *out = window
            .iter()
            .enumerate()
            .filter_map(|(k, wk)| sample(h, row, k).map(|i| wk * horizontal[[i, col]]))
            .sum();
    }
    filtered
}

fn ssim_map(x: ArrayView2<f32>, y: ArrayView2<f32>, window: &[f32]) -> Array2<f32> {
    let x = x.to_owned();
    let y = y.to_owned();
    let mu_x = gaussian_filter(&x, window);
    let mu_y = gaussian_filter(&y, window);
    let sigma_x = gaussian_filter(&(&x * &x), window) - &mu_x * &mu_x;
    let sigma_y = gaussian_filter(&(&y * &y), window) - &mu_y * &mu_y;
    let sigma_xy = gaussian_filter(&(&x * &y), window) - &mu_x * &mu_y;

    let numerator = (&mu_x * &mu_y * 2.0 + C1) * (sigma_xy * 2.0 + C2);
    let denominator = (&mu_x * &mu_x + &mu_y * &mu_y + C1) * (sigma_x + sigma_y + C2);
    numerator / denominator
}
