/*
 * @Date         : 2026-02-03
 * @Description  : 张量（Tensor）：基于ndarray的f32多维数组，是自动微分引擎和图像流水线共用的数据载体
 */

use ndarray::{Array, ArrayD, Axis, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::errors::{Operator, TensorError};

mod image;
mod ops;
mod property;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 图像张量约定为`[C, H, W]`，批量图像为`[N, C, H, W]`，像素值在[0, 1]之间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量。除了`data`长度为1且shape为`[]`的情况（标量），
    /// `data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).unwrap_or_else(|_| {
            panic!(
                "{}",
                TensorError::DataShapeMismatch {
                    len: data.len(),
                    shape: shape.to_vec(),
                }
            )
        });
        Self { data }
    }

    pub fn from_array(data: ArrayD<f32>) -> Self {
        Self { data }
    }

    /// 标量张量，形状为`[]`
    pub fn scalar(value: f32) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(&[]), value),
        }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    pub fn full(shape: &[usize], value: f32) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    /// 创建一个随机张量，其值在[min, max)的半开区间
    pub fn uniform_with_rng<R: Rng + ?Sized>(
        min: f32,
        max: f32,
        shape: &[usize],
        rng: &mut R,
    ) -> Self {
        let dist = Uniform::new(min, max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    /// 创建一个服从正态分布的随机张量（Box-Muller）
    pub fn normal_with_rng<R: Rng + ?Sized>(
        mean: f32,
        std_dev: f32,
        shape: &[usize],
        rng: &mut R,
    ) -> Self {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);
        let unit = Uniform::new(f32::EPSILON, 1.0);

        while data.len() < data_len {
            let u1 = unit.sample(rng);
            let u2 = unit.sample(rng);
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            data.push(mean + std_dev * r * theta.cos());
            if data.len() < data_len {
                data.push(mean + std_dev * r * theta.sin());
            }
        }

        Self::new(&data, shape)
    }

    /// 沿新的第0维堆叠一组形状相同的张量，如多个`[C, H, W]`堆叠为`[N, C, H, W]`
    pub fn stack(tensors: &[&Self]) -> Self {
        assert!(!tensors.is_empty(), "{}", TensorError::EmptyList);
        let first_shape = tensors[0].shape();
        for t in tensors {
            assert!(
                t.shape() == first_shape,
                "{}",
                TensorError::OperatorError {
                    operator: Operator::Stack,
                    tensor1_shape: first_shape.to_vec(),
                    tensor2_shape: t.shape().to_vec(),
                }
            );
        }
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = ndarray::stack(Axis(0), &views).unwrap_or_else(|_| {
            panic!("{}", TensorError::InconsitentShape);
        });
        Self { data }
    }

    /// 取第0维上的第`index`个子张量，如从`[N, C, H, W]`中取出`[C, H, W]`
    pub fn select(&self, index: usize) -> Self {
        Self {
            data: self.data.index_axis(Axis(0), index).to_owned(),
        }
    }

    /// 改变形状（元素总数须不变）
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let data = self
            .data
            .as_standard_layout()
            .into_owned()
            .into_shape(IxDyn(shape))
            .unwrap_or_else(|_| {
                panic!(
                    "{}",
                    TensorError::DataShapeMismatch {
                        len: self.size(),
                        shape: shape.to_vec(),
                    }
                )
            });
        Self { data }
    }

    /// 按给定顺序重排维度，结果为标准（行优先）布局
    pub fn permute(&self, axes: &[usize]) -> Self {
        assert!(
            axes.len() == self.dimension(),
            "{}",
            TensorError::DimensionMismatch {
                expected: axes.len(),
                shape: self.shape().to_vec(),
            }
        );
        let data = self
            .data
            .view()
            .permuted_axes(IxDyn(axes))
            .as_standard_layout()
            .into_owned();
        Self { data }
    }
}
