/*
 * @Date         : 2026-02-06
 * @Description  : 2D 卷积节点（PyTorch 风格，im2col + 矩阵乘）
 *
 * 设计决策：
 * - 单节点处理多通道，Batch-First：输入 [N, C_in, H, W]，输出 [N, C_out, H', W']
 * - 卷积核 [C_out, C_in, kH, kW]，偏置可选 [C_out]
 * - 前向/反向都使用 Rayon 在 batch 维度并行
 * - 只保存原始输入，反向时按需重新展开（im2col）
 *
 * 父节点：
 * - parents[0]: 输入数据
 * - parents[1]: 卷积核参数
 * - parents[2]: 偏置参数（可选）
 */

use super::{TraitOp, expect_4d};
use crate::nn::graph::GraphError;
use crate::nn::var::Var;
use crate::tensor::Tensor;
use ndarray::{Array1, Array2, Array3, ArrayView3, Axis, Ix2, Ix4};
use rayon::prelude::*;

/// 卷积的几何参数（单样本视角）
#[derive(Debug, Clone, Copy)]
struct ConvGeometry {
    channels: usize,
    height: usize,
    width: usize,
    kernel_h: usize,
    kernel_w: usize,
    stride: usize,
    padding: usize,
    out_h: usize,
    out_w: usize,
}

impl ConvGeometry {
    const fn rows(&self) -> usize {
        self.channels * self.kernel_h * self.kernel_w
    }

    const fn cols(&self) -> usize {
        self.out_h * self.out_w
    }

    /// 输出坐标 `out` 在核偏移 `k` 处对应的输入坐标（落在填充区时为 None）
    const fn source(&self, out: usize, k: usize, len: usize) -> Option<usize> {
        let pos = out * self.stride + k;
        if pos < self.padding || pos - self.padding >= len {
            None
        } else {
            Some(pos - self.padding)
        }
    }

    /// [C, H, W] -> [C*kH*kW, H'*W']
    fn im2col(&self, sample: ArrayView3<f32>) -> Array2<f32> {
        let mut cols = Array2::zeros((self.rows(), self.cols()));
        for c in 0..self.channels {
            for ki in 0..self.kernel_h {
                for kj in 0..self.kernel_w {
                    let row = (c * self.kernel_h + ki) * self.kernel_w + kj;
                    for oy in 0..self.out_h {
                        let Some(iy) = self.source(oy, ki, self.height) else {
                            continue;
                        };
                        for ox in 0..self.out_w {
                            if let Some(ix) = self.source(ox, kj, self.width) {
                                cols[[row, oy * self.out_w + ox]] = sample[[c, iy, ix]];
                            }
                        }
                    }
                }
            }
        }
        cols
    }

    /// im2col 的伴随：[C*kH*kW, H'*W'] -> [C, H, W]，重叠位置累加
    fn col2im(&self, cols: &Array2<f32>) -> Array3<f32> {
        let mut image = Array3::zeros((self.channels, self.height, self.width));
        for c in 0..self.channels {
            for ki in 0..self.kernel_h {
                for kj in 0..self.kernel_w {
                    let row = (c * self.kernel_h + ki) * self.kernel_w + kj;
                    for oy in 0..self.out_h {
                        let Some(iy) = self.source(oy, ki, self.height) else {
                            continue;
                        };
                        for ox in 0..self.out_w {
                            if let Some(ix) = self.source(ox, kj, self.width) {
                                image[[c, iy, ix]] += cols[[row, oy * self.out_w + ox]];
                            }
                        }
                    }
                }
            }
        }
        image
    }
}

fn layout_error(e: ndarray::ShapeError) -> GraphError {
    GraphError::ComputationError(format!("Conv2d 张量布局错误：{e}"))
}

/// 2D 卷积节点
pub(crate) struct Conv2dOp {
    input: Tensor,
    /// 卷积核展开为 [C_out, C_in*kH*kW]
    kernel: Array2<f32>,
    kernel_shape: [usize; 4],
    geometry: ConvGeometry,
}

/// 2D 卷积（前向）
///
/// # 参数
/// - `stride`: 步长（H、W 方向相同，须 >= 1）
/// - `padding`: 四周零填充宽度
pub(crate) fn conv2d(
    input: &Var,
    kernel: &Var,
    bias: Option<&Var>,
    stride: usize,
    padding: usize,
) -> Result<Var, GraphError> {
    input.assert_same_graph(kernel)?;
    if let Some(b) = bias {
        input.assert_same_graph(b)?;
    }
    if stride == 0 {
        return Err(GraphError::InvalidOperation("Conv2d 步长必须 >= 1".to_string()));
    }

    let x = input.value();
    let [batch, channels, height, width] = expect_4d(x.shape(), "Conv2d")?;
    let kernel_shape = kernel.shape();
    let &[out_channels, kernel_c, kernel_h, kernel_w] = kernel_shape.as_slice() else {
        return Err(GraphError::ShapeMismatch {
            expected: vec![0, 0, 0, 0],
            got: kernel_shape.clone(),
            message: "卷积核必须是 4D [C_out, C_in, kH, kW]".to_string(),
        });
    };
    if kernel_c != channels {
        return Err(GraphError::ShapeMismatch {
            expected: vec![kernel_c],
            got: vec![channels],
            message: format!("输入通道数 {channels} 与卷积核输入通道数 {kernel_c} 不匹配"),
        });
    }
    if height + 2 * padding < kernel_h || width + 2 * padding < kernel_w {
        return Err(GraphError::InvalidOperation(format!(
            "卷积输出尺寸无效：输入 {height}x{width}，核 {kernel_h}x{kernel_w}，填充 {padding}"
        )));
    }

    let bias_values = match bias {
        Some(b) => {
            let values = b.value().to_vec();
            if values.len() != out_channels {
                return Err(GraphError::ShapeMismatch {
                    expected: vec![out_channels],
                    got: b.shape(),
                    message: "卷积偏置长度必须等于输出通道数".to_string(),
                });
            }
            Some(values)
        }
        None => None,
    };

    let geometry = ConvGeometry {
        channels,
        height,
        width,
        kernel_h,
        kernel_w,
        stride,
        padding,
        out_h: (height + 2 * padding - kernel_h) / stride + 1,
        out_w: (width + 2 * padding - kernel_w) / stride + 1,
    };
    let kernel_matrix = kernel
        .value()
        .reshape(&[out_channels, geometry.rows()])
        .into_array()
        .into_dimensionality::<Ix2>()
        .map_err(layout_error)?;

    let x4 = x.view().view().into_dimensionality::<Ix4>().map_err(layout_error)?;
    let outputs: Vec<Array2<f32>> = (0..batch)
        .into_par_iter()
        .map(|n| {
            let cols = geometry.im2col(x4.index_axis(Axis(0), n));
            let mut out = kernel_matrix.dot(&cols);
            if let Some(b) = &bias_values {
                for (mut row, &bv) in out.axis_iter_mut(Axis(0)).zip(b) {
                    row += bv;
                }
            }
            out
        })
        .collect();

    let data: Vec<f32> = outputs.iter().flat_map(|o| o.iter().copied()).collect();
    let value = Tensor::new(
        &data,
        &[batch, out_channels, geometry.out_h, geometry.out_w],
    );

    let mut parents = vec![input.clone(), kernel.clone()];
    if let Some(b) = bias {
        parents.push(b.clone());
    }
    Ok(Var::from_op(
        parents,
        value,
        Conv2dOp {
            input: x,
            kernel: kernel_matrix,
            kernel_shape: [out_channels, kernel_c, kernel_h, kernel_w],
            geometry,
        },
        "conv2d",
    ))
}

impl TraitOp for Conv2dOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let geometry = self.geometry;
        let out_channels = self.kernel_shape[0];
        let need_input = needs_grad[0];
        let need_kernel = needs_grad[1];
        let need_bias = needs_grad.get(2).copied().unwrap_or(false);

        let x4 = self
            .input
            .view()
            .view()
            .into_dimensionality::<Ix4>()
            .map_err(layout_error)?;
        let up4 = upstream
            .view()
            .view()
            .into_dimensionality::<Ix4>()
            .map_err(layout_error)?;
        let batch = x4.len_of(Axis(0));

        type Part = (Option<Array2<f32>>, Option<Array1<f32>>, Option<Array3<f32>>);
        let parts: Vec<Part> = (0..batch)
            .into_par_iter()
            .map(|n| -> Result<Part, GraphError> {
                let g = up4
                    .index_axis(Axis(0), n)
                    .as_standard_layout()
                    .into_owned()
                    .into_shape((out_channels, geometry.cols()))
                    .map_err(layout_error)?;
                let grad_kernel = need_kernel.then(|| {
                    let cols = geometry.im2col(x4.index_axis(Axis(0), n));
                    g.dot(&cols.t())
                });
                let grad_bias = need_bias.then(|| g.sum_axis(Axis(1)));
                let grad_input = need_input.then(|| geometry.col2im(&self.kernel.t().dot(&g)));
                Ok((grad_kernel, grad_bias, grad_input))
            })
            .collect::<Result<_, _>>()?;

        let mut kernel_acc: Option<Array2<f32>> = None;
        let mut bias_acc: Option<Array1<f32>> = None;
        let mut input_data: Vec<f32> = Vec::new();
        for (gk, gb, gx) in parts {
            if let Some(gk) = gk {
                match kernel_acc.as_mut() {
                    Some(acc) => *acc += &gk,
                    None => kernel_acc = Some(gk),
                }
            }
            if let Some(gb) = gb {
                match bias_acc.as_mut() {
                    Some(acc) => *acc += &gb,
                    None => bias_acc = Some(gb),
                }
            }
            if let Some(gx) = gx {
                input_data.extend(gx.iter().copied());
            }
        }

        let grad_input = need_input.then(|| Tensor::new(&input_data, self.input.shape()));
        let grad_kernel = kernel_acc.map(|acc| {
            Tensor::from_array(acc.into_dyn()).reshape(&self.kernel_shape)
        });
        let mut grads = vec![grad_input, grad_kernel];
        if needs_grad.len() > 2 {
            grads.push(bias_acc.map(|acc| Tensor::from_array(acc.into_dyn())));
        }
        Ok(grads)
    }
}
