/*
 * @Date         : 2026-02-06
 * @Description  : Conv2d (2D 卷积) 层 - PyTorch 风格 API
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding - kernel) / stride + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use crate::nn::nodes::conv2d;
use crate::nn::{Graph, GraphError, Init, Module, Var};

/// Conv2d (2D 卷积) 层
///
/// 参数初始化与 `PyTorch` 默认一致：卷积核与偏置均服从 U(-1/√fan_in, 1/√fan_in)，
/// 其中 fan_in = in_channels * kernel_size²。
///
/// # 使用示例
/// ```ignore
/// let conv = Conv2d::new(&graph, 3, 64, 9, 1, 4, true, "block1.conv")?;
/// let h = conv.forward(&x)?.prelu(&weight)?;
/// ```
#[derive(Debug)]
pub struct Conv2d {
    /// 卷积核参数 [out_channels, in_channels, kernel_size, kernel_size]
    kernel: Var,
    /// 偏置参数 [out_channels]（可选）
    bias: Option<Var>,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
}

impl Conv2d {
    /// 创建新的 Conv2d 层
    ///
    /// # 参数
    /// - `graph`: 计算图句柄
    /// - `in_channels` / `out_channels`: 输入/输出通道数
    /// - `kernel_size`: 方形卷积核边长
    /// - `stride`: 步长
    /// - `padding`: 零填充宽度
    /// - `use_bias`: 是否使用偏置
    /// - `name`: 层名称前缀（参数名为 `{name}.weight` / `{name}.bias`）
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        use_bias: bool,
        name: &str,
    ) -> Result<Self, GraphError> {
        let fan_in = in_channels * kernel_size * kernel_size;
        let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
        let init = Init::Uniform {
            low: -bound,
            high: bound,
        };

        let kernel = graph.parameter(
            &[out_channels, in_channels, kernel_size, kernel_size],
            init.clone(),
            &format!("{name}.weight"),
        )?;
        let bias = if use_bias {
            Some(graph.parameter(&[out_channels], init, &format!("{name}.bias"))?)
        } else {
            None
        };

        Ok(Self {
            kernel,
            bias,
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
        })
    }

    /// 前向传播：`conv2d(x, K) + b`
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        conv2d(
            x,
            &self.kernel,
            self.bias.as_ref(),
            self.stride,
            self.padding,
        )
    }

    pub const fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub const fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub const fn stride(&self) -> usize {
        self.stride
    }

    pub const fn padding(&self) -> usize {
        self.padding
    }

    pub const fn kernel(&self) -> &Var {
        &self.kernel
    }

    pub const fn bias(&self) -> Option<&Var> {
        self.bias.as_ref()
    }
}

impl Module for Conv2d {
    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.kernel.clone()];
        if let Some(ref bias) = self.bias {
            params.push(bias.clone());
        }
        params
    }
}
