/*
 * @Date         : 2026-02-08
 * @Description  : SRGAN 生成器
 */

use super::UPSCALE_FACTOR;
use crate::nn::{
    BatchNorm2d, Buffer, Conv2d, Graph, GraphError, Module, PRelu, Var, VarActivationOps,
    VarShapeOps,
};
use serde::{Deserialize, Serialize};

/// 生成器宽度配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// 主干通道数
    pub channels: usize,
    /// 残差块个数
    pub residual_blocks: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            channels: 64,
            residual_blocks: 5,
        }
    }
}

/// 残差块：conv3 -> BN -> PReLU -> conv3 -> BN，再与输入相加
#[derive(Debug)]
struct ResidualBlock {
    conv1: Conv2d,
    bn1: BatchNorm2d,
    prelu: PRelu,
    conv2: Conv2d,
    bn2: BatchNorm2d,
}

impl ResidualBlock {
    fn new(graph: &Graph, channels: usize, name: &str) -> Result<Self, GraphError> {
        Ok(Self {
            conv1: Conv2d::new(graph, channels, channels, 3, 1, 1, true, &format!("{name}.conv1"))?,
            bn1: BatchNorm2d::new(graph, channels, &format!("{name}.bn1"))?,
            prelu: PRelu::new(graph, 1, &format!("{name}.prelu"))?,
            conv2: Conv2d::new(graph, channels, channels, 3, 1, 1, true, &format!("{name}.conv2"))?,
            bn2: BatchNorm2d::new(graph, channels, &format!("{name}.bn2"))?,
        })
    }

    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let residual = self.bn1.forward(&self.conv1.forward(x)?)?;
        let residual = self.prelu.forward(&residual)?;
        let residual = self.bn2.forward(&self.conv2.forward(&residual)?)?;
        x.try_add(&residual)
    }
}

impl Module for ResidualBlock {
    fn parameters(&self) -> Vec<Var> {
        [
            self.conv1.parameters(),
            self.bn1.parameters(),
            self.prelu.parameters(),
            self.conv2.parameters(),
            self.bn2.parameters(),
        ]
        .concat()
    }

    fn buffers(&self) -> Vec<Buffer> {
        [self.bn1.buffers(), self.bn2.buffers()].concat()
    }
}

/// 上采样块：conv3（通道 ×r²）-> PixelShuffle(r) -> PReLU
#[derive(Debug)]
struct UpsampleBlock {
    conv: Conv2d,
    prelu: PRelu,
    factor: usize,
}

impl UpsampleBlock {
    fn new(graph: &Graph, channels: usize, factor: usize, name: &str) -> Result<Self, GraphError> {
        Ok(Self {
            conv: Conv2d::new(
                graph,
                channels,
                channels * factor * factor,
                3,
                1,
                1,
                true,
                &format!("{name}.conv"),
            )?,
            prelu: PRelu::new(graph, 1, &format!("{name}.prelu"))?,
            factor,
        })
    }

    fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let h = self.conv.forward(x)?.pixel_shuffle(self.factor)?;
        self.prelu.forward(&h)
    }
}

impl Module for UpsampleBlock {
    fn parameters(&self) -> Vec<Var> {
        [self.conv.parameters(), self.prelu.parameters()].concat()
    }
}

/// 生成器
///
/// 结构：conv9 + PReLU -> 若干残差块 -> conv3 + BN（与第一层输出相加）
/// -> 2 个 ×2 上采样块 -> conv9（3 通道）-> (tanh(x) + 1) / 2
#[derive(Debug)]
pub struct Generator {
    head: Conv2d,
    head_act: PRelu,
    residuals: Vec<ResidualBlock>,
    trunk_conv: Conv2d,
    trunk_bn: BatchNorm2d,
    upsamples: Vec<UpsampleBlock>,
    tail: Conv2d,
}

impl Generator {
    pub fn new(graph: &Graph, config: GeneratorConfig) -> Result<Self, GraphError> {
        let c = config.channels;
        let residuals = (0..config.residual_blocks)
            .map(|i| ResidualBlock::new(graph, c, &format!("generator.residual{}", i + 1)))
            .collect::<Result<Vec<_>, _>>()?;
        // 每块放大 2 倍
        let upsample_count = UPSCALE_FACTOR.trailing_zeros() as usize;
        let upsamples = (0..upsample_count)
            .map(|i| UpsampleBlock::new(graph, c, 2, &format!("generator.upsample{}", i + 1)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            head: Conv2d::new(graph, 3, c, 9, 1, 4, true, "generator.head.conv")?,
            head_act: PRelu::new(graph, 1, "generator.head.prelu")?,
            residuals,
            trunk_conv: Conv2d::new(graph, c, c, 3, 1, 1, true, "generator.trunk.conv")?,
            trunk_bn: BatchNorm2d::new(graph, c, "generator.trunk.bn")?,
            upsamples,
            tail: Conv2d::new(graph, c, 3, 9, 1, 4, true, "generator.tail.conv")?,
        })
    }

    /// 前向传播
    ///
    /// 输入: [N, 3, h, w] 的低分辨率图像
    /// 输出: [N, 3, 4h, 4w] 的超分辨率图像（值域 [0, 1]）
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let head = self.head_act.forward(&self.head.forward(x)?)?;

        let mut h = head.clone();
        for block in &self.residuals {
            h = block.forward(&h)?;
        }
        let trunk = self.trunk_bn.forward(&self.trunk_conv.forward(&h)?)?;

        let mut h = head.try_add(&trunk)?;
        for block in &self.upsamples {
            h = block.forward(&h)?;
        }
        let out = self.tail.forward(&h)?;
        Ok(out.tanh().add_scalar(1.0).scale(0.5))
    }
}

impl Module for Generator {
    fn parameters(&self) -> Vec<Var> {
        let mut params = [self.head.parameters(), self.head_act.parameters()].concat();
        for block in &self.residuals {
            params.extend(block.parameters());
        }
        params.extend(self.trunk_conv.parameters());
        params.extend(self.trunk_bn.parameters());
        for block in &self.upsamples {
            params.extend(block.parameters());
        }
        params.extend(self.tail.parameters());
        params
    }

    fn buffers(&self) -> Vec<Buffer> {
        let mut buffers: Vec<Buffer> = self.residuals.iter().flat_map(Module::buffers).collect();
        buffers.extend(self.trunk_bn.buffers());
        buffers
    }
}
