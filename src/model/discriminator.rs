/*
 * @Date         : 2026-02-08
 * @Description  : SRGAN 判别器
 */

use crate::nn::{
    BatchNorm2d, Buffer, Conv2d, Graph, GraphError, Module, Var, VarActivationOps, VarShapeOps,
};
use serde::{Deserialize, Serialize};

/// `LeakyReLU` 负半轴斜率
const LEAKY_SLOPE: f32 = 0.2;

/// 7 个卷积块的（通道倍数，步长），通道数 = `base_channels` * 倍数
const BLOCK_LAYOUT: [(usize, usize); 7] = [(1, 2), (2, 1), (2, 2), (4, 1), (4, 2), (8, 1), (8, 2)];

/// 判别器宽度配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscriminatorConfig {
    /// 第一层卷积的通道数，后续各块按 1,2,2,4,4,8,8 倍扩展
    pub base_channels: usize,
    /// 全局池化后 1x1 卷积的隐藏通道数
    pub hidden_channels: usize,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            base_channels: 64,
            hidden_channels: 1024,
        }
    }
}

#[derive(Debug)]
struct ConvBlock {
    conv: Conv2d,
    bn: BatchNorm2d,
}

/// 判别器
///
/// 结构：conv3 + `LeakyReLU` -> 7 个 (conv3 + BN + `LeakyReLU`) -> 全局平均池化
/// -> conv1（hidden）+ `LeakyReLU` -> conv1（1）-> sigmoid
#[derive(Debug)]
pub struct Discriminator {
    head: Conv2d,
    blocks: Vec<ConvBlock>,
    dense1: Conv2d,
    dense2: Conv2d,
}

impl Discriminator {
    pub fn new(graph: &Graph, config: DiscriminatorConfig) -> Result<Self, GraphError> {
        let base = config.base_channels;
        let mut blocks = Vec::with_capacity(BLOCK_LAYOUT.len());
        let mut in_channels = base;
        for (i, &(multiple, stride)) in BLOCK_LAYOUT.iter().enumerate() {
            let out_channels = base * multiple;
            let name = format!("discriminator.block{}", i + 1);
            blocks.push(ConvBlock {
                conv: Conv2d::new(
                    graph,
                    in_channels,
                    out_channels,
                    3,
                    stride,
                    1,
                    true,
                    &format!("{name}.conv"),
                )?,
                bn: BatchNorm2d::new(graph, out_channels, &format!("{name}.bn"))?,
            });
            in_channels = out_channels;
        }

        Ok(Self {
            head: Conv2d::new(graph, 3, base, 3, 1, 1, true, "discriminator.head.conv")?,
            blocks,
            dense1: Conv2d::new(
                graph,
                in_channels,
                config.hidden_channels,
                1,
                1,
                0,
                true,
                "discriminator.dense1.conv",
            )?,
            dense2: Conv2d::new(
                graph,
                config.hidden_channels,
                1,
                1,
                1,
                0,
                true,
                "discriminator.dense2.conv",
            )?,
        })
    }

    /// 前向传播
    ///
    /// 输入: [N, 3, H, W] 的图像
    /// 输出: [N] 的判别概率（经过 sigmoid，值域 [0, 1]）
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let mut h = self.head.forward(x)?.leaky_relu(LEAKY_SLOPE);
        let batch_size = h.shape()[0];
        for block in &self.blocks {
            h = block.bn.forward(&block.conv.forward(&h)?)?.leaky_relu(LEAKY_SLOPE);
        }
        let h = h.global_avg_pool()?;
        let h = self.dense1.forward(&h)?.leaky_relu(LEAKY_SLOPE);
        let logits = self.dense2.forward(&h)?;
        logits.sigmoid().reshape(&[batch_size])
    }
}

impl Module for Discriminator {
    fn parameters(&self) -> Vec<Var> {
        let mut params = self.head.parameters();
        for block in &self.blocks {
            params.extend(block.conv.parameters());
            params.extend(block.bn.parameters());
        }
        params.extend(self.dense1.parameters());
        params.extend(self.dense2.parameters());
        params
    }

    fn buffers(&self) -> Vec<Buffer> {
        self.blocks.iter().flat_map(|b| b.bn.buffers()).collect()
    }
}
