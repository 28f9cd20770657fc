/*
 * @Date         : 2026-02-08
 * @Description  : SRGAN 模型定义
 *
 * # 架构
 * - Generator: 低分辨率图像 [N,3,h,w] -> 4 倍超分辨率图像 [N,3,4h,4w]（值域 [0, 1]）
 * - Discriminator: 图像 [N,3,H,W] -> 判别为真的概率 [N]
 *
 * 两个网络须建在同一张 Graph 上（G 的输出直接送入 D），参数名分别以
 * `generator.` / `discriminator.` 为前缀。
 */

mod discriminator;
mod generator;

pub use discriminator::{Discriminator, DiscriminatorConfig};
pub use generator::{Generator, GeneratorConfig};

/// 超分辨率放大倍数
pub const UPSCALE_FACTOR: usize = 4;

#[cfg(test)]
mod tests;
