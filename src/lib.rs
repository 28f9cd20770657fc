//! # SRGAN
//!
//! 用纯rust实现的[SRGAN](https://arxiv.org/abs/1609.04802)（4倍超分辨率生成对抗网络）训练器：
//! 自带的动态计算图与自动微分（`nn`），生成器/判别器（`model`），图像数据管线（`data`），
//! PSNR/SSIM 评估（`metrics`），以及带检查点续训、梯度健康检查与可视化输出的训练流程（`train`）。
//!

pub mod data;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod nn;
pub mod tensor;
pub mod train;
pub mod utils;
