/*
 * @Date         : 2026-02-10
 * @Description  : SRGAN 训练流程
 *
 * - 预训练（pretrain.rs）：全新训练时只用 MSE 训练生成器
 * - 对抗训练（adversarial.rs）：D/G 交替更新，带梯度健康检查
 * - 验证（validation.rs）：PSNR/SSIM 与可视化
 * - 检查点（checkpoint.rs）：断点续训
 */

mod adversarial;
pub mod checkpoint;
mod config;
mod device;
mod error;
pub mod grad_check;
pub mod metrics;
mod pretrain;
mod session;
mod validation;

pub use adversarial::{AdversarialStep, StepLosses, StepOutcome};
pub use checkpoint::{CheckpointError, CheckpointManager, CheckpointTag, Component};
pub use config::TrainConfig;
pub use device::DeviceClass;
pub use error::TrainError;
pub use grad_check::{GRAD_THRESHOLD, GradientHealth, check_grads};
pub use metrics::{EpochMetrics, JsonlMetricsSink, MemoryMetricsSink, MetricRecord, MetricsSink};
pub use session::{Network, TrainOutcome, TrainingSession};
pub use validation::{ValidationReport, VisualizationBuffer, clamp_psnr};

#[cfg(test)]
mod tests;
