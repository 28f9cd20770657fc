/*
 * @Date         : 2026-02-10
 * @Description  : 梯度健康检查：参数梯度均值过大时发出警告并终止训练
 */

use crate::nn::Module;
use tracing::warn;

/// 梯度均值的阈值
pub const GRAD_THRESHOLD: f32 = 100.0;

/// 一次梯度检查的统计结果
///
/// 对每个已有梯度的参数取梯度均值，再对这些均值求平均值与最大值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientHealth {
    /// 参与统计的参数个数
    pub count: usize,
    pub mean: f32,
    pub max: f32,
    healthy: bool,
}

impl GradientHealth {
    /// 由各参数的梯度均值计算
    ///
    /// 没有梯度或所有均值都为 0 时视为健康。
    pub fn from_means(means: &[f32], threshold: f32) -> Self {
        if means.iter().all(|&m| m == 0.0) {
            return Self {
                count: means.len(),
                mean: 0.0,
                max: 0.0,
                healthy: true,
            };
        }
        let mean = means.iter().sum::<f32>() / means.len() as f32;
        let max = means.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Self {
            count: means.len(),
            mean,
            max,
            healthy: !(mean > threshold || max > threshold),
        }
    }

    pub const fn is_healthy(&self) -> bool {
        self.healthy
    }
}

/// 检查模型当前的参数梯度（backward 之后、step 之前调用）
///
/// 只给出建议，不裁剪也不缩放梯度。
pub fn check_grads(model: &impl Module, name: &str) -> GradientHealth {
    let means: Vec<f32> = model
        .parameters()
        .iter()
        .filter_map(|p| p.grad().map(|g| g.mean()))
        .collect();
    let health = GradientHealth::from_means(&means, GRAD_THRESHOLD);
    if !health.is_healthy() {
        if health.mean > GRAD_THRESHOLD {
            warn!("{name} 的梯度均值 {:.3} 超过 {GRAD_THRESHOLD}", health.mean);
        } else {
            warn!("{name} 的梯度最大值 {:.3} 超过 {GRAD_THRESHOLD}", health.max);
        }
    }
    health
}
