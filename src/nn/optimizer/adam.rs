/*
 * @Date         : 2026-02-06
 * @Description  : Adam优化器实现
 */

use super::Optimizer;
use crate::nn::{GraphError, Var};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Adam 的完整内部状态（可序列化，用于断点续训）
///
/// 一阶/二阶矩按参数名索引，因此只要参数名一致，新建的模型也能接上旧状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamState {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// 时间步
    pub t: u64,
    /// 一阶矩估计
    pub m: BTreeMap<String, Tensor>,
    /// 二阶矩估计
    pub v: BTreeMap<String, Tensor>,
}

/// Adam 优化器（PyTorch 风格）
///
/// Adam: Adaptive Moment Estimation
/// - m = β1 * m + (1 - β1) * g
/// - v = β2 * v + (1 - β2) * g²
/// - θ = θ - α * m_hat / (√v_hat + ε)
///
/// # 使用示例
/// ```ignore
/// let mut optimizer_g = Adam::new(&generator.parameters(), 1e-3);
/// optimizer_g.zero_grad();
/// g_loss.backward()?;
/// optimizer_g.step()?;
/// ```
pub struct Adam {
    /// 要优化的参数
    params: Vec<Var>,
    state: AdamState,
}

impl Adam {
    /// 默认学习率（与 `PyTorch` 的 `optim.Adam` 一致）
    pub const DEFAULT_LR: f32 = 1e-3;

    /// 创建 Adam 优化器（β1 = 0.9，β2 = 0.999，ε = 1e-8）
    pub fn new(params: &[Var], lr: f32) -> Self {
        Self::with_config(params, lr, 0.9, 0.999, 1e-8)
    }

    /// 创建带完整配置的 Adam 优化器
    pub fn with_config(params: &[Var], lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            params: params.to_vec(),
            state: AdamState {
                lr,
                beta1,
                beta2,
                epsilon,
                t: 0,
                m: BTreeMap::new(),
                v: BTreeMap::new(),
            },
        }
    }

    /// 已执行的更新步数
    pub const fn step_count(&self) -> u64 {
        self.state.t
    }

    /// 导出内部状态
    pub fn state_dict(&self) -> AdamState {
        self.state.clone()
    }

    /// 恢复内部状态；矩估计中出现的参数名必须都是本优化器绑定的参数，且形状一致
    pub fn load_state_dict(&mut self, state: AdamState) -> Result<(), GraphError> {
        for (name, moment) in state.m.iter().chain(state.v.iter()) {
            let param = self
                .params
                .iter()
                .find(|p| p.name() == name)
                .ok_or_else(|| {
                    GraphError::InvalidOperation(format!(
                        "优化器状态中的参数“{name}”不属于本优化器"
                    ))
                })?;
            let shape = param.shape();
            if shape != moment.shape() {
                return Err(GraphError::ShapeMismatch {
                    expected: shape,
                    got: moment.shape().to_vec(),
                    message: format!("参数“{name}”的矩估计形状不符"),
                });
            }
        }
        self.state = state;
        Ok(())
    }
}

impl Optimizer for Adam {
    fn zero_grad(&mut self) {
        for p in &self.params {
            p.zero_grad();
        }
    }

    fn step(&mut self) -> Result<(), GraphError> {
        self.state.t += 1;
        let AdamState {
            lr,
            beta1,
            beta2,
            epsilon,
            t,
            m: ref mut first_moments,
            v: ref mut second_moments,
        } = self.state;
        let t = i32::try_from(t).unwrap_or(i32::MAX);

        for param in &self.params {
            let Some(grad) = param.grad() else {
                continue;
            };
            let name = param.name().to_string();

            // 更新一阶矩
            let m = first_moments
                .entry(name.clone())
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *m *= beta1;
            *m += &(&grad * (1.0 - beta1));

            // 更新二阶矩
            let v = second_moments.entry(name).or_insert_with(|| Tensor::zeros(grad.shape()));
            *v *= beta2;
            *v += &(&grad.square() * (1.0 - beta2));

            // 偏差修正
            let m_hat = &*m / (1.0 - beta1.powi(t));
            let v_hat = &*v / (1.0 - beta2.powi(t));

            // 更新参数
            let update = &m_hat / &(v_hat.sqrt() + epsilon);
            let new_value = param.value() - &update * lr;
            param.set_value(&new_value)?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.state.lr
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.state.lr = lr;
    }

    fn reset(&mut self) {
        self.state.m.clear();
        self.state.v.clear();
        self.state.t = 0;
    }
}
