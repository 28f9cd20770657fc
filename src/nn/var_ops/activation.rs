/*
 * @Date         : 2026-02-06
 * @Description  : Var 激活函数扩展 trait
 *
 * 提供激活函数的链式调用支持，用户需 import 此 trait 后才能使用。
 */

use crate::nn::nodes::{LeakyReluOp, PReluOp, SigmoidOp, TanhOp};
use crate::nn::{GraphError, Var};

/// 激活函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use srgan::nn::{Var, VarActivationOps};
///
/// let h = x.leaky_relu(0.2);
/// let prob = logits.sigmoid();
/// ```
pub trait VarActivationOps {
    /// Sigmoid 激活：1 / (1 + exp(-x))
    fn sigmoid(&self) -> Var;

    /// Tanh 激活
    fn tanh(&self) -> Var;

    /// `LeakyReLU` 激活：x if x > 0 else slope * x
    fn leaky_relu(&self, slope: f32) -> Var;

    /// `PReLU` 激活：斜率为可学习参数 `weight`（长度 1 或等于通道数）
    fn prelu(&self, weight: &Var) -> Result<Var, GraphError>;
}

impl VarActivationOps for Var {
    fn sigmoid(&self) -> Var {
        SigmoidOp::forward(self)
    }

    fn tanh(&self) -> Var {
        TanhOp::forward(self)
    }

    fn leaky_relu(&self, slope: f32) -> Var {
        LeakyReluOp::forward(self, slope)
    }

    fn prelu(&self, weight: &Var) -> Result<Var, GraphError> {
        PReluOp::forward(self, weight)
    }
}
