/*
 * @Date         : 2026-02-06
 * @Description  : BatchNorm2d 层（含滑动均值/方差缓冲区）
 *
 * 训练模式（`graph.train()`）：用当前 batch 统计量归一化，并更新滑动统计量
 *   running = (1 - momentum) * running + momentum * batch（方差取无偏估计）
 * 评估模式（`graph.eval()`）：用滑动统计量归一化
 */

use crate::nn::nodes::batch_norm;
use crate::nn::{Buffer, Graph, GraphError, Init, Module, Var};
use crate::tensor::Tensor;

const DEFAULT_MOMENTUM: f32 = 0.1;
const DEFAULT_EPS: f32 = 1e-5;

/// BatchNorm2d 层
#[derive(Debug)]
pub struct BatchNorm2d {
    /// 缩放参数 γ [C]，初始为 1
    gamma: Var,
    /// 平移参数 β [C]，初始为 0
    beta: Var,
    running_mean: Buffer,
    running_var: Buffer,
    momentum: f32,
    eps: f32,
}

impl BatchNorm2d {
    pub fn new(graph: &Graph, num_features: usize, name: &str) -> Result<Self, GraphError> {
        let gamma = graph.parameter(&[num_features], Init::Ones, &format!("{name}.weight"))?;
        let beta = graph.parameter(&[num_features], Init::Zeros, &format!("{name}.bias"))?;
        Ok(Self {
            gamma,
            beta,
            running_mean: Buffer::new(
                &format!("{name}.running_mean"),
                Tensor::zeros(&[num_features]),
            ),
            running_var: Buffer::new(
                &format!("{name}.running_var"),
                Tensor::ones(&[num_features]),
            ),
            momentum: DEFAULT_MOMENTUM,
            eps: DEFAULT_EPS,
        })
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let training = x.graph().borrow().is_train_mode();
        let out = batch_norm(
            x,
            &self.gamma,
            &self.beta,
            &self.running_mean.value(),
            &self.running_var.value(),
            training,
            self.eps,
        )?;
        if let Some((mean, var)) = out.batch_stats {
            let m = self.momentum;
            self.running_mean
                .set_value(&(self.running_mean.value() * (1.0 - m) + mean * m))?;
            self.running_var
                .set_value(&(self.running_var.value() * (1.0 - m) + var * m))?;
        }
        Ok(out.output)
    }

    pub const fn running_mean(&self) -> &Buffer {
        &self.running_mean
    }

    pub const fn running_var(&self) -> &Buffer {
        &self.running_var
    }
}

impl Module for BatchNorm2d {
    fn parameters(&self) -> Vec<Var> {
        vec![self.gamma.clone(), self.beta.clone()]
    }

    fn buffers(&self) -> Vec<Buffer> {
        vec![self.running_mean.clone(), self.running_var.clone()]
    }
}
