/*
 * @Date         : 2026-02-06
 * @Description  : 激活函数节点：LeakyReLU、PReLU、Sigmoid、Tanh
 */

use super::TraitOp;
use crate::nn::graph::GraphError;
use crate::nn::var::Var;
use crate::tensor::Tensor;

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓LeakyReLU↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// y = x (x > 0)，y = slope * x (x <= 0)
pub(crate) struct LeakyReluOp {
    input: Tensor,
    slope: f32,
}

impl LeakyReluOp {
    pub(crate) fn forward(x: &Var, slope: f32) -> Var {
        let input = x.value();
        let value = input.map(|v| if v > 0.0 { v } else { slope * v });
        Var::from_op(vec![x.clone()], value, Self { input, slope }, "leaky_relu")
    }
}

impl TraitOp for LeakyReluOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let slope = self.slope;
        Ok(vec![needs_grad[0].then(|| {
            upstream.zip_map(&self.input, |g, x| if x > 0.0 { g } else { slope * g })
        })])
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓PReLU↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// 斜率可学习的 LeakyReLU：权重长度为 1（所有通道共享）或 C（逐通道）
///
/// 父节点：[输入 `[N, C, ...]`, 权重]
pub(crate) struct PReluOp {
    input: Tensor,
    weight: Vec<f32>,
}

impl PReluOp {
    pub(crate) fn forward(x: &Var, weight: &Var) -> Result<Var, GraphError> {
        x.assert_same_graph(weight)?;
        let input = x.value();
        let weight_values = weight.value().to_vec();
        let shape = input.shape().to_vec();
        let channels = if shape.len() >= 2 { shape[1] } else { 1 };
        if weight_values.len() != 1 && weight_values.len() != channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![channels],
                got: weight.shape(),
                message: "PReLU 权重长度必须为 1 或等于输入通道数".to_string(),
            });
        }

        let inner: usize = shape.iter().skip(2).product();
        let data: Vec<f32> = input
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                if v > 0.0 {
                    v
                } else {
                    weight_values[channel_of(i, inner, channels, weight_values.len())] * v
                }
            })
            .collect();
        let value = Tensor::new(&data, &shape);
        Ok(Var::from_op(
            vec![x.clone(), weight.clone()],
            value,
            Self {
                input,
                weight: weight_values,
            },
            "prelu",
        ))
    }
}

/// 按行优先展开后第 `flat` 个元素对应的权重下标
fn channel_of(flat: usize, inner: usize, channels: usize, weight_len: usize) -> usize {
    if weight_len == 1 {
        0
    } else {
        (flat / inner.max(1)) % channels
    }
}

impl TraitOp for PReluOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let shape = self.input.shape();
        let channels = if shape.len() >= 2 { shape[1] } else { 1 };
        let inner: usize = shape.iter().skip(2).product();
        let weight_len = self.weight.len();

        let x = self.input.to_vec();
        let g = upstream.to_vec();

        let grad_input = needs_grad[0].then(|| {
            let data: Vec<f32> = x
                .iter()
                .zip(&g)
                .enumerate()
                .map(|(i, (&xv, &gv))| {
                    if xv > 0.0 {
                        gv
                    } else {
                        self.weight[channel_of(i, inner, channels, weight_len)] * gv
                    }
                })
                .collect();
            Tensor::new(&data, shape)
        });

        let grad_weight = needs_grad[1].then(|| {
            let mut acc = vec![0.0f32; weight_len];
            for (i, (&xv, &gv)) in x.iter().zip(&g).enumerate() {
                if xv <= 0.0 {
                    acc[channel_of(i, inner, channels, weight_len)] += gv * xv;
                }
            }
            Tensor::new(&acc, &[weight_len])
        });

        Ok(vec![grad_input, grad_weight])
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓Sigmoid / Tanh↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

pub(crate) struct SigmoidOp;

impl SigmoidOp {
    pub(crate) fn forward(x: &Var) -> Var {
        let value = x.with_value(|v| v.map(stable_sigmoid));
        Var::from_op(vec![x.clone()], value, Self, "sigmoid")
    }
}

/// 数值稳定的 sigmoid（避免 exp 溢出）
fn stable_sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl TraitOp for SigmoidOp {
    fn backward(
        &self,
        upstream: &Tensor,
        output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![needs_grad[0].then(|| {
            upstream.zip_map(output, |g, y| g * y * (1.0 - y))
        })])
    }
}

pub(crate) struct TanhOp;

impl TanhOp {
    pub(crate) fn forward(x: &Var) -> Var {
        let value = x.with_value(|v| v.map(f32::tanh));
        Var::from_op(vec![x.clone()], value, Self, "tanh")
    }
}

impl TraitOp for TanhOp {
    fn backward(
        &self,
        upstream: &Tensor,
        output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![needs_grad[0].then(|| {
            upstream.zip_map(output, |g, y| g * (1.0 - y * y))
        })])
    }
}
