/*
 * @Date         : 2026-02-06
 * @Description  : 2D 批归一化节点（BatchNorm2d）
 *
 * 训练模式：使用当前 batch 在 (N, H, W) 上的均值/方差（有偏）归一化，
 *          并把均值与无偏方差交给调用方更新滑动统计量；
 * 评估模式：使用调用方提供的滑动均值/方差。
 *
 * 父节点：[输入 [N, C, H, W], gamma [C], beta [C]]
 */

use super::{TraitOp, expect_4d};
use crate::nn::graph::GraphError;
use crate::nn::var::Var;
use crate::tensor::Tensor;

/// 批归一化前向结果
pub(crate) struct BatchNormOutput {
    pub(crate) output: Var,
    /// 训练模式下当前 batch 的 (均值, 无偏方差)，各为 [C]；评估模式为 None
    pub(crate) batch_stats: Option<(Tensor, Tensor)>,
}

pub(crate) struct BatchNormOp {
    /// 归一化后的输入（按行优先展开）
    normalized: Vec<f32>,
    inv_std: Vec<f32>,
    gamma: Vec<f32>,
    shape: [usize; 4],
    training: bool,
}

pub(crate) fn batch_norm(
    input: &Var,
    gamma: &Var,
    beta: &Var,
    running_mean: &Tensor,
    running_var: &Tensor,
    training: bool,
    eps: f32,
) -> Result<BatchNormOutput, GraphError> {
    input.assert_same_graph(gamma)?;
    input.assert_same_graph(beta)?;
    let x = input.value().to_vec();
    let shape = expect_4d(&input.shape(), "BatchNorm2d")?;
    let [batch, channels, height, width] = shape;
    let spatial = height * width;
    let count = batch * spatial;

    let gamma_values = gamma.value().to_vec();
    let beta_values = beta.value().to_vec();
    for (name, len) in [
        ("gamma", gamma_values.len()),
        ("beta", beta_values.len()),
        ("running_mean", running_mean.size()),
        ("running_var", running_var.size()),
    ] {
        if len != channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![channels],
                got: vec![len],
                message: format!("BatchNorm2d 的 {name} 长度必须等于通道数"),
            });
        }
    }

    let index = |n: usize, c: usize, p: usize| (n * channels + c) * spatial + p;

    let (mean, var) = if training {
        if count <= 1 {
            return Err(GraphError::InvalidOperation(format!(
                "训练模式下 BatchNorm2d 每个通道需要多于 1 个值，输入形状为 {shape:?}"
            )));
        }
        let mut mean = vec![0.0f32; channels];
        let mut var = vec![0.0f32; channels];
        for c in 0..channels {
            let mut sum = 0.0f64;
            for n in 0..batch {
                for p in 0..spatial {
                    sum += f64::from(x[index(n, c, p)]);
                }
            }
            let m = sum / count as f64;
            let mut sq = 0.0f64;
            for n in 0..batch {
                for p in 0..spatial {
                    let d = f64::from(x[index(n, c, p)]) - m;
                    sq += d * d;
                }
            }
            mean[c] = m as f32;
            var[c] = (sq / count as f64) as f32;
        }
        (mean, var)
    } else {
        (running_mean.to_vec(), running_var.to_vec())
    };

    let inv_std: Vec<f32> = var.iter().map(|v| 1.0 / (v + eps).sqrt()).collect();
    let mut normalized = vec![0.0f32; x.len()];
    let mut out = vec![0.0f32; x.len()];
    for n in 0..batch {
        for c in 0..channels {
            for p in 0..spatial {
                let i = index(n, c, p);
                let x_hat = (x[i] - mean[c]) * inv_std[c];
                normalized[i] = x_hat;
                out[i] = gamma_values[c] * x_hat + beta_values[c];
            }
        }
    }

    let batch_stats = training.then(|| {
        let correction = count as f32 / (count - 1) as f32;
        let unbiased: Vec<f32> = var.iter().map(|v| v * correction).collect();
        (
            Tensor::new(&mean, &[channels]),
            Tensor::new(&unbiased, &[channels]),
        )
    });

    let output = Var::from_op(
        vec![input.clone(), gamma.clone(), beta.clone()],
        Tensor::new(&out, &shape),
        BatchNormOp {
            normalized,
            inv_std,
            gamma: gamma_values,
            shape,
            training,
        },
        "batch_norm",
    );
    Ok(BatchNormOutput {
        output,
        batch_stats,
    })
}

impl TraitOp for BatchNormOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let [batch, channels, height, width] = self.shape;
        let spatial = height * width;
        let count = (batch * spatial) as f32;
        let g = upstream.to_vec();
        let index = |n: usize, c: usize, p: usize| (n * channels + c) * spatial + p;

        let mut sum_g = vec![0.0f32; channels];
        let mut sum_g_xhat = vec![0.0f32; channels];
        for n in 0..batch {
            for c in 0..channels {
                for p in 0..spatial {
                    let i = index(n, c, p);
                    sum_g[c] += g[i];
                    sum_g_xhat[c] += g[i] * self.normalized[i];
                }
            }
        }

        let grad_input = needs_grad[0].then(|| {
            let mut dx = vec![0.0f32; g.len()];
            for n in 0..batch {
                for c in 0..channels {
                    let scale = self.gamma[c] * self.inv_std[c];
                    for p in 0..spatial {
                        let i = index(n, c, p);
                        dx[i] = if self.training {
                            scale / count
                                * (count * g[i] - sum_g[c] - self.normalized[i] * sum_g_xhat[c])
                        } else {
                            scale * g[i]
                        };
                    }
                }
            }
            Tensor::new(&dx, &self.shape)
        });
        let grad_gamma = needs_grad[1].then(|| Tensor::new(&sum_g_xhat, &[channels]));
        let grad_beta = needs_grad[2].then(|| Tensor::new(&sum_g, &[channels]));
        Ok(vec![grad_input, grad_gamma, grad_beta])
    }
}
