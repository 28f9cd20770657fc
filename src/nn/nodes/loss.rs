/*
 * @Date         : 2026-02-06
 * @Description  : 损失节点：MSE、BCE、总变差（TV）。输出均为标量 `[]`
 */

use super::{TraitOp, expect_4d, upstream_scalar};
use crate::nn::graph::GraphError;
use crate::nn::var::Var;
use crate::tensor::Tensor;

fn check_pair(input: &Var, target: &Var, what: &str) -> Result<(), GraphError> {
    input.assert_same_graph(target)?;
    let (a, b) = (input.shape(), target.shape());
    if a != b {
        return Err(GraphError::ShapeMismatch {
            expected: a,
            got: b,
            message: format!("{what} 的输入与目标形状必须一致"),
        });
    }
    if a.iter().product::<usize>() == 0 {
        return Err(GraphError::InvalidOperation(format!("{what} 的输入不能为空")));
    }
    Ok(())
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓MSE↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// mean((input - target)²)
pub(crate) struct MseLossOp {
    diff: Tensor,
}

impl MseLossOp {
    pub(crate) fn forward(input: &Var, target: &Var) -> Result<Var, GraphError> {
        check_pair(input, target, "MSE 损失")?;
        let diff = input.with_value(|a| target.with_value(|b| a - b));
        let loss = diff.square().mean();
        Ok(Var::from_op(
            vec![input.clone(), target.clone()],
            Tensor::scalar(loss),
            Self { diff },
            "mse_loss",
        ))
    }
}

impl TraitOp for MseLossOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let scale = 2.0 * upstream_scalar(upstream)? / self.diff.size() as f32;
        Ok(vec![
            needs_grad[0].then(|| &self.diff * scale),
            needs_grad[1].then(|| &self.diff * -scale),
        ])
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓BCE↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// 对数项的下限（与 `PyTorch` 的 BCELoss 一致，避免 log(0) = -inf）
const LOG_FLOOR: f32 = -100.0;

/// -mean(t·ln(p) + (1-t)·ln(1-p))，要求 p ∈ [0, 1]
///
/// 目标视为常量，不对其求导
pub(crate) struct BceLossOp {
    input: Tensor,
    target: Tensor,
}

impl BceLossOp {
    pub(crate) fn forward(input: &Var, target: &Var) -> Result<Var, GraphError> {
        check_pair(input, target, "BCE 损失")?;
        let p = input.value();
        let t = target.value();
        if p.to_vec().iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(GraphError::ComputationError(
                "BCE 损失的输入必须在 [0, 1] 之间".to_string(),
            ));
        }
        let terms = p.zip_map(&t, |p, t| {
            -(t * p.ln().max(LOG_FLOOR) + (1.0 - t) * (1.0 - p).ln().max(LOG_FLOOR))
        });
        Ok(Var::from_op(
            vec![input.clone(), target.clone()],
            Tensor::scalar(terms.mean()),
            Self {
                input: p,
                target: t,
            },
            "bce_loss",
        ))
    }
}

impl TraitOp for BceLossOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let scale = upstream_scalar(upstream)? / self.input.size() as f32;
        Ok(vec![
            needs_grad[0].then(|| {
                self.input.zip_map(&self.target, |p, t| {
                    scale * (p - t) / (p * (1.0 - p)).max(1e-12)
                })
            }),
            None,
        ])
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓TV↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// 总变差损失：2·(h_tv / count_h + w_tv / count_w) / N
///
/// - h_tv、w_tv：纵向、横向相邻像素差的平方和
/// - count_h = C·(H-1)·W，count_w = C·H·(W-1)；为 0 时对应项记为 0
pub(crate) struct TvLossOp {
    input: Tensor,
    h_coef: f32,
    w_coef: f32,
}

impl TvLossOp {
    pub(crate) fn forward(x: &Var) -> Result<Var, GraphError> {
        let [n, c, h, w] = expect_4d(&x.shape(), "TV 损失")?;
        if n == 0 || h == 0 || w == 0 {
            return Err(GraphError::InvalidOperation("TV 损失的输入不能为空".to_string()));
        }
        let count_h = c * h.saturating_sub(1) * w;
        let count_w = c * h * w.saturating_sub(1);
        let coef = |count: usize| {
            if count == 0 {
                0.0
            } else {
                2.0 / (count as f32 * n as f32)
            }
        };
        let op = Self {
            input: x.value(),
            h_coef: coef(count_h),
            w_coef: coef(count_w),
        };

        let mut h_tv = 0.0f32;
        let mut w_tv = 0.0f32;
        op.for_each_neighbor(|a, b, vertical| {
            let d = b - a;
            if vertical {
                h_tv += d * d;
            } else {
                w_tv += d * d;
            }
        });
        let loss = op.h_coef * h_tv + op.w_coef * w_tv;
        Ok(Var::from_op(vec![x.clone()], Tensor::scalar(loss), op, "tv_loss"))
    }

    /// 遍历所有纵向/横向相邻像素对 (a 在上/左，b 在下/右)
    fn for_each_neighbor(&self, mut f: impl FnMut(f32, f32, bool)) {
        let shape = self.input.shape();
        let (h, w) = (shape[2], shape[3]);
        let data = self.input.to_vec();
        for plane in data.chunks(h * w) {
            for y in 0..h {
                for x in 0..w {
                    let v = plane[y * w + x];
                    if y + 1 < h {
                        f(v, plane[(y + 1) * w + x], true);
                    }
                    if x + 1 < w {
                        f(v, plane[y * w + x + 1], false);
                    }
                }
            }
        }
    }
}

impl TraitOp for TvLossOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        if !needs_grad[0] {
            return Ok(vec![None]);
        }
        let up = upstream_scalar(upstream)?;
        let shape = self.input.shape();
        let (h, w) = (shape[2], shape[3]);
        let data = self.input.to_vec();
        let mut grad = vec![0.0f32; data.len()];
        let plane_size = h * w;
        for (plane, g) in data.chunks(plane_size).zip(grad.chunks_mut(plane_size)) {
            for y in 0..h {
                for x in 0..w {
                    let i = y * w + x;
                    if y + 1 < h {
                        let d = 2.0 * self.h_coef * (plane[i + w] - plane[i]);
                        g[i + w] += d;
                        g[i] -= d;
                    }
                    if x + 1 < w {
                        let d = 2.0 * self.w_coef * (plane[i + 1] - plane[i]);
                        g[i + 1] += d;
                        g[i] -= d;
                    }
                }
            }
        }
        let grad = Tensor::new(&grad, shape) * up;
        Ok(vec![Some(grad)])
    }
}
