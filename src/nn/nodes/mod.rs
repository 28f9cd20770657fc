/*
 * @Date         : 2026-02-06
 * @Description  : 运算节点：前向即时计算，并保存反向传播（VJP）所需的中间结果
 *
 * 每个运算对应一个 `XxxOp` 结构体，统一通过 `OpNode`（enum_dispatch）存放在 Var 中。
 * 前向由各模块的构造函数完成（`Var::from_op`），反向统一走 `TraitOp::backward`。
 */

mod activation;
mod arith;
mod batch_norm;
mod conv2d;
mod loss;
mod shape;

pub(crate) use activation::{LeakyReluOp, PReluOp, SigmoidOp, TanhOp};
pub(crate) use arith::{AddOp, AddScalarOp, ScaleOp, SubOp};
pub(crate) use batch_norm::{BatchNormOp, batch_norm};
pub(crate) use conv2d::{Conv2dOp, conv2d};
pub(crate) use loss::{BceLossOp, MseLossOp, TvLossOp};
pub(crate) use shape::{GlobalAvgPoolOp, PixelShuffleOp, ReshapeOp};

use super::graph::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub(crate) enum OpNode {
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓基本运算↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    AddOp,
    SubOp,
    ScaleOp,
    AddScalarOp,
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓激活函数↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    LeakyReluOp,
    PReluOp,
    SigmoidOp,
    TanhOp,
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓卷积/归一化↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    Conv2dOp,
    BatchNormOp,
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓形状变换↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    PixelShuffleOp,
    GlobalAvgPoolOp,
    ReshapeOp,
    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓损失函数↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    MseLossOp,
    BceLossOp,
    TvLossOp,
}

#[enum_dispatch(OpNode)]
pub(crate) trait TraitOp {
    /// 给定本节点输出的上游梯度，计算各父节点的梯度
    ///
    /// - `output`: 本节点前向时的输出值
    /// - `needs_grad`: 与父节点一一对应，为 false 的父节点可返回 None 以跳过计算
    fn backward(
        &self,
        upstream: &Tensor,
        output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError>;
}

/// 标量损失节点的上游梯度（通常为 1）
fn upstream_scalar(upstream: &Tensor) -> Result<f32, GraphError> {
    upstream.number().ok_or_else(|| {
        GraphError::ComputationError(format!(
            "损失节点的上游梯度应为标量，得到形状 {:?}",
            upstream.shape()
        ))
    })
}

/// 检查输入为 4D `[N, C, H, W]`
fn expect_4d(shape: &[usize], what: &str) -> Result<[usize; 4], GraphError> {
    match shape {
        &[n, c, h, w] => Ok([n, c, h, w]),
        _ => Err(GraphError::ShapeMismatch {
            expected: vec![0, 0, 0, 0],
            got: shape.to_vec(),
            message: format!("{what} 的输入必须是 4D [N, C, H, W]"),
        }),
    }
}

