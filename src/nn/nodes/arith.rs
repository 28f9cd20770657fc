/*
 * @Date         : 2026-02-06
 * @Description  : 逐元素加减与标量缩放
 */

use super::TraitOp;
use crate::nn::graph::GraphError;
use crate::tensor::Tensor;

fn pass_through(upstream: &Tensor, needs_grad: &[bool], signs: &[f32]) -> Vec<Option<Tensor>> {
    needs_grad
        .iter()
        .zip(signs)
        .map(|(&needed, &sign)| {
            needed.then(|| {
                if sign == 1.0 {
                    upstream.clone()
                } else {
                    upstream * sign
                }
            })
        })
        .collect()
}

/// a + b（形状必须一致）
pub(crate) struct AddOp;

impl TraitOp for AddOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(pass_through(upstream, needs_grad, &[1.0, 1.0]))
    }
}

/// a - b（形状必须一致）
pub(crate) struct SubOp;

impl TraitOp for SubOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(pass_through(upstream, needs_grad, &[1.0, -1.0]))
    }
}

/// x * k
pub(crate) struct ScaleOp {
    factor: f32,
}

impl ScaleOp {
    pub(crate) const fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl TraitOp for ScaleOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(pass_through(upstream, needs_grad, &[self.factor]))
    }
}

/// x + c
pub(crate) struct AddScalarOp;

impl TraitOp for AddScalarOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(pass_through(upstream, needs_grad, &[1.0]))
    }
}
