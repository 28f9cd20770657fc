/*
 * @Date         : 2026-02-06
 * @Description  : 形状变换节点：PixelShuffle（亚像素上采样）、全局平均池化、Reshape
 */

use super::{TraitOp, expect_4d};
use crate::nn::graph::GraphError;
use crate::nn::var::Var;
use crate::tensor::Tensor;

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓PixelShuffle↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// [N, C*r*r, H, W] -> [N, C, H*r, W*r]
///
/// 输出 (c, h*r+i, w*r+j) 取自输入通道 c*r*r + i*r + j 的 (h, w)
pub(crate) struct PixelShuffleOp {
    factor: usize,
    input_shape: [usize; 4],
}

impl PixelShuffleOp {
    pub(crate) fn forward(x: &Var, factor: usize) -> Result<Var, GraphError> {
        let input_shape = expect_4d(&x.shape(), "PixelShuffle")?;
        let [n, c, h, w] = input_shape;
        if factor == 0 || c % (factor * factor) != 0 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![factor * factor],
                got: vec![c],
                message: format!("PixelShuffle 输入通道数 {c} 必须能被 {factor}² 整除"),
            });
        }
        let out_c = c / (factor * factor);
        let value = x.with_value(|v| {
            v.reshape(&[n, out_c, factor, factor, h, w])
                .permute(&[0, 1, 4, 2, 5, 3])
                .reshape(&[n, out_c, h * factor, w * factor])
        });
        Ok(Var::from_op(
            vec![x.clone()],
            value,
            Self {
                factor,
                input_shape,
            },
            "pixel_shuffle",
        ))
    }
}

impl TraitOp for PixelShuffleOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let r = self.factor;
        let [n, c, h, w] = self.input_shape;
        Ok(vec![needs_grad[0].then(|| {
            upstream
                .reshape(&[n, c / (r * r), h, r, w, r])
                .permute(&[0, 1, 3, 5, 2, 4])
                .reshape(&self.input_shape)
        })])
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓全局平均池化↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// [N, C, H, W] -> [N, C, 1, 1]
pub(crate) struct GlobalAvgPoolOp {
    input_shape: [usize; 4],
}

impl GlobalAvgPoolOp {
    pub(crate) fn forward(x: &Var) -> Result<Var, GraphError> {
        let input_shape = expect_4d(&x.shape(), "GlobalAvgPool")?;
        let [n, c, h, w] = input_shape;
        let spatial = h * w;
        if spatial == 0 {
            return Err(GraphError::InvalidOperation(
                "GlobalAvgPool 的输入空间尺寸不能为 0".to_string(),
            ));
        }
        let data = x.value().to_vec();
        let pooled: Vec<f32> = data
            .chunks(spatial)
            .map(|plane| plane.iter().sum::<f32>() / spatial as f32)
            .collect();
        Ok(Var::from_op(
            vec![x.clone()],
            Tensor::new(&pooled, &[n, c, 1, 1]),
            Self { input_shape },
            "global_avg_pool",
        ))
    }
}

impl TraitOp for GlobalAvgPoolOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        let [_, _, h, w] = self.input_shape;
        let spatial = h * w;
        Ok(vec![needs_grad[0].then(|| {
            let data: Vec<f32> = upstream
                .to_vec()
                .into_iter()
                .flat_map(|g| std::iter::repeat_n(g / spatial as f32, spatial))
                .collect();
            Tensor::new(&data, &self.input_shape)
        })])
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓Reshape↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

pub(crate) struct ReshapeOp {
    input_shape: Vec<usize>,
}

impl ReshapeOp {
    pub(crate) fn forward(x: &Var, shape: &[usize]) -> Result<Var, GraphError> {
        let input_shape = x.shape();
        let input_size: usize = input_shape.iter().product();
        if input_size != shape.iter().product::<usize>() {
            return Err(GraphError::ShapeMismatch {
                expected: input_shape,
                got: shape.to_vec(),
                message: "Reshape 前后元素总数必须一致".to_string(),
            });
        }
        let value = x.with_value(|v| v.reshape(shape));
        Ok(Var::from_op(
            vec![x.clone()],
            value,
            Self { input_shape },
            "reshape",
        ))
    }
}

impl TraitOp for ReshapeOp {
    fn backward(
        &self,
        upstream: &Tensor,
        _output: &Tensor,
        needs_grad: &[bool],
    ) -> Result<Vec<Option<Tensor>>, GraphError> {
        Ok(vec![
            needs_grad[0].then(|| upstream.reshape(&self.input_shape)),
        ])
    }
}
