/*
 * @Date         : 2026-02-06
 * @Description  : Var 形状变换扩展 trait
 */

use crate::nn::nodes::{GlobalAvgPoolOp, PixelShuffleOp, ReshapeOp};
use crate::nn::{GraphError, Var};

/// 形状变换扩展 trait
pub trait VarShapeOps {
    /// 亚像素上采样：[N, C*r*r, H, W] -> [N, C, H*r, W*r]
    fn pixel_shuffle(&self, factor: usize) -> Result<Var, GraphError>;

    /// 全局平均池化：[N, C, H, W] -> [N, C, 1, 1]
    fn global_avg_pool(&self) -> Result<Var, GraphError>;

    /// 改变形状（元素总数不变）
    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError>;
}

impl VarShapeOps for Var {
    fn pixel_shuffle(&self, factor: usize) -> Result<Var, GraphError> {
        PixelShuffleOp::forward(self, factor)
    }

    fn global_avg_pool(&self) -> Result<Var, GraphError> {
        GlobalAvgPoolOp::forward(self)
    }

    fn reshape(&self, shape: &[usize]) -> Result<Var, GraphError> {
        ReshapeOp::forward(self, shape)
    }
}
