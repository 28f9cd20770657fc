/*
 * @Date         : 2026-02-06
 * @Description  : Var 损失函数扩展 trait
 *
 * 所有损失均返回标量 Var，可直接调用 `backward()`。
 */

use crate::nn::nodes::{BceLossOp, MseLossOp, TvLossOp};
use crate::nn::{GraphError, Var};

/// 损失函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use srgan::nn::{Var, VarLossOps};
///
/// let image_loss = sr.mse_loss(&hr)?;
/// let adv = fake_prob.bce_loss(&real_label)?;
/// let tv = sr.tv_loss()?;
/// ```
pub trait VarLossOps {
    /// 均方误差：mean((self - target)²)
    fn mse_loss(&self, target: &Var) -> Result<Var, GraphError>;

    /// 二元交叉熵（self 为概率，target 为标签，均在 [0, 1]）
    fn bce_loss(&self, target: &Var) -> Result<Var, GraphError>;

    /// 总变差损失（输入 [N, C, H, W]）
    fn tv_loss(&self) -> Result<Var, GraphError>;
}

impl VarLossOps for Var {
    fn mse_loss(&self, target: &Var) -> Result<Var, GraphError> {
        MseLossOp::forward(self, target)
    }

    fn bce_loss(&self, target: &Var) -> Result<Var, GraphError> {
        BceLossOp::forward(self, target)
    }

    fn tv_loss(&self) -> Result<Var, GraphError> {
        TvLossOp::forward(self)
    }
}
