/*
 * @Date         : 2026-02-06
 * @Description  : Var 扩展 trait 模块
 *
 * 按功能领域组织 Var 的扩展方法，用户按需 import。
 *
 * # 模块结构
 * - `activation`: 激活函数（leaky_relu, prelu, sigmoid, tanh）
 * - `loss`: 损失函数（mse_loss, bce_loss, tv_loss）
 * - `shape`: 形状变换（pixel_shuffle, global_avg_pool, reshape）
 *
 * # 使用示例
 * ```ignore
 * use srgan::nn::{Var, VarActivationOps, VarLossOps, VarShapeOps};
 *
 * let up = conv_out.pixel_shuffle(2)?.prelu(&weight)?;
 * let loss = sr.mse_loss(&hr)?;
 * ```
 */

mod activation;
mod loss;
mod shape;

pub use activation::VarActivationOps;
pub use loss::VarLossOps;
pub use shape::VarShapeOps;
