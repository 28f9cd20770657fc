/*
 * @Date         : 2026-02-06
 * @Description  : 优化器模块，实现 PyTorch 风格的梯度优化算法
 */

mod adam;

pub use adam::{Adam, AdamState};

use crate::nn::{GraphError, Var};

/// Optimizer trait（PyTorch 风格）
///
/// # 设计要点
/// - Optimizer 绑定特定参数（通过 Var），GAN 中 G 和 D 各用一个
/// - `backward()` 计算所有参数的梯度（由 Var 调用）
/// - `step()` 只更新 Optimizer 绑定的参数
///
/// # 使用示例
/// ```ignore
/// let mut optimizer = Adam::new(&model.parameters(), 1e-3);
///
/// optimizer.zero_grad();
/// let loss = model.forward(&x)?.mse_loss(&y)?;
/// loss.backward()?;
/// optimizer.step()?;
///
/// // 或者一步完成
/// let loss_val = optimizer.minimize(&loss)?;
/// ```
pub trait Optimizer {
    /// 清零所有绑定参数的梯度
    fn zero_grad(&mut self);

    /// 更新参数（只更新有梯度的绑定参数）
    fn step(&mut self) -> Result<(), GraphError>;

    /// 一步完成：zero_grad + backward + step
    ///
    /// # 返回
    /// loss 的标量值
    fn minimize(&mut self, loss: &Var) -> Result<f32, GraphError> {
        self.zero_grad();
        let loss_val = loss.backward()?;
        self.step()?;
        Ok(loss_val)
    }

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, lr: f32);

    /// 重置累积状态（如 Adam 的动量）
    fn reset(&mut self);
}
