/*
 * @Date         : 2026-02-05
 * @Description  : GraphInner train/eval 模式、梯度记录开关
 */

use super::GraphInner;

impl GraphInner {
    pub const fn set_train_mode(&mut self) {
        self.is_eval_mode = false;
    }

    pub const fn set_eval_mode(&mut self) {
        self.is_eval_mode = true;
    }

    pub const fn is_train_mode(&self) -> bool {
        !self.is_eval_mode
    }

    pub const fn is_grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    /// 设置是否记录反向传播信息，返回之前的设置（便于恢复）
    pub(crate) const fn set_grad_enabled(&mut self, enabled: bool) -> bool {
        let previous = self.grad_enabled;
        self.grad_enabled = enabled;
        previous
    }
}
