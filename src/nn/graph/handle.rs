/*
 * @Date         : 2026-02-05
 * @Description  : Graph 句柄（用户级 API）
 */

use super::error::GraphError;
use super::inner::GraphInner;
use crate::nn::var::{Init, NodeKind, Var};
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::rc::Rc;

/// Graph - 计算图句柄（PyTorch 风格用户 API）
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用；Var 之间的运算即时求值并记录反向传播所需信息
///
/// # 使用示例
/// ```ignore
/// let graph = Graph::new_with_seed(42);
/// let w = graph.parameter(&[1], Init::Constant(0.25), "w")?;
/// let x = graph.input(&Tensor::new(&[2.0], &[1]));
/// let loss = (&w * 3.0).mse_loss(&x)?;
/// loss.backward()?;
/// ```
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// 创建新图（参数初始化使用随机种子）
    pub fn new() -> Self {
        Self::from_inner(GraphInner::new())
    }

    /// 创建带种子的图（用于确定性训练）
    pub fn new_with_seed(seed: u64) -> Self {
        Self::from_inner(GraphInner::new_with_seed(seed))
    }

    fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// 获取内部 Rc
    pub(crate) fn inner_rc(&self) -> Rc<RefCell<GraphInner>> {
        Rc::clone(&self.inner)
    }

    // ==================== 创建变量 ====================

    /// 创建输入节点（不参与求导的叶子节点）
    pub fn input(&self, data: &Tensor) -> Var {
        let id = self.inner.borrow_mut().next_node_id();
        Var::leaf(id, "input", NodeKind::Input, data.clone(), self.inner_rc())
    }

    /// 创建参数节点（可训练的叶子节点），参数名在同一个图内必须唯一
    pub fn parameter(&self, shape: &[usize], init: Init, name: &str) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        g.register_parameter_name(name)?;
        let value = init.generate_with_rng(shape, g.rng_mut());
        let id = g.next_node_id();
        drop(g);
        Ok(Var::leaf(id, name, NodeKind::Parameter, value, self.inner_rc()))
    }

    // ==================== 模式 ====================

    /// 切换到训练模式（BatchNorm 使用批统计量并更新滑动统计量）
    pub fn train(&self) {
        self.inner.borrow_mut().set_train_mode();
    }

    /// 切换到评估模式（BatchNorm 使用滑动统计量）
    pub fn eval(&self) {
        self.inner.borrow_mut().set_eval_mode();
    }

    pub fn is_train_mode(&self) -> bool {
        self.inner.borrow().is_train_mode()
    }

    pub fn is_grad_enabled(&self) -> bool {
        self.inner.borrow().is_grad_enabled()
    }

    /// no_grad 上下文：闭包内的运算不记录反向传播信息（推理时省内存）
    pub fn no_grad<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let previous = self.inner.borrow_mut().set_grad_enabled(false);
        let result = f();
        self.inner.borrow_mut().set_grad_enabled(previous);
        result
    }
}
