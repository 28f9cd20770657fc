/*
 * @Date         : 2026-02-06
 * @Description  : Module trait 定义，以及不可训练的状态缓冲区 Buffer
 */

use super::{GraphError, StateDict, Var};
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - `parameters()` 返回 `Vec<Var>`（签名一致，放入 trait）
/// - 由于 Var 携带图引用，`forward()` 不需要 `&Graph` 参数
///
/// # 使用示例
///
/// ```ignore
/// struct Block {
///     conv: Conv2d,
///     bn: BatchNorm2d,
/// }
///
/// impl Module for Block {
///     fn parameters(&self) -> Vec<Var> {
///         [self.conv.parameters(), self.bn.parameters()].concat()
///     }
///
///     fn buffers(&self) -> Vec<Buffer> {
///         self.bn.buffers()
///     }
/// }
/// ```
pub trait Module {
    /// 获取所有可训练参数
    fn parameters(&self) -> Vec<Var>;

    /// 获取所有不可训练的状态（如 BatchNorm 的滑动统计量）
    fn buffers(&self) -> Vec<Buffer> {
        Vec::new()
    }

    /// 可训练参数的元素总数
    fn num_params(&self) -> usize {
        self.parameters()
            .iter()
            .map(|p| p.with_value(Tensor::size))
            .sum()
    }

    /// 清空所有参数的梯度
    fn zero_grad(&self) {
        for p in self.parameters() {
            p.zero_grad();
        }
    }

    /// 导出参数与缓冲区的快照（按名称索引）
    fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        for p in self.parameters() {
            state.insert(p.name(), p.value());
        }
        for b in self.buffers() {
            state.insert(b.name(), b.value());
        }
        state
    }

    /// 从快照恢复参数与缓冲区（严格模式：缺少或多出的键、形状不符都会报错）
    fn load_state_dict(&self, state: &StateDict) -> Result<(), GraphError> {
        let params = self.parameters();
        let buffers = self.buffers();
        let expected: BTreeSet<&str> = params
            .iter()
            .map(Var::name)
            .chain(buffers.iter().map(Buffer::name))
            .collect();
        if let Some(unexpected) = state.names().find(|k| !expected.contains(k)) {
            return Err(GraphError::InvalidOperation(format!(
                "状态字典中存在模块没有的键“{unexpected}”"
            )));
        }

        for p in &params {
            let value = state
                .get(p.name())
                .ok_or_else(|| GraphError::MissingState(p.name().to_string()))?;
            p.set_value(value)?;
        }
        for b in &buffers {
            let value = state
                .get(b.name())
                .ok_or_else(|| GraphError::MissingState(b.name().to_string()))?;
            b.set_value(value)?;
        }
        Ok(())
    }
}

/// 不可训练的状态张量（如 BatchNorm 的 running_mean / running_var）
///
/// Clone 语义：多个 Buffer 句柄共享同一份数据。
#[derive(Debug, Clone)]
pub struct Buffer {
    name: String,
    value: Rc<RefCell<Tensor>>,
}

impl Buffer {
    pub fn new(name: &str, value: Tensor) -> Self {
        Self {
            name: name.to_string(),
            value: Rc::new(RefCell::new(value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Tensor {
        self.value.borrow().clone()
    }

    /// 覆盖缓冲区的值（形状必须不变）
    pub fn set_value(&self, value: &Tensor) -> Result<(), GraphError> {
        let mut current = self.value.borrow_mut();
        if current.shape() != value.shape() {
            return Err(GraphError::ShapeMismatch {
                expected: current.shape().to_vec(),
                got: value.shape().to_vec(),
                message: format!("缓冲区“{}”的形状不可改变", self.name),
            });
        }
        *current = value.clone();
        Ok(())
    }
}
