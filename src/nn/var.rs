/*
 * @Date         : 2026-02-05
 * @Description  : Smart Var - 智能变量句柄，支持算子重载和链式调用
 *
 * Var 通过 Rc 持有节点本身（值、梯度、父节点、反向传播所需的中间结果），
 * 运算即时求值（eager），同时记录反向传播信息，形成动态计算图。
 */

use super::graph::{GraphError, GraphInner, NodeId, run_backward};
use super::nodes::{AddOp, AddScalarOp, OpNode, ScaleOp, SubOp};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::cell::{Ref, RefCell};
use std::ops::{Add, Mul, Sub};
use std::rc::Rc;

// ==================== Init 枚举 ====================

/// 参数初始化策略
#[derive(Debug, Clone)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 全一
    Ones,
    /// 正态分布
    Normal { mean: f32, std: f32 },
    /// [low, high) 均匀分布（要求 low < high）
    Uniform { low: f32, high: f32 },
    /// Kaiming/He 初始化（适用于 `ReLU` 族），std = sqrt(2 / fan_in)
    Kaiming { fan_in: usize },
}

impl Init {
    /// 生成初始化后的 Tensor（使用图的 RNG）
    pub fn generate_with_rng(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(shape, *v),
            Self::Zeros => Tensor::zeros(shape),
            Self::Ones => Tensor::ones(shape),
            Self::Normal { mean, std } => Tensor::normal_with_rng(*mean, *std, shape, rng),
            Self::Uniform { low, high } => Tensor::uniform_with_rng(*low, *high, shape, rng),
            Self::Kaiming { fan_in } => {
                let std = (2.0 / (*fan_in).max(1) as f32).sqrt();
                Tensor::normal_with_rng(0.0, std, shape, rng)
            }
        }
    }
}

// ==================== 节点 ====================

/// 节点类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// 可训练参数（叶子，累积梯度）
    Parameter,
    /// 输入/常量（叶子，不求导）
    Input,
    /// 运算结果（非叶子，持有反向传播所需的中间结果）
    Op,
}

pub(crate) struct NodeCell {
    id: NodeId,
    name: String,
    kind: NodeKind,
    value: RefCell<Tensor>,
    grad: RefCell<Option<Tensor>>,
    parents: Vec<Var>,
    /// 反向传播所需的中间结果；被（未保留计算图的）反向传播消耗后为 None
    op: RefCell<Option<OpNode>>,
}

// ==================== Var 结构 ====================

/// 智能变量句柄 - 携带图引用，支持算子重载和链式调用
///
/// # 设计原则
/// - Clone 语义（非 Copy），但开销极低（Rc clone）
/// - 像 `PyTorch` tensor 一样使用：运算即时求值，`backward()` 沿记录的路径求梯度
///
/// # 使用示例
/// ```ignore
/// let x = graph.input(&images);
/// let h = conv.forward(&x)?.leaky_relu(0.2);
/// let loss = h.mse_loss(&target)?;
/// loss.backward()?;
/// ```
#[derive(Clone)]
pub struct Var {
    node: Rc<NodeCell>,
    graph: Rc<RefCell<GraphInner>>,
}

impl std::fmt::Debug for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.node.id)
            .field("name", &self.node.name)
            .field("shape", &self.shape())
            .finish()
    }
}

impl Var {
    /// 创建叶子节点（参数或输入）
    pub(crate) fn leaf(
        id: NodeId,
        name: &str,
        kind: NodeKind,
        value: Tensor,
        graph: Rc<RefCell<GraphInner>>,
    ) -> Self {
        Self {
            node: Rc::new(NodeCell {
                id,
                name: name.to_string(),
                kind,
                value: RefCell::new(value),
                grad: RefCell::new(None),
                parents: Vec::new(),
                op: RefCell::new(None),
            }),
            graph,
        }
    }

    /// 创建运算结果节点
    ///
    /// 若梯度记录被关闭（no_grad），或没有任何父节点需要求导，
    /// 结果退化为不求导的叶子节点，不保存中间结果。
    pub(crate) fn from_op(
        parents: Vec<Self>,
        value: Tensor,
        op: impl Into<OpNode>,
        name: &str,
    ) -> Self {
        let graph = Rc::clone(&parents[0].graph);
        let (id, grad_enabled) = {
            let mut g = graph.borrow_mut();
            (g.next_node_id(), g.is_grad_enabled())
        };
        let requires_grad = grad_enabled && parents.iter().any(Self::requires_grad);
        if !requires_grad {
            return Self::leaf(id, name, NodeKind::Input, value, graph);
        }
        Self {
            node: Rc::new(NodeCell {
                id,
                name: name.to_string(),
                kind: NodeKind::Op,
                value: RefCell::new(value),
                grad: RefCell::new(None),
                parents,
                op: RefCell::new(Some(op.into())),
            }),
            graph,
        }
    }

    /// 获取节点 ID
    pub fn node_id(&self) -> NodeId {
        self.node.id
    }

    /// 参数名（参数节点）或运算名（运算节点）
    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub(crate) fn kind_of(&self) -> NodeKind {
        self.node.kind
    }

    pub fn is_parameter(&self) -> bool {
        self.node.kind == NodeKind::Parameter
    }

    /// 是否需要求导：参数节点，或记录了反向传播信息的运算节点
    pub fn requires_grad(&self) -> bool {
        self.node.kind != NodeKind::Input
    }

    pub(crate) fn graph(&self) -> &Rc<RefCell<GraphInner>> {
        &self.graph
    }

    /// 检查两个 Var 是否来自同一个 Graph
    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    pub(crate) fn assert_same_graph(&self, other: &Self) -> Result<(), GraphError> {
        if !self.same_graph(other) {
            return Err(GraphError::InvalidOperation(
                "不能对来自不同 Graph 的 Var 进行操作".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn parents(&self) -> &[Self] {
        &self.node.parents
    }

    pub(crate) fn op(&self) -> Ref<'_, Option<OpNode>> {
        self.node.op.borrow()
    }

    /// 释放反向传播所需的中间结果
    pub(crate) fn release_op(&self) {
        self.node.op.borrow_mut().take();
    }

    // ==================== 值访问和设置 ====================

    /// 获取节点的值（克隆的 Tensor）
    pub fn value(&self) -> Tensor {
        self.node.value.borrow().clone()
    }

    /// 借用节点的值（避免克隆大张量）
    pub fn with_value<R>(&self, f: impl FnOnce(&Tensor) -> R) -> R {
        f(&self.node.value.borrow())
    }

    pub fn shape(&self) -> Vec<usize> {
        self.node.value.borrow().shape().to_vec()
    }

    /// 标量节点的值（如 loss）
    pub fn item(&self) -> Result<f32, GraphError> {
        let value = self.node.value.borrow();
        value.number().ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "只有标量节点才能取 item()，节点“{}”的形状为 {:?}",
                self.node.name,
                value.shape()
            ))
        })
    }

    /// 设置叶子节点（参数/输入）的值，运算节点的值不允许手动设置
    pub fn set_value(&self, value: &Tensor) -> Result<(), GraphError> {
        if self.node.kind == NodeKind::Op {
            return Err(GraphError::InvalidOperation(format!(
                "运算节点“{}”的值不应该被手动设置",
                self.node.name
            )));
        }
        let mut current = self.node.value.borrow_mut();
        if self.node.kind == NodeKind::Parameter && current.shape() != value.shape() {
            return Err(GraphError::ShapeMismatch {
                expected: current.shape().to_vec(),
                got: value.shape().to_vec(),
                message: format!("参数“{}”的形状不可改变", self.node.name),
            });
        }
        *current = value.clone();
        Ok(())
    }

    // ==================== 梯度 ====================

    /// 获取梯度（仅参数节点会累积梯度；尚未反向传播时为 None）
    pub fn grad(&self) -> Option<Tensor> {
        self.node.grad.borrow().clone()
    }

    pub(crate) fn set_grad(&self, grad: Option<Tensor>) {
        *self.node.grad.borrow_mut() = grad;
    }

    /// 清空梯度（置为 None）
    pub fn zero_grad(&self) {
        self.set_grad(None);
    }

    pub(crate) fn accumulate_grad(&self, grad: &Tensor) {
        let mut slot = self.node.grad.borrow_mut();
        match slot.as_mut() {
            Some(existing) => *existing += grad,
            None => *slot = Some(grad.clone()),
        }
    }

    // ==================== 梯度流控制 ====================

    /// 截断梯度流：返回值相同、不求导的新叶子节点
    pub fn detach(&self) -> Self {
        let id = self.graph.borrow_mut().next_node_id();
        Self::leaf(
            id,
            &self.node.name,
            NodeKind::Input,
            self.value(),
            Rc::clone(&self.graph),
        )
    }

    // ==================== 执行 ====================

    /// 反向传播，并释放路径上各运算节点保存的中间结果（一次性消耗）
    ///
    /// # 返回值
    /// 返回 loss 的标量值
    pub fn backward(&self) -> Result<f32, GraphError> {
        run_backward(self, false)
    }

    /// 反向传播，但保留中间结果，以便同一段计算图（如生成器输出）再参与一次反向传播
    pub fn backward_retain_graph(&self) -> Result<f32, GraphError> {
        run_backward(self, true)
    }

    // ==================== 基础运算 ====================

    pub fn try_add(&self, other: &Self) -> Result<Self, GraphError> {
        self.assert_same_graph(other)?;
        let value = self.binary_value(other, "相加", |a, b| a + b)?;
        Ok(Self::from_op(
            vec![self.clone(), other.clone()],
            value,
            AddOp,
            "add",
        ))
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, GraphError> {
        self.assert_same_graph(other)?;
        let value = self.binary_value(other, "相减", |a, b| a - b)?;
        Ok(Self::from_op(
            vec![self.clone(), other.clone()],
            value,
            SubOp,
            "sub",
        ))
    }

    fn binary_value(
        &self,
        other: &Self,
        op_desc: &str,
        f: impl Fn(&Tensor, &Tensor) -> Tensor,
    ) -> Result<Tensor, GraphError> {
        let a = self.node.value.borrow();
        let b = other.node.value.borrow();
        if a.shape() != b.shape() {
            return Err(GraphError::ShapeMismatch {
                expected: a.shape().to_vec(),
                got: b.shape().to_vec(),
                message: format!("两个 Var {op_desc} 时形状必须一致"),
            });
        }
        Ok(f(&a, &b))
    }

    /// 乘以常数
    pub fn scale(&self, factor: f32) -> Self {
        let value = self.with_value(|v| v * factor);
        Self::from_op(vec![self.clone()], value, ScaleOp::new(factor), "scale")
    }

    /// 加上常数
    pub fn add_scalar(&self, constant: f32) -> Self {
        let value = self.with_value(|v| v + constant);
        Self::from_op(vec![self.clone()], value, AddScalarOp, "add_scalar")
    }
}

// ==================== 算子重载 ====================

macro_rules! impl_var_binary_op {
    ($trait:ident, $method:ident, $desc:literal) => {
        paste::paste! {
            impl $trait for &Var {
                type Output = Var;

                fn $method(self, other: &Var) -> Var {
                    self.[<try_ $method>](other).expect(concat!("Var ", $desc, "失败"))
                }
            }

            impl $trait for Var {
                type Output = Var;

                fn $method(self, other: Var) -> Var {
                    (&self).$method(&other)
                }
            }

            impl $trait<Var> for &Var {
                type Output = Var;

                fn $method(self, other: Var) -> Var {
                    self.$method(&other)
                }
            }

            impl $trait<&Var> for Var {
                type Output = Var;

                fn $method(self, other: &Var) -> Var {
                    (&self).$method(other)
                }
            }
        }
    };
}

impl_var_binary_op!(Add, add, "加法");
impl_var_binary_op!(Sub, sub, "减法");

impl Mul<f32> for &Var {
    type Output = Var;

    fn mul(self, factor: f32) -> Var {
        self.scale(factor)
    }
}

impl Mul<f32> for Var {
    type Output = Var;

    fn mul(self, factor: f32) -> Var {
        self.scale(factor)
    }
}

impl Add<f32> for &Var {
    type Output = Var;

    fn add(self, constant: f32) -> Var {
        self.add_scalar(constant)
    }
}

impl Add<f32> for Var {
    type Output = Var;

    fn add(self, constant: f32) -> Var {
        self.add_scalar(constant)
    }
}
