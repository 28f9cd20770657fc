/*
 * @Date         : 2026-02-05
 * @Description  : 反向传播（VJP）
 *
 * 从标量 loss 出发，按拓扑逆序把上游梯度传给父节点：
 * - 参数节点：梯度累加到节点自身（多次 backward 之间需手动 zero_grad）
 * - 运算节点：调用其保存的中间结果计算各父节点的梯度，梯度不落盘
 * - 输入节点：忽略
 *
 * 未保留计算图时，传播结束后释放路径上所有运算节点的中间结果；
 * 之后再经过这些节点反向传播会得到 GraphError::GraphReleased。
 */

use super::super::error::GraphError;
use super::super::NodeId;
use crate::nn::nodes::TraitOp;
use crate::nn::var::{NodeKind, Var};
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

pub(crate) fn run_backward(root: &Var, retain_graph: bool) -> Result<f32, GraphError> {
    let loss = root.item()?;
    if !root.requires_grad() {
        return Err(GraphError::InvalidOperation(format!(
            "节点“{}”不依赖任何可训练参数，无法反向传播",
            root.name()
        )));
    }

    let order = topological_order(root);

    // 先确认整条路径的中间结果都还在，避免参数梯度只累加了一半
    for node in &order {
        if node.kind_of() == NodeKind::Op && node.op().is_none() {
            return Err(GraphError::GraphReleased(node.name().to_string()));
        }
    }

    let mut grads: HashMap<NodeId, Tensor> = HashMap::new();
    grads.insert(root.node_id(), root.with_value(|v| Tensor::ones(v.shape())));

    for node in order.iter().rev() {
        let Some(upstream) = grads.remove(&node.node_id()) else {
            continue;
        };
        match node.kind_of() {
            NodeKind::Parameter => node.accumulate_grad(&upstream),
            NodeKind::Input => {}
            NodeKind::Op => {
                let needs_grad: Vec<bool> = node.parents().iter().map(Var::requires_grad).collect();
                let parent_grads = {
                    let op = node.op();
                    let op = op
                        .as_ref()
                        .ok_or_else(|| GraphError::GraphReleased(node.name().to_string()))?;
                    node.with_value(|output| op.backward(&upstream, output, &needs_grad))?
                };
                for ((parent, grad), needed) in
                    node.parents().iter().zip(parent_grads).zip(needs_grad)
                {
                    let Some(grad) = grad else { continue };
                    if !needed {
                        continue;
                    }
                    match grads.get_mut(&parent.node_id()) {
                        Some(existing) => *existing += &grad,
                        None => {
                            grads.insert(parent.node_id(), grad);
                        }
                    }
                }
            }
        }
    }

    if !retain_graph {
        for node in &order {
            if node.kind_of() == NodeKind::Op {
                node.release_op();
            }
        }
    }

    Ok(loss)
}

/// 拓扑排序（只包含需要求导的节点），父节点在前、root 在最后
fn topological_order(root: &Var) -> Vec<Var> {
    let mut order = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    // (节点, 是否已展开父节点)
    let mut stack: Vec<(Var, bool)> = vec![(root.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !visited.insert(node.node_id()) {
            continue;
        }
        let parents: Vec<Var> = node
            .parents()
            .iter()
            .filter(|p| p.requires_grad() && !visited.contains(&p.node_id()))
            .cloned()
            .collect();
        stack.push((node, true));
        for parent in parents {
            stack.push((parent, false));
        }
    }
    order
}
