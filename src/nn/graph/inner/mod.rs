/*
 * @Date         : 2026-02-05
 * @Description  : GraphInner：图级共享状态
 *
 * 与静态图不同，节点本身由 Var 通过 Rc 持有（不再被图集中存放），
 * 最后一个引用释放时节点随之释放。GraphInner 只负责：
 * - 节点 id 分配
 * - 参数名登记（防止重名，保证状态字典的键唯一）
 * - train/eval 与 no_grad 模式（mode.rs）
 * - 参数初始化用的随机数生成器
 * 反向传播见 backward.rs。
 */

mod backward;
mod mode;

pub(crate) use backward::run_backward;

use super::error::GraphError;
use super::NodeId;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;

/// 图的共享状态（核心实现）
pub struct GraphInner {
    next_id: u64,
    parameter_names: HashSet<String>,
    is_eval_mode: bool,
    grad_enabled: bool,
    rng: StdRng,
}

impl GraphInner {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            next_id: 0,
            parameter_names: HashSet::new(),
            is_eval_mode: false,
            grad_enabled: true,
            rng,
        }
    }

    pub(crate) fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn register_parameter_name(&mut self, name: &str) -> Result<(), GraphError> {
        if !self.parameter_names.insert(name.to_string()) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for GraphInner {
    fn default() -> Self {
        Self::new()
    }
}
