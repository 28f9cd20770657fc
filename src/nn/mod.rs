/*
 * @Date         : 2026-02-06
 * @Description  : 负责神经网络（neural network）的构建：动态计算图、自动微分、层与优化器
 */

mod graph;
pub mod layer;
mod module;
mod nodes;
pub mod optimizer;
mod state_dict;
mod var;
mod var_ops;

pub use graph::{Graph, GraphError, GraphInner, NodeId};
pub use layer::{BatchNorm2d, Conv2d, PRelu};
pub use module::{Buffer, Module};
pub use optimizer::{Adam, AdamState, Optimizer};
pub use state_dict::StateDict;
pub use var::{Init, Var};
pub use var_ops::{VarActivationOps, VarLossOps, VarShapeOps};

#[cfg(test)]
mod tests;
