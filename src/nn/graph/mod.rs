/*
 * @Date         : 2026-02-05
 * @Description  : Graph 模块：动态（define-by-run）计算图
 *
 * 公开 API：
 * - `Graph`: 用户级句柄（PyTorch 风格），负责参数创建、train/eval 模式、no_grad
 * - `GraphInner`: 图级共享状态（随机数生成器、参数名登记、模式标志）
 * - `GraphError`: 错误类型
 * - `NodeId`: 节点唯一标识
 */

mod error;
mod handle;
mod inner;

pub use error::GraphError;
pub use handle::Graph;
pub use inner::GraphInner;
pub(crate) use inner::run_backward;

/// 节点唯一标识（同一个 Graph 内单调递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);
