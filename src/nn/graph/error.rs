/*
 * @Date         : 2026-02-05
 * @Description  : Graph 模块的错误类型
 */

use thiserror::Error;

/// Graph 操作错误类型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("非法操作：{0}")]
    InvalidOperation(String),
    #[error("形状不匹配（期望 {expected:?}，得到 {got:?}）：{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("参数名重复：{0}")]
    DuplicateName(String),
    /// 节点保存的中间结果已被上一次（未保留计算图的）反向传播消耗
    #[error(
        "节点“{0}”的中间结果已在上一次反向传播中释放，若需再次反向传播，请在第一次时调用 backward_retain_graph()"
    )]
    GraphReleased(String),
    #[error("状态字典中缺少“{0}”")]
    MissingState(String),
}
