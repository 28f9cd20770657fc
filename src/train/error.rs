/*
 * @Date         : 2026-02-10
 * @Description  : 训练流程的错误类型
 */

use super::checkpoint::CheckpointError;
use crate::data::DataError;
use crate::errors::TensorError;
use crate::nn::GraphError;
use thiserror::Error;

/// 训练流程错误（数据、计算图、检查点、指标输出等）
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Tensor(#[from] TensorError),
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("图像保存失败: {0}")]
    Image(#[from] image::ImageError),
    #[error("配置无效: {0}")]
    InvalidConfig(String),
}
