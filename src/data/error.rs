//! 数据加载错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 数据加载相关错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 文件或目录未找到
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 图像解码/编码失败
    #[error("图像 {path} 处理失败: {source}")]
    ImageError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// 目录中没有支持的图像文件
    #[error("目录 {0} 中没有可用的图像（支持 png/jpg/jpeg/bmp）")]
    EmptyDataset(PathBuf),

    /// 图像小于裁剪尺寸
    #[error("图像 {path} 的尺寸 {width}x{height} 小于裁剪尺寸 {crop_size}")]
    ImageTooSmall {
        path: PathBuf,
        width: u32,
        height: u32,
        crop_size: u32,
    },

    /// 裁剪尺寸无效（按放大倍数取整后为 0）
    #[error("裁剪尺寸 {crop_size} 对放大倍数 {upscale_factor} 无效")]
    InvalidCropSize {
        crop_size: usize,
        upscale_factor: usize,
    },

    /// 索引越界
    #[error("索引越界: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// 形状不匹配（同一批次内的样本尺寸不一致）
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 解码线程池创建失败
    #[error("工作线程池创建失败: {0}")]
    WorkerPool(String),
}
