//! 数据加载模块
//!
//! 提供超分辨率数据集、图像变换和批处理功能。
//!
//! # 主要组件
//!
//! - [`DataLoader`]: `PyTorch` 风格的数据批量加载器（带专用解码线程池）
//! - [`Dataset`]: 可按索引读取并拼批的数据集 trait
//! - [`TrainDataset`]: 随机裁剪的训练集
//! - [`DevDataset`]: 居中裁剪的验证集
//! - [`transforms`]: 裁剪、双三次缩放、显示变换
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use srgan::data::{DataLoader, TrainDataset};
//!
//! let loader = DataLoader::new(TrainDataset::new("data/train", 64, 4)?, 64)
//!     .shuffle(true)
//!     .seed(42)
//!     .num_workers(2)?;
//!
//! for batch in loader.iter(epoch) {
//!     let batch = batch?;
//!     let sr = generator.forward(&graph.input(&batch.lr))?;
//! }
//! ```

mod dataloader;
pub mod datasets;
pub mod error;
pub mod transforms;

#[cfg(test)]
mod tests;

// Re-exports
pub use dataloader::{DataLoader, DataLoaderIterator, Dataset};
pub use datasets::{DevBatch, DevDataset, TrainBatch, TrainDataset, is_image_file};
pub use error::DataError;
