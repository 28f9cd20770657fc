//! 超分辨率数据集
//!
//! - [`TrainDataset`]：随机裁剪的高分辨率图像块及其 4 倍双三次下采样
//! - [`DevDataset`]：验证集，居中裁剪，附带双三次放大回原尺寸的基线图像

mod dev;
mod train;

pub use dev::{DevBatch, DevDataset};
pub use train::{TrainBatch, TrainDataset};

use super::DataError;
use crate::tensor::Tensor;
use std::path::{Path, PathBuf};

/// 支持的图像扩展名（不区分大小写）
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// 列出目录下所有支持的图像文件（按文件名排序，不递归）
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    if !dir.is_dir() {
        return Err(DataError::FileNotFound(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(DataError::EmptyDataset(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// 堆叠同形状的样本；形状不一致时报错而不是 panic
fn stack_checked(tensors: &[Tensor]) -> Result<Tensor, DataError> {
    let expected = tensors.first().map(|t| t.shape().to_vec()).unwrap_or_default();
    if let Some(bad) = tensors.iter().find(|t| t.shape() != expected.as_slice()) {
        return Err(DataError::ShapeMismatch {
            expected,
            got: bad.shape().to_vec(),
        });
    }
    Ok(Tensor::stack(&tensors.iter().collect::<Vec<_>>()))
}
