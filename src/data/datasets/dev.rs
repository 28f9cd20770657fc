//! 验证集

use super::{list_images, stack_checked};
use crate::data::transforms::{center_crop, open_rgb, resize_bicubic, valid_crop_size};
use crate::data::{DataError, Dataset};
use crate::tensor::Tensor;
use std::path::{Path, PathBuf};

/// 验证批次（通常 batch_size = 1，各图像尺寸可以不同）
#[derive(Debug, Clone)]
pub struct DevBatch {
    /// 低分辨率输入
    pub lr: Tensor,
    /// 把 `lr` 双三次放大回原尺寸的基线图像
    pub hr_restore: Tensor,
    /// 高分辨率真值
    pub hr: Tensor,
}

/// 验证集：居中裁剪出不超过短边的、`upscale_factor` 整数倍的最大方块
#[derive(Debug, Clone)]
pub struct DevDataset {
    files: Vec<PathBuf>,
    upscale_factor: usize,
}

impl DevDataset {
    pub fn new(dir: impl AsRef<Path>, upscale_factor: usize) -> Result<Self, DataError> {
        if upscale_factor == 0 {
            return Err(DataError::InvalidCropSize {
                crop_size: 0,
                upscale_factor,
            });
        }
        Ok(Self {
            files: list_images(dir.as_ref())?,
            upscale_factor,
        })
    }
}

impl Dataset for DevDataset {
    /// (lr, hr_restore, hr)，均为 [3, H, W]
    type Sample = (Tensor, Tensor, Tensor);
    type Batch = DevBatch;

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize, _seed: u64) -> Result<Self::Sample, DataError> {
        let path = self.files.get(index).ok_or(DataError::IndexOutOfBounds {
            index,
            len: self.files.len(),
        })?;
        let img = open_rgb(path)?;
        let short_edge = img.width().min(img.height()) as usize;
        let crop_size = valid_crop_size(short_edge, self.upscale_factor);
        if crop_size == 0 {
            return Err(DataError::ImageTooSmall {
                path: path.clone(),
                width: img.width(),
                height: img.height(),
                crop_size: self.upscale_factor as u32,
            });
        }

        let hr = center_crop(&img, crop_size as u32, path)?;
        let lr = resize_bicubic(&hr, (crop_size / self.upscale_factor) as u32);
        let hr_restore = resize_bicubic(&lr, crop_size as u32);
        Ok((
            Tensor::from_image(&lr),
            Tensor::from_image(&hr_restore),
            Tensor::from_image(&hr),
        ))
    }

    fn collate(samples: Vec<Self::Sample>) -> Result<Self::Batch, DataError> {
        let mut lr = Vec::with_capacity(samples.len());
        let mut hr_restore = Vec::with_capacity(samples.len());
        let mut hr = Vec::with_capacity(samples.len());
        for (l, r, h) in samples {
            lr.push(l);
            hr_restore.push(r);
            hr.push(h);
        }
        Ok(DevBatch {
            lr: stack_checked(&lr)?,
            hr_restore: stack_checked(&hr_restore)?,
            hr: stack_checked(&hr)?,
        })
    }
}
