//! 训练集

use super::{list_images, stack_checked};
use crate::data::transforms::{open_rgb, random_crop, resize_bicubic, valid_crop_size};
use crate::data::{DataError, Dataset};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

/// 训练批次：低分辨率输入与高分辨率目标
#[derive(Debug, Clone)]
pub struct TrainBatch {
    /// [N, 3, c/r, c/r]
    pub lr: Tensor,
    /// [N, 3, c, c]
    pub hr: Tensor,
}

impl TrainBatch {
    pub fn len(&self) -> usize {
        self.hr.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 训练集：每次读取时随机裁剪出 `crop_size` 的方块，再双三次下采样 `upscale_factor` 倍
#[derive(Debug, Clone)]
pub struct TrainDataset {
    files: Vec<PathBuf>,
    crop_size: usize,
    upscale_factor: usize,
}

impl TrainDataset {
    /// `crop_size` 会被向下取整为 `upscale_factor` 的整数倍
    pub fn new(
        dir: impl AsRef<Path>,
        crop_size: usize,
        upscale_factor: usize,
    ) -> Result<Self, DataError> {
        let valid = if upscale_factor == 0 {
            0
        } else {
            valid_crop_size(crop_size, upscale_factor)
        };
        if valid == 0 {
            return Err(DataError::InvalidCropSize {
                crop_size,
                upscale_factor,
            });
        }
        Ok(Self {
            files: list_images(dir.as_ref())?,
            crop_size: valid,
            upscale_factor,
        })
    }

    /// 实际使用的（已取整的）裁剪尺寸
    pub const fn crop_size(&self) -> usize {
        self.crop_size
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Dataset for TrainDataset {
    /// (lr [3, c/r, c/r], hr [3, c, c])
    type Sample = (Tensor, Tensor);
    type Batch = TrainBatch;

    fn len(&self) -> usize {
        self.files.len()
    }

    fn get(&self, index: usize, seed: u64) -> Result<Self::Sample, DataError> {
        let path = self.files.get(index).ok_or(DataError::IndexOutOfBounds {
            index,
            len: self.files.len(),
        })?;
        let mut rng = StdRng::seed_from_u64(seed);
        let img = open_rgb(path)?;
        let hr = random_crop(&img, self.crop_size as u32, path, &mut rng)?;
        let lr = resize_bicubic(&hr, (self.crop_size / self.upscale_factor) as u32);
        Ok((Tensor::from_image(&lr), Tensor::from_image(&hr)))
    }

    fn collate(samples: Vec<Self::Sample>) -> Result<Self::Batch, DataError> {
        let (lr, hr): (Vec<_>, Vec<_>) = samples.into_iter().unzip();
        Ok(TrainBatch {
            lr: stack_checked(&lr)?,
            hr: stack_checked(&hr)?,
        })
    }
}
