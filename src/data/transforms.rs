//! 图像变换函数
//!
//! 裁剪、双三次缩放，以及可视化时使用的显示变换。
//! 缩放统一使用 `image` 库的 `CatmullRom` 滤波（即双三次插值）。

use super::DataError;
use crate::errors::TensorError;
use crate::tensor::Tensor;
use image::DynamicImage;
use image::imageops::FilterType;
use rand::Rng;
use std::path::Path;

/// 可视化图像的边长
pub const DISPLAY_SIZE: u32 = 400;

/// 取不大于 `crop_size` 的、`upscale_factor` 的最大整数倍
///
/// # 示例
/// ```ignore
/// assert_eq!(valid_crop_size(66, 4), 64);
/// ```
pub const fn valid_crop_size(crop_size: usize, upscale_factor: usize) -> usize {
    crop_size - crop_size % upscale_factor
}

/// 打开图像文件并转为 RGB
pub fn open_rgb(path: &Path) -> Result<DynamicImage, DataError> {
    let img = image::open(path).map_err(|source| DataError::ImageError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// 随机裁剪出 `size` x `size` 的区域
pub fn random_crop<R: Rng + ?Sized>(
    img: &DynamicImage,
    size: u32,
    path: &Path,
    rng: &mut R,
) -> Result<DynamicImage, DataError> {
    check_fits(img, size, path)?;
    let left = rng.gen_range(0..=img.width() - size);
    let top = rng.gen_range(0..=img.height() - size);
    Ok(img.crop_imm(left, top, size, size))
}

/// 居中裁剪出 `size` x `size` 的区域（偏移向下取整，与 torchvision 的 `CenterCrop` 一致）
pub fn center_crop(img: &DynamicImage, size: u32, path: &Path) -> Result<DynamicImage, DataError> {
    check_fits(img, size, path)?;
    let left = (img.width() - size) / 2;
    let top = (img.height() - size) / 2;
    Ok(img.crop_imm(left, top, size, size))
}

/// 双三次缩放到 `size` x `size`
pub fn resize_bicubic(img: &DynamicImage, size: u32) -> DynamicImage {
    img.resize_exact(size, size, FilterType::CatmullRom)
}

/// 显示变换：短边缩放到 400（双线性），再居中裁剪为 400x400
///
/// 输入为 `[3, H, W]`（或 `[1, 3, H, W]`）的图像张量，输出 `[3, 400, 400]`。
pub fn display_transform(image: &Tensor) -> Result<Tensor, TensorError> {
    let img = DynamicImage::ImageRgb8(image.to_rgb_image()?);
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = if w <= h {
        (DISPLAY_SIZE, scale_edge(h, DISPLAY_SIZE, w))
    } else {
        (scale_edge(w, DISPLAY_SIZE, h), DISPLAY_SIZE)
    };
    let resized = img.resize_exact(new_w, new_h, FilterType::Triangle);
    let left = (new_w - DISPLAY_SIZE) / 2;
    let top = (new_h - DISPLAY_SIZE) / 2;
    Ok(Tensor::from_image(&resized.crop_imm(
        left,
        top,
        DISPLAY_SIZE,
        DISPLAY_SIZE,
    )))
}

/// 按 `target / short` 的比例缩放长边，至少为 `target`
fn scale_edge(long: u32, target: u32, short: u32) -> u32 {
    let scaled = (f64::from(long) * f64::from(target) / f64::from(short.max(1))) as u32;
    scaled.max(target)
}

fn check_fits(img: &DynamicImage, size: u32, path: &Path) -> Result<(), DataError> {
    if img.width() < size || img.height() < size {
        return Err(DataError::ImageTooSmall {
            path: path.to_path_buf(),
            width: img.width(),
            height: img.height(),
            crop_size: size,
        });
    }
    Ok(())
}
