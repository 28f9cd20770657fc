/*
 * @Date         : 2026-02-04
 * @Description  : 张量与图像（image库）之间的互相转换，以及把多张图像拼成网格
 */

use super::Tensor;
use crate::errors::TensorError;
use image::{DynamicImage, Rgb, RgbImage};

impl Tensor {
    /// 将图像转为`[3, H, W]`的张量，像素值缩放到[0, 1]（等价于torchvision的`ToTensor`）
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let mut data = vec![0.0f32; 3 * height * width];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                data[c * height * width + y * width + x] = f32::from(pixel[c]) / 255.0;
            }
        }
        Self::new(&data, &[3, height, width])
    }

    /// 将`[3, H, W]`（或`[1, 3, H, W]`）的张量转为RGB图像；超出[0, 1]的值会被截断
    pub fn to_rgb_image(&self) -> Result<RgbImage, TensorError> {
        let tensor = match self.dimension() {
            4 if self.shape()[0] == 1 => self.select(0),
            3 => self.clone(),
            _ => {
                return Err(TensorError::DimensionMismatch {
                    expected: 3,
                    shape: self.shape().to_vec(),
                });
            }
        };
        let (c, height, width) = (tensor.shape()[0], tensor.shape()[1], tensor.shape()[2]);
        if c != 3 {
            return Err(TensorError::DimensionMismatch {
                expected: 3,
                shape: self.shape().to_vec(),
            });
        }
        let view = tensor.view();
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([
                to_u8(view[[0, y, x]]),
                to_u8(view[[1, y, x]]),
                to_u8(view[[2, y, x]]),
            ])
        });
        Ok(img)
    }

    /// 把若干张同尺寸的`[C, H, W]`图像排成网格（每行`nrow`张），
    /// 每张图四周留`padding`像素的0值间隔（与torchvision的`make_grid`一致）
    pub fn make_grid(images: &[&Self], nrow: usize, padding: usize) -> Self {
        assert!(!images.is_empty(), "{}", TensorError::EmptyList);
        let shape = images[0].shape().to_vec();
        if shape.len() != 3 {
            panic!(
                "{}",
                TensorError::DimensionMismatch {
                    expected: 3,
                    shape,
                }
            );
        }
        let (c, h, w) = (shape[0], shape[1], shape[2]);
        let xmaps = nrow.min(images.len()).max(1);
        let ymaps = images.len().div_ceil(xmaps);
        let cell_h = h + padding;
        let cell_w = w + padding;
        let grid_h = ymaps * cell_h + padding;
        let grid_w = xmaps * cell_w + padding;

        let mut grid = Self::zeros(&[c, grid_h, grid_w]);
        let grid_view = grid.view_mut();
        for (k, image) in images.iter().enumerate() {
            assert!(
                image.shape() == shape.as_slice(),
                "{}",
                TensorError::InconsitentShape
            );
            let (row, col) = (k / xmaps, k % xmaps);
            let (top, left) = (row * cell_h + padding, col * cell_w + padding);
            let src = image.view();
            for ci in 0..c {
                for y in 0..h {
                    for x in 0..w {
                        grid_view[[ci, top + y, left + x]] = src[[ci, y, x]];
                    }
                }
            }
        }
        grid
    }
}
