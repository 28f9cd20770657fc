mod transforms;

use image::{Rgb, RgbImage};
use std::path::Path;

/// 在 `dir` 下写一张 `width` x `height` 的渐变图像
pub(super) fn write_gradient(dir: &Path, name: &str, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    });
    img.save(dir.join(name)).unwrap();
}
