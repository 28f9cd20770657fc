mod config;
mod metrics;
mod session;

use crate::model::{DiscriminatorConfig, GeneratorConfig};
use crate::train::TrainConfig;
use image::{Rgb, RgbImage};
use std::path::Path;

pub(super) const TINY_G: GeneratorConfig = GeneratorConfig {
    channels: 4,
    residual_blocks: 1,
};

pub(super) const TINY_D: DiscriminatorConfig = DiscriminatorConfig {
    base_channels: 2,
    hidden_channels: 4,
};

/// 在 `root` 下生成 `data/train`（`train` 张）与 `data/dev`（`dev` 张）图像，返回挂到 `root` 下的小网络配置
pub(super) fn tiny_workspace(root: &Path, train: u32, dev: u32) -> TrainConfig {
    for (sub, count, size) in [("data/train", train, 24), ("data/dev", dev, 20)] {
        let dir = root.join(sub);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            let img = RgbImage::from_fn(size, size, |x, y| {
                Rgb([
                    ((x * 10 + i * 40) % 256) as u8,
                    ((y * 10 + i * 20) % 256) as u8,
                    ((x * y + i) % 256) as u8,
                ])
            });
            img.save(dir.join(format!("{i}.png"))).unwrap();
        }
    }
    TrainConfig {
        crop_size: 16,
        num_epochs: 1,
        batch_size: 2,
        pretrain_epochs: 1,
        train_workers: 0,
        dev_workers: 0,
        generator: TINY_G,
        discriminator: TINY_D,
        ..TrainConfig::default()
    }
    .rooted_at(root)
}
