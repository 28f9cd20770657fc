mod generator;

use crate::model::{DiscriminatorConfig, GeneratorConfig};

/// 测试用的小网络宽度
pub(super) const TINY_G: GeneratorConfig = GeneratorConfig {
    channels: 4,
    residual_blocks: 2,
};

pub(super) const TINY_D: DiscriminatorConfig = DiscriminatorConfig {
    base_channels: 2,
    hidden_channels: 8,
};
