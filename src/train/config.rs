/*
 * @Date         : 2026-02-10
 * @Description  : 训练配置（由命令行参数解析而来，启动时写入 cp/config.json）
 */

use super::TrainError;
use crate::model::{DiscriminatorConfig, GeneratorConfig, UPSCALE_FACTOR};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// 完整的训练配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// 训练图像裁剪尺寸（会向下取整为放大倍数的整数倍）
    pub crop_size: usize,
    /// 对抗训练轮数
    pub num_epochs: usize,
    pub batch_size: usize,
    /// 从该 epoch 的检查点恢复；-1 表示全新训练
    pub check_point: i64,
    /// 权重初始化、标签噪声、打乱顺序共用的随机种子
    pub seed: u64,

    pub train_set: PathBuf,
    pub dev_set: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub vis_dir: PathBuf,
    pub log_dir: PathBuf,

    pub upscale_factor: usize,
    /// 仅用 MSE 预训练生成器的轮数
    pub pretrain_epochs: usize,
    /// 判别器与优化器状态的保存间隔（epoch）
    pub full_save_every: usize,
    /// 真实样本软标签区间 [low, high)
    pub real_label_range: (f32, f32),
    /// 生成样本软标签区间 [low, high)
    pub fake_label_range: (f32, f32),
    pub adversarial_weight: f32,
    pub tv_weight: f32,
    pub learning_rate: f32,
    /// 每轮可视化最多保留的图像数
    pub vis_image_cap: usize,
    /// 单张验证图像 PSNR 的上限（dB）
    pub psnr_cap_db: f32,
    pub train_workers: usize,
    pub dev_workers: usize,

    pub generator: GeneratorConfig,
    pub discriminator: DiscriminatorConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            crop_size: 64,
            num_epochs: 100,
            batch_size: 64,
            check_point: -1,
            seed: 42,
            train_set: PathBuf::from("data/train"),
            dev_set: PathBuf::from("data/dev"),
            checkpoint_dir: PathBuf::from("cp"),
            vis_dir: PathBuf::from("vis"),
            log_dir: PathBuf::from("log"),
            upscale_factor: UPSCALE_FACTOR,
            pretrain_epochs: 5,
            full_save_every: 5,
            real_label_range: (0.85, 1.10),
            fake_label_range: (0.0, 0.15),
            adversarial_weight: 1e-3,
            tv_weight: 2e-8,
            learning_rate: 1e-3,
            vis_image_cap: 60,
            psnr_cap_db: 100.0,
            train_workers: 2,
            dev_workers: 1,
            generator: GeneratorConfig::default(),
            discriminator: DiscriminatorConfig::default(),
        }
    }
}

impl TrainConfig {
    /// 是否为全新训练（需要预训练）
    pub const fn is_fresh_start(&self) -> bool {
        self.check_point == -1
    }

    /// 对抗训练开始前已完成的 epoch 数：`max(check_point, 0)`
    pub fn start_epoch(&self) -> usize {
        usize::try_from(self.check_point.max(0)).unwrap_or(0)
    }

    /// 本次运行的对抗训练 epoch：`E+1 ..= E+N`
    pub fn epochs(&self) -> RangeInclusive<usize> {
        let start = self.start_epoch();
        start + 1..=start + self.num_epochs
    }

    /// 把所有相对路径挂到 `root` 下（`data/train` 变为 `{root}/data/train`）
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.train_set,
            &mut self.dev_set,
            &mut self.checkpoint_dir,
            &mut self.vis_dir,
            &mut self.log_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), TrainError> {
        let invalid = |msg: String| Err(TrainError::InvalidConfig(msg));
        if self.check_point < -1 {
            return invalid(format!("check_point（{}）须为 -1 或非负的 epoch", self.check_point));
        }
        if self.batch_size == 0 {
            return invalid("batch_size 必须大于 0".into());
        }
        if self.upscale_factor != UPSCALE_FACTOR {
            return invalid(format!("生成器固定放大 {UPSCALE_FACTOR} 倍"));
        }
        if self.crop_size < self.upscale_factor {
            return invalid(format!(
                "crop_size（{}）不能小于放大倍数 {}",
                self.crop_size, self.upscale_factor
            ));
        }
        if self.full_save_every == 0 {
            return invalid("full_save_every 必须大于 0".into());
        }
        for (name, (low, high)) in [
            ("real_label_range", self.real_label_range),
            ("fake_label_range", self.fake_label_range),
        ] {
            if low >= high {
                return invalid(format!("{name} 的下界须小于上界"));
            }
        }
        Ok(())
    }

    /// 写入 `{checkpoint_dir}/config.json`
    pub fn save(&self) -> Result<PathBuf, TrainError> {
        std::fs::create_dir_all(&self.checkpoint_dir)?;
        let path = self.checkpoint_dir.join("config.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}
