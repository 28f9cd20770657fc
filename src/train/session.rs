/*
 * @Date         : 2026-02-10
 * @Description  : 训练会话：持有模型、数据、检查点与指标输出，串起预训练、对抗训练与验证
 *
 * 各阶段分别在 pretrain.rs / adversarial.rs / validation.rs 中为 TrainingSession 实现。
 */

use super::adversarial::EpochOutcome;
use super::checkpoint::CheckpointManager;
use super::metrics::MetricsSink;
use super::{DeviceClass, TrainConfig, TrainError};
use crate::data::{DataLoader, DevDataset, TrainDataset};
use crate::model::{Discriminator, Generator};
use crate::nn::{Adam, Graph, Module};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use tracing::{info, warn};

/// 标签噪声随机数生成器的种子偏移（与权重初始化的随机数流分开）
const LABEL_SEED_SALT: u64 = 0x5EED_1AB3;

/// GAN 中的两个网络
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Generator,
    Discriminator,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generator => "G",
            Self::Discriminator => "D",
        })
    }
}

/// 一次训练运行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// 所有 epoch 正常完成
    Completed { last_epoch: usize },
    /// 梯度异常，运行在该 epoch 中途终止；最近保存的检查点仍是有效状态
    Aborted { epoch: usize, model: Network },
}

/// 训练会话
pub struct TrainingSession<S: MetricsSink> {
    pub(super) config: TrainConfig,
    pub(super) graph: Graph,
    pub(super) generator: Generator,
    pub(super) discriminator: Discriminator,
    pub(super) checkpoints: CheckpointManager,
    pub(super) train_loader: DataLoader<TrainDataset>,
    pub(super) dev_loader: DataLoader<DevDataset>,
    pub(super) sink: S,
    pub(super) label_rng: StdRng,
    show_progress: bool,
}

impl<S: MetricsSink> TrainingSession<S> {
    /// 创建会话：校验配置、构建网络与数据加载器，并把配置写入检查点目录
    pub fn new(config: TrainConfig, sink: S) -> Result<Self, TrainError> {
        config.validate()?;
        let device = DeviceClass::detect();
        if device == DeviceClass::Cpu {
            warn!("正在使用 CPU 训练");
        }

        let graph = Graph::new_with_seed(config.seed);
        let generator = Generator::new(&graph, config.generator)?;
        info!("生成器参数量: {}", generator.num_params());
        let discriminator = Discriminator::new(&graph, config.discriminator)?;
        info!("判别器参数量: {}", discriminator.num_params());

        let train_set = TrainDataset::new(&config.train_set, config.crop_size, config.upscale_factor)?;
        let train_loader = DataLoader::new(train_set, config.batch_size)
            .shuffle(true)
            .seed(config.seed)
            .num_workers(config.train_workers)?;
        let dev_set = DevDataset::new(&config.dev_set, config.upscale_factor)?;
        let dev_loader = DataLoader::new(dev_set, 1).num_workers(config.dev_workers)?;

        let config_path = config.save()?;
        info!("训练配置已写入 {}", config_path.display());

        Ok(Self {
            checkpoints: CheckpointManager::new(
                &config.checkpoint_dir,
                device,
                config.full_save_every,
            ),
            label_rng: StdRng::seed_from_u64(config.seed ^ LABEL_SEED_SALT),
            config,
            graph,
            generator,
            discriminator,
            train_loader,
            dev_loader,
            sink,
            show_progress: true,
        })
    }

    /// 是否显示进度条（测试中关闭）
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// 执行完整训练：（全新训练时）预训练 -> 恢复检查点 -> 对抗训练若干 epoch
    pub fn run(&mut self) -> Result<TrainOutcome, TrainError> {
        if self.config.is_fresh_start() {
            self.pretrain()?;
        }

        let lr = self.config.learning_rate;
        let mut optimizer_g = Adam::new(&self.generator.parameters(), lr);
        let mut optimizer_d = Adam::new(&self.discriminator.parameters(), lr);

        if !self.config.is_fresh_start() {
            let epoch = self.config.start_epoch();
            self.checkpoints.load_epoch(
                epoch,
                &self.generator,
                &self.discriminator,
                &mut optimizer_g,
                &mut optimizer_d,
            )?;
            info!("已从 epoch {epoch} 的检查点恢复");
        }

        let epochs = self.config.epochs();
        let last_epoch = *epochs.end();
        for epoch in epochs {
            match self.adversarial_epoch(epoch, &mut optimizer_g, &mut optimizer_d)? {
                EpochOutcome::Aborted(model) => {
                    warn!("{model} 的梯度异常，训练在 epoch {epoch} 终止");
                    return Ok(TrainOutcome::Aborted { epoch, model });
                }
                EpochOutcome::Completed(cache) => {
                    let batches = self.train_loader.len();
                    for (name, value) in cache.averages(batches) {
                        self.sink.log_value(name, value, epoch)?;
                    }
                    info!(
                        "[{epoch}/{last_epoch}] Loss_D: {:.4} Loss_G: {:.4}",
                        cache.sum("d_loss").unwrap_or(0.0) / batches.max(1) as f32,
                        cache.sum("g_loss").unwrap_or(0.0) / batches.max(1) as f32,
                    );
                }
            }

            self.checkpoints.save_epoch(
                epoch,
                &self.generator,
                &self.discriminator,
                &optimizer_g,
                &optimizer_d,
            )?;

            let report = self.validate(epoch)?;
            info!(
                "[{epoch}/{last_epoch}] PSNR: {:.4} dB SSIM: {:.4}",
                report.psnr, report.ssim
            );
        }
        Ok(TrainOutcome::Completed { last_epoch })
    }

    pub const fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    pub const fn generator(&self) -> &Generator {
        &self.generator
    }

    pub const fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    pub const fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub(super) fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar
    }
}
