/*
 * @Date         : 2026-02-11
 * @Description  : srgan-train：SRGAN 训练命令行入口
 */

use anyhow::{Context, Result};
use clap::Parser;
use srgan::train::{JsonlMetricsSink, TrainConfig, TrainOutcome, TrainingSession};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "srgan-train")]
#[command(about = "训练 4 倍超分辨率生成对抗网络（SRGAN）")]
struct Cli {
    /// 训练图像裁剪尺寸
    #[arg(long = "crop_size", default_value_t = 64)]
    crop_size: usize,

    /// 对抗训练轮数
    #[arg(long = "num_epochs", default_value_t = 100)]
    num_epochs: usize,

    #[arg(long = "batch_size", default_value_t = 64)]
    batch_size: usize,

    /// 训练图像目录
    #[arg(long = "train_set", default_value = "data/train")]
    train_set: PathBuf,

    /// 从该 epoch 的检查点恢复，-1 表示全新训练
    #[arg(long = "check_point", default_value_t = -1, allow_negative_numbers = true)]
    check_point: i64,

    /// 随机种子
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl Cli {
    fn into_config(self) -> TrainConfig {
        TrainConfig {
            crop_size: self.crop_size,
            num_epochs: self.num_epochs,
            batch_size: self.batch_size,
            train_set: self.train_set,
            check_point: self.check_point,
            seed: self.seed,
            ..TrainConfig::default()
        }
    }
}

fn run(cli: Cli) -> Result<TrainOutcome> {
    let config = cli.into_config();
    let sink = JsonlMetricsSink::create(&config.log_dir)
        .with_context(|| format!("无法创建指标日志目录 {}", config.log_dir.display()))?;
    let mut session = TrainingSession::new(config, sink).context("初始化训练会话失败")?;
    session.run().context("训练失败")
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(TrainOutcome::Completed { last_epoch }) => {
            info!("训练完成，最后一个 epoch 为 {last_epoch}");
            ExitCode::SUCCESS
        }
        Ok(TrainOutcome::Aborted { epoch, model }) => {
            error!("{model} 的梯度异常，训练在 epoch {epoch} 中止；最近保存的检查点仍然有效");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
