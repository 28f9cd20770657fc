/*
 * @Date         : 2026-02-10
 * @Description  : 预训练阶段：只用像素级 MSE 训练生成器
 */

use super::TrainError;
use super::checkpoint::{CheckpointTag, Component};
use super::metrics::{EpochMetrics, MetricsSink};
use super::session::TrainingSession;
use crate::nn::{Adam, Module, Optimizer, VarLossOps};
use tracing::info;

/// 预训练轮次的数据流标记（最高位），与对抗训练的同号 epoch 区分开
const PRETRAIN_STREAM: u64 = 1 << 63;

/// 预训练第 `epoch` 轮交给数据加载器的轮次键
pub(super) const fn pretrain_epoch_key(epoch: usize) -> u64 {
    PRETRAIN_STREAM | epoch as u64
}

impl<S: MetricsSink> TrainingSession<S> {
    /// 预训练生成器若干轮，结束时以 `pre` 标签保存
    ///
    /// 当前设备类别的 `pre` 检查点已存在时直接加载并跳过。
    /// 预训练用的优化器在结束后丢弃。
    pub(super) fn pretrain(&mut self) -> Result<(), TrainError> {
        let tag = CheckpointTag::Pre;
        if self.checkpoints.exists(Component::NetG, tag) {
            self.checkpoints
                .load_model(Component::NetG, tag, &self.generator)?;
            info!(
                "已加载预训练检查点 {}，跳过预训练",
                self.checkpoints.path(Component::NetG, tag).display()
            );
            return Ok(());
        }

        let total = self.config.pretrain_epochs;
        let mut optimizer = Adam::new(&self.generator.parameters(), self.config.learning_rate);
        self.graph.train();

        for epoch in 1..=total {
            let bar = self.progress_bar(self.train_loader.len());
            let mut cache = EpochMetrics::new();
            for batch in self.train_loader.iter(pretrain_epoch_key(epoch)) {
                let batch = batch?;
                let lr = self.graph.input(&batch.lr);
                let hr = self.graph.input(&batch.hr);

                let image_loss = self.generator.forward(&lr)?.mse_loss(&hr)?;
                let value = optimizer.minimize(&image_loss)?;
                cache.add("g_loss", value);

                bar.set_message(format!("[{epoch}/{total}] Loss_G: {value:.4}"));
                bar.inc(1);
            }
            bar.finish_and_clear();

            for (_, value) in cache.averages(self.train_loader.len()) {
                self.sink.log_value("pretrain_g_loss", value, epoch)?;
                info!("[预训练 {epoch}/{total}] Loss_G: {value:.4}");
            }
        }

        let path = self
            .checkpoints
            .save_model(Component::NetG, tag, &self.generator)?;
        info!("预训练完成，生成器已保存到 {}", path.display());
        Ok(())
    }
}
