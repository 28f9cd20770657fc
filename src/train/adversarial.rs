/*
 * @Date         : 2026-02-10
 * @Description  : 对抗训练阶段：每个批次依次更新判别器与生成器
 *
 * 每个批次严格按以下顺序执行：
 *  1. 检查 D 的梯度，异常则终止
 *  2. 清空 D 的梯度
 *  3. G 由低分辨率输入生成假图（计算图保留）
 *  4. D 分别对真图、假图打分
 *  5. 软标签：真 ~ U[0.85, 1.10)，假 ~ U[0, 0.15)
 *  6. d_loss = bce(real_out, real_labels) + bce(fake_out, fake_labels)，保留计算图反向传播，D 更新
 *  7. 检查 G 的梯度，异常则终止
 *  8. 清空 G 的梯度
 *  9. image_loss = mse(fake, real)；D 重新对假图打分，adversarial_loss = bce(out, 1)
 * 10. tv_loss = tv(fake)
 * 11. g_loss = image_loss + 1e-3 * adversarial_loss + 2e-8 * tv_loss
 * 12. g_loss 反向传播（消耗保留的计算图），G 更新
 */

use super::TrainError;
use super::TrainConfig;
use super::grad_check::check_grads;
use super::metrics::{EpochMetrics, MetricsSink};
use super::session::{Network, TrainingSession};
use crate::data::TrainBatch;
use crate::model::{Discriminator, Generator};
use crate::nn::{Adam, Graph, Module, Optimizer, VarLossOps};
use crate::tensor::Tensor;
use rand::rngs::StdRng;

/// 一个 epoch 的结果
#[derive(Debug)]
pub(super) enum EpochOutcome {
    Completed(EpochMetrics),
    Aborted(Network),
}

/// 一个批次的各项损失
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
    pub d_loss: f32,
    pub mse_loss: f32,
    pub tv_loss: f32,
    pub adv_loss: f32,
    pub g_loss: f32,
}

impl StepLosses {
    fn accumulate_into(&self, cache: &mut EpochMetrics) {
        cache.add("d_loss", self.d_loss);
        cache.add("mse_loss", self.mse_loss);
        cache.add("tv_loss", self.tv_loss);
        cache.add("adv_loss", self.adv_loss);
        cache.add("g_loss", self.g_loss);
    }
}

/// 单批次的训练结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Updated(StepLosses),
    /// 梯度异常，本批次未做任何更新
    Aborted(Network),
}

/// 执行一个批次的对抗训练所需的上下文
pub struct AdversarialStep<'a> {
    pub graph: &'a Graph,
    pub generator: &'a Generator,
    pub discriminator: &'a Discriminator,
    pub config: &'a TrainConfig,
}

impl AdversarialStep<'_> {
    pub fn run(
        &self,
        batch: &TrainBatch,
        label_rng: &mut StdRng,
        optimizer_g: &mut Adam,
        optimizer_d: &mut Adam,
    ) -> Result<StepOutcome, TrainError> {
        let config = self.config;
        let lr = self.graph.input(&batch.lr);
        let real_hr = self.graph.input(&batch.hr);

        // 训练 D
        if !check_grads(self.discriminator, "D").is_healthy() {
            return Ok(StepOutcome::Aborted(Network::Discriminator));
        }
        self.discriminator.zero_grad();

        let fake_hr = self.generator.forward(&lr)?;
        let real_out = self.discriminator.forward(&real_hr)?;
        let fake_out = self.discriminator.forward(&fake_hr)?;

        let (real_low, real_high) = config.real_label_range;
        let (fake_low, fake_high) = config.fake_label_range;
        let real_labels = Tensor::uniform_with_rng(real_low, real_high, &real_out.shape(), label_rng);
        let fake_labels = Tensor::uniform_with_rng(fake_low, fake_high, &fake_out.shape(), label_rng);

        let d_loss = real_out
            .bce_loss(&self.graph.input(&real_labels))?
            .try_add(&fake_out.bce_loss(&self.graph.input(&fake_labels))?)?;
        let d_loss_value = d_loss.backward_retain_graph()?;
        optimizer_d.step()?;

        // 训练 G
        if !check_grads(self.generator, "G").is_healthy() {
            return Ok(StepOutcome::Aborted(Network::Generator));
        }
        self.generator.zero_grad();

        let image_loss = fake_hr.mse_loss(&real_hr)?;
        let fresh_fake_out = self.discriminator.forward(&fake_hr)?;
        let ones = self.graph.input(&Tensor::ones(&fresh_fake_out.shape()));
        let adversarial_loss = fresh_fake_out.bce_loss(&ones)?;
        let tv_loss = fake_hr.tv_loss()?;

        let g_loss = image_loss
            .try_add(&adversarial_loss.scale(config.adversarial_weight))?
            .try_add(&tv_loss.scale(config.tv_weight))?;
        let g_loss_value = g_loss.backward()?;
        optimizer_g.step()?;

        Ok(StepOutcome::Updated(StepLosses {
            d_loss: d_loss_value,
            mse_loss: image_loss.item()?,
            tv_loss: tv_loss.item()?,
            adv_loss: adversarial_loss.item()?,
            g_loss: g_loss_value,
        }))
    }
}

impl<S: MetricsSink> TrainingSession<S> {
    /// 对抗训练一个 epoch，返回累计的（未平均的）各项损失
    pub(super) fn adversarial_epoch(
        &mut self,
        epoch: usize,
        optimizer_g: &mut Adam,
        optimizer_d: &mut Adam,
    ) -> Result<EpochOutcome, TrainError> {
        self.graph.train();
        let bar = self.progress_bar(self.train_loader.len());
        let last_epoch = *self.config.epochs().end();
        let step = AdversarialStep {
            graph: &self.graph,
            generator: &self.generator,
            discriminator: &self.discriminator,
            config: &self.config,
        };

        let mut cache = EpochMetrics::new();
        for batch in self.train_loader.iter(epoch as u64) {
            let batch = batch?;
            match step.run(&batch, &mut self.label_rng, optimizer_g, optimizer_d)? {
                StepOutcome::Aborted(model) => {
                    bar.abandon();
                    return Ok(EpochOutcome::Aborted(model));
                }
                StepOutcome::Updated(losses) => {
                    losses.accumulate_into(&mut cache);
                    bar.set_message(format!(
                        "[{epoch}/{last_epoch}] Loss_D: {:.4} Loss_G: {:.4} = {:.4} + {:.4} + {:.4}",
                        losses.d_loss, losses.g_loss, losses.mse_loss, losses.tv_loss, losses.adv_loss
                    ));
                    bar.inc(1);
                }
            }
        }
        bar.finish_and_clear();
        Ok(EpochOutcome::Completed(cache))
    }
}
