/*
 * @Date         : 2026-02-10
 * @Description  : 验证与可视化：计算验证集 PSNR/SSIM，并把对比图写入 vis/
 */

use super::TrainError;
use super::metrics::MetricsSink;
use super::session::TrainingSession;
use crate::data::transforms::display_transform;
use crate::metrics::{mse, psnr_from_mse, ssim};
use crate::tensor::Tensor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 每张可视化条带的列数与间隔
const STRIP_COLUMNS: usize = 3;
const STRIP_PADDING: usize = 5;

/// 一轮验证的结果（已按样本数平均）
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub psnr: f32,
    pub ssim: f32,
    pub samples: usize,
    /// 写出的可视化图像路径
    pub images: Vec<PathBuf>,
}

/// 把 PSNR 截断到 `cap_db`（完美重建时 PSNR 为 +∞）
pub fn clamp_psnr(psnr: f32, cap_db: f32) -> f32 {
    if psnr > cap_db {
        debug!("PSNR {psnr} dB 被截断为 {cap_db} dB");
        cap_db
    } else {
        psnr
    }
}

/// 可视化图像缓冲：按 {双三次基线, 真值, 生成} 三元组收集，总数达到上限后不再接收
#[derive(Debug, Clone)]
pub struct VisualizationBuffer {
    cap: usize,
    images: Vec<Tensor>,
}

impl VisualizationBuffer {
    pub const fn new(cap: usize) -> Self {
        Self {
            cap,
            images: Vec::new(),
        }
    }

    /// 已持有的图像数
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// 持有图像数少于上限时，把三张图做显示变换后加入；返回是否加入
    pub fn push_triplet(
        &mut self,
        hr_restore: &Tensor,
        hr: &Tensor,
        sr: &Tensor,
    ) -> Result<bool, TrainError> {
        if self.images.len() >= self.cap {
            return Ok(false);
        }
        for image in [hr_restore, hr, sr] {
            self.images.push(display_transform(image)?);
        }
        Ok(true)
    }

    /// 每个三元组排成一行（padding 5），写为 `{dir}/epoch_{epoch}_index_{i}.png`，i 从 1 开始
    pub fn write_strips(&self, dir: &Path, epoch: usize) -> Result<Vec<PathBuf>, TrainError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (i, triplet) in self.images.chunks(STRIP_COLUMNS).enumerate() {
            let refs: Vec<&Tensor> = triplet.iter().collect();
            let strip = Tensor::make_grid(&refs, STRIP_COLUMNS, STRIP_PADDING);
            let path = dir.join(format!("epoch_{epoch}_index_{}.png", i + 1));
            strip.to_rgb_image()?.save(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}

impl<S: MetricsSink> TrainingSession<S> {
    /// 在验证集上评估生成器（评估模式、不记录梯度），记录平均 PSNR/SSIM 并写出对比图
    pub(super) fn validate(&mut self, epoch: usize) -> Result<ValidationReport, TrainError> {
        self.graph.eval();
        let result = self.graph.no_grad(|| self.validation_pass(epoch));
        self.graph.train();
        let report = result?;

        self.sink.log_value("ssim", report.ssim, epoch)?;
        self.sink.log_value("psnr", report.psnr, epoch)?;
        Ok(report)
    }

    fn validation_pass(&self, epoch: usize) -> Result<ValidationReport, TrainError> {
        let cap_db = self.config.psnr_cap_db;
        let bar = self.progress_bar(self.dev_loader.len());
        let mut buffer = VisualizationBuffer::new(self.config.vis_image_cap);
        let (mut psnr_sum, mut ssim_sum) = (0.0_f64, 0.0_f64);

        for batch in self.dev_loader.iter(0) {
            let batch = batch?;
            let sr = self.generator.forward(&self.graph.input(&batch.lr))?.value();

            let psnr = clamp_psnr(psnr_from_mse(mse(&sr, &batch.hr)?), cap_db);
            let sample_ssim = ssim(&sr, &batch.hr)?;
            psnr_sum += f64::from(psnr);
            ssim_sum += f64::from(sample_ssim);
            bar.set_message(format!(
                "[converting LR images to SR images] PSNR: {psnr:.4} dB SSIM: {sample_ssim:.4}"
            ));
            bar.inc(1);

            for i in 0..batch.hr.shape()[0] {
                buffer.push_triplet(&batch.hr_restore.select(i), &batch.hr.select(i), &sr.select(i))?;
            }
        }
        bar.finish_and_clear();

        let samples = self.dev_loader.len();
        let images = buffer.write_strips(&self.config.vis_dir, epoch)?;
        let denominator = samples.max(1) as f64;
        Ok(ValidationReport {
            psnr: (psnr_sum / denominator) as f32,
            ssim: (ssim_sum / denominator) as f32,
            samples,
            images,
        })
    }
}
