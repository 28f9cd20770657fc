/*
 * @Date         : 2026-02-10
 * @Description  : 训练指标：单轮累加器与按 epoch 索引的指标输出
 */

use super::TrainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 一轮内的指标累加器：指标名 -> 累计和
///
/// 每轮开始时新建，轮末除以迭代次数得到平均值后丢弃。
#[derive(Debug, Clone, Default)]
pub struct EpochMetrics {
    sums: BTreeMap<&'static str, f64>,
}

impl EpochMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &'static str, value: f32) {
        *self.sums.entry(name).or_default() += f64::from(value);
    }

    pub fn sum(&self, name: &str) -> Option<f32> {
        self.sums.get(name).map(|&s| s as f32)
    }

    /// 各指标的平均值：累计和 / `count`；`count` 为 0 时返回空
    pub fn averages(&self, count: usize) -> Vec<(&'static str, f32)> {
        if count == 0 {
            return Vec::new();
        }
        self.sums
            .iter()
            .map(|(&name, &sum)| (name, (sum / count as f64) as f32))
            .collect()
    }
}

/// 一条指标记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    pub value: f32,
    pub step: usize,
}

/// 按 step（epoch）索引的键值时间序列输出
pub trait MetricsSink {
    fn log_value(&mut self, name: &str, value: f32, step: usize) -> Result<(), TrainError>;
}

/// 以 JSON Lines 形式追加写入 `{dir}/metrics.jsonl`
#[derive(Debug)]
pub struct JsonlMetricsSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlMetricsSink {
    pub fn create(dir: &Path) -> Result<Self, TrainError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("metrics.jsonl");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonlMetricsSink {
    fn log_value(&mut self, name: &str, value: f32, step: usize) -> Result<(), TrainError> {
        let record = MetricRecord {
            name: name.to_string(),
            value,
            step,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// 只保存在内存里的指标输出
#[derive(Debug, Clone, Default)]
pub struct MemoryMetricsSink {
    pub records: Vec<MetricRecord>,
}

impl MemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个指标的 (step, value) 序列
    pub fn series(&self, name: &str) -> Vec<(usize, f32)> {
        self.records
            .iter()
            .filter(|r| r.name == name)
            .map(|r| (r.step, r.value))
            .collect()
    }
}

impl MetricsSink for MemoryMetricsSink {
    fn log_value(&mut self, name: &str, value: f32, step: usize) -> Result<(), TrainError> {
        self.records.push(MetricRecord {
            name: name.to_string(),
            value,
            step,
        });
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn log_value(&mut self, name: &str, value: f32, step: usize) -> Result<(), TrainError> {
        (**self).log_value(name, value, step)
    }
}
