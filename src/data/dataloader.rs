/*
 * @Date         : 2026-02-09
 * @Description  : DataLoader - PyTorch 风格的数据批量加载器
 *
 * 提供统一的数据迭代 API，支持：
 * - 自动分批 (batch_size)
 * - 按轮次播种的随机打乱 (shuffle)
 * - 专用解码线程池 (num_workers)，一个批次内的样本并行解码
 */

use super::DataError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// 可按索引读取样本、并能把样本拼成批次的数据集
///
/// `get` 接收一个样本级的种子，随机裁剪等操作只从它派生随机数，
/// 因此并行解码的结果与解码顺序无关。
pub trait Dataset: Send + Sync {
    type Sample: Send;
    type Batch;

    /// 样本数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 读取第 `index` 个样本
    fn get(&self, index: usize, seed: u64) -> Result<Self::Sample, DataError>;

    /// 把若干样本拼成一个批次
    fn collate(samples: Vec<Self::Sample>) -> Result<Self::Batch, DataError>;
}

/// DataLoader - PyTorch 风格的数据批量加载器
///
/// # 示例
/// ```ignore
/// let loader = DataLoader::new(TrainDataset::new("data/train", 64, 4)?, 64)
///     .shuffle(true)
///     .seed(42)
///     .num_workers(2)?;
///
/// for batch in loader.iter(epoch) {
///     let batch = batch?;
///     // batch.lr: [N, 3, 16, 16]，batch.hr: [N, 3, 64, 64]
/// }
/// ```
pub struct DataLoader<D: Dataset> {
    dataset: D,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
    pool: Option<ThreadPool>,
}

impl<D: Dataset> DataLoader<D> {
    /// 创建新的 DataLoader（不打乱，在当前线程解码）
    ///
    /// # Panics
    /// `batch_size` 为 0 时
    pub fn new(dataset: D, batch_size: usize) -> Self {
        assert!(batch_size > 0, "DataLoader: batch_size 必须大于 0");
        Self {
            dataset,
            batch_size,
            shuffle: false,
            seed: 0,
            pool: None,
        }
    }

    /// 设置是否打乱数据
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// 设置随机种子（用于 shuffle 与样本级随机变换）
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 设置专用解码线程数；0 表示在当前线程解码
    pub fn num_workers(mut self, workers: usize) -> Result<Self, DataError> {
        self.pool = if workers == 0 {
            None
        } else {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("data-worker-{i}"))
                    .build()
                    .map_err(|e| DataError::WorkerPool(e.to_string()))?,
            )
        };
        Ok(self)
    }

    /// 批次数量（不丢弃最后一个不完整的批次）
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub const fn dataset(&self) -> &D {
        &self.dataset
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 创建第 `epoch` 轮的迭代器；同一种子、同一轮次的顺序与随机裁剪完全一致
    pub fn iter(&self, epoch: u64) -> DataLoaderIterator<'_, D> {
        let epoch_seed = mix_seed(self.seed, epoch);
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(epoch_seed);
            indices.shuffle(&mut rng);
        }

        DataLoaderIterator {
            loader: self,
            indices,
            epoch_seed,
            current_batch: 0,
        }
    }

    fn load_batch(&self, indices: &[usize], epoch_seed: u64) -> Result<D::Batch, DataError> {
        let decode = || {
            indices
                .par_iter()
                .map(|&idx| self.dataset.get(idx, mix_seed(epoch_seed, idx as u64)))
                .collect::<Result<Vec<_>, _>>()
        };
        let samples = match &self.pool {
            Some(pool) => pool.install(decode),
            None => decode(),
        }?;
        D::collate(samples)
    }
}

/// DataLoader 迭代器
pub struct DataLoaderIterator<'a, D: Dataset> {
    loader: &'a DataLoader<D>,
    indices: Vec<usize>,
    epoch_seed: u64,
    current_batch: usize,
}

impl<D: Dataset> Iterator for DataLoaderIterator<'_, D> {
    type Item = Result<D::Batch, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch_size = self.loader.batch_size;
        let start = self.current_batch * batch_size;
        if start >= self.indices.len() {
            return None;
        }
        let end = (start + batch_size).min(self.indices.len());
        self.current_batch += 1;

        Some(
            self.loader
                .load_batch(&self.indices[start..end], self.epoch_seed),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.loader.len().saturating_sub(self.current_batch);
        (remaining, Some(remaining))
    }
}

impl<D: Dataset> ExactSizeIterator for DataLoaderIterator<'_, D> {}

/// splitmix64 风格的种子混合
fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
