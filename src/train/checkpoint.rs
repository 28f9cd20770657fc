/*
 * @Date         : 2026-02-10
 * @Description  : 检查点管理：网络权重与优化器状态的保存/恢复
 *
 * 文件布局：`{dir}/{component}_epoch_{tag}_{device}.bin`
 * - component: netG / netD / optimizerG / optimizerD
 * - tag: epoch 序号或 `pre`（预训练）
 * - device: cpu / gpu
 *
 * 文件内容：4 字节魔数 + 4 字节版本（小端），之后是 bincode 编码的
 * {component, tag, device, payload}；payload 对网络是 StateDict，对优化器是 AdamState。
 */

use super::DeviceClass;
use crate::nn::{Adam, AdamState, GraphError, Module, StateDict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// 检查点文件魔数
const CHECKPOINT_MAGIC: [u8; 4] = *b"SRCK";
/// 检查点文件版本
const CHECKPOINT_VERSION: u32 = 1;

/// 检查点相关错误
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(
        "无法从 epoch {tag} 恢复，缺少检查点文件：{}（判别器与优化器状态只在 epoch 为 {cadence} 的倍数时保存）",
        display_paths(.files)
    )]
    Missing {
        tag: CheckpointTag,
        files: Vec<PathBuf>,
        cadence: usize,
    },
    #[error("检查点 {path} 读写失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("检查点 {path} 编解码失败: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("{0} 不是检查点文件（魔数不符）")]
    BadMagic(PathBuf),
    #[error("检查点 {path} 的版本 {found} 不受支持（当前版本 {}）", CHECKPOINT_VERSION)]
    UnsupportedVersion { path: PathBuf, found: u32 },
    #[error("检查点 {path} 存放的是 {found}，期望 {expected}")]
    ComponentMismatch {
        path: PathBuf,
        expected: Component,
        found: Component,
    },
    #[error("检查点 {path} 中不是{expected}状态")]
    WrongPayload { path: PathBuf, expected: &'static str },
    #[error("恢复检查点 {path} 失败: {source}")]
    State {
        path: PathBuf,
        #[source]
        source: GraphError,
    },
}

fn display_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 检查点组成部分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    NetG,
    NetD,
    OptimizerG,
    OptimizerD,
}

impl Component {
    pub const ALL: [Self; 4] = [Self::NetG, Self::NetD, Self::OptimizerG, Self::OptimizerD];

    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::NetG => "netG",
            Self::NetD => "netD",
            Self::OptimizerG => "optimizerG",
            Self::OptimizerD => "optimizerD",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// 检查点标签：预训练或某个 epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointTag {
    Pre,
    Epoch(usize),
}

impl fmt::Display for CheckpointTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => f.write_str("pre"),
            Self::Epoch(epoch) => write!(f, "{epoch}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
enum Payload {
    Model(StateDict),
    Optimizer(AdamState),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    component: Component,
    tag: CheckpointTag,
    device: DeviceClass,
    payload: Payload,
}

/// 检查点管理器（目录与设备类别在创建时确定）
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
    device: DeviceClass,
    /// 判别器与优化器的保存间隔
    cadence: usize,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>, device: DeviceClass, cadence: usize) -> Self {
        Self {
            dir: dir.into(),
            device,
            cadence: cadence.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn device(&self) -> DeviceClass {
        self.device
    }

    /// `{dir}/{component}_epoch_{tag}_{device}.bin`
    pub fn path(&self, component: Component, tag: CheckpointTag) -> PathBuf {
        self.dir
            .join(format!("{component}_epoch_{tag}_{}.bin", self.device))
    }

    pub fn exists(&self, component: Component, tag: CheckpointTag) -> bool {
        self.path(component, tag).is_file()
    }

    /// 该 epoch 是否保存判别器与优化器状态
    pub const fn saves_full_state(&self, epoch: usize) -> bool {
        epoch % self.cadence == 0
    }

    pub fn save_model(
        &self,
        component: Component,
        tag: CheckpointTag,
        model: &impl Module,
    ) -> Result<PathBuf, CheckpointError> {
        self.write(component, tag, Payload::Model(model.state_dict()))
    }

    pub fn save_optimizer(
        &self,
        component: Component,
        tag: CheckpointTag,
        optimizer: &Adam,
    ) -> Result<PathBuf, CheckpointError> {
        self.write(component, tag, Payload::Optimizer(optimizer.state_dict()))
    }

    pub fn load_model(
        &self,
        component: Component,
        tag: CheckpointTag,
        model: &impl Module,
    ) -> Result<(), CheckpointError> {
        let path = self.path(component, tag);
        match self.read(component, tag)? {
            Payload::Model(state) => model
                .load_state_dict(&state)
                .map_err(|source| CheckpointError::State { path, source }),
            Payload::Optimizer(_) => Err(CheckpointError::WrongPayload {
                path,
                expected: "网络",
            }),
        }
    }

    pub fn load_optimizer(
        &self,
        component: Component,
        tag: CheckpointTag,
        optimizer: &mut Adam,
    ) -> Result<(), CheckpointError> {
        let path = self.path(component, tag);
        match self.read(component, tag)? {
            Payload::Optimizer(state) => optimizer
                .load_state_dict(state)
                .map_err(|source| CheckpointError::State { path, source }),
            Payload::Model(_) => Err(CheckpointError::WrongPayload {
                path,
                expected: "优化器",
            }),
        }
    }

    /// 保存一个 epoch 的检查点：生成器每轮都保存，判别器与两个优化器只在间隔整数倍时保存
    pub fn save_epoch(
        &self,
        epoch: usize,
        generator: &impl Module,
        discriminator: &impl Module,
        optimizer_g: &Adam,
        optimizer_d: &Adam,
    ) -> Result<(), CheckpointError> {
        let tag = CheckpointTag::Epoch(epoch);
        self.save_model(Component::NetG, tag, generator)?;
        if self.saves_full_state(epoch) {
            self.save_model(Component::NetD, tag, discriminator)?;
            self.save_optimizer(Component::OptimizerG, tag, optimizer_g)?;
            self.save_optimizer(Component::OptimizerD, tag, optimizer_d)?;
        }
        Ok(())
    }

    /// 恢复某个 epoch 的全部四份状态；先确认文件齐全，缺失时列出所有缺少的文件
    pub fn load_epoch(
        &self,
        epoch: usize,
        generator: &impl Module,
        discriminator: &impl Module,
        optimizer_g: &mut Adam,
        optimizer_d: &mut Adam,
    ) -> Result<(), CheckpointError> {
        let tag = CheckpointTag::Epoch(epoch);
        let missing: Vec<PathBuf> = Component::ALL
            .iter()
            .map(|&c| self.path(c, tag))
            .filter(|p| !p.is_file())
            .collect();
        if !missing.is_empty() {
            return Err(CheckpointError::Missing {
                tag,
                files: missing,
                cadence: self.cadence,
            });
        }

        self.load_model(Component::NetG, tag, generator)?;
        self.load_model(Component::NetD, tag, discriminator)?;
        self.load_optimizer(Component::OptimizerG, tag, optimizer_g)?;
        self.load_optimizer(Component::OptimizerD, tag, optimizer_d)?;
        Ok(())
    }

    fn write(
        &self,
        component: Component,
        tag: CheckpointTag,
        payload: Payload,
    ) -> Result<PathBuf, CheckpointError> {
        let path = self.path(component, tag);
        let io_err = |source| CheckpointError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
        writer.write_all(&CHECKPOINT_MAGIC).map_err(io_err)?;
        writer
            .write_all(&CHECKPOINT_VERSION.to_le_bytes())
            .map_err(io_err)?;

        let envelope = Envelope {
            component,
            tag,
            device: self.device,
            payload,
        };
        bincode::serialize_into(&mut writer, &envelope).map_err(|source| {
            CheckpointError::Encoding {
                path: path.clone(),
                source,
            }
        })?;
        // 缓冲区在 drop 时的刷新会吞掉错误
        writer.flush().map_err(io_err)?;
        debug!("已保存检查点 {}", path.display());
        Ok(path)
    }

    fn read(&self, component: Component, tag: CheckpointTag) -> Result<Payload, CheckpointError> {
        let path = self.path(component, tag);
        let io_err = |source| CheckpointError::Io {
            path: path.clone(),
            source,
        };
        let mut reader = BufReader::new(File::open(&path).map_err(io_err)?);

        let mut header = [0u8; 8];
        if let Err(e) = reader.read_exact(&mut header) {
            return Err(if e.kind() == ErrorKind::UnexpectedEof {
                CheckpointError::BadMagic(path)
            } else {
                io_err(e)
            });
        }
        if header[..4] != CHECKPOINT_MAGIC {
            return Err(CheckpointError::BadMagic(path));
        }
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                path,
                found: version,
            });
        }

        let envelope: Envelope = bincode::deserialize_from(&mut reader).map_err(|source| {
            CheckpointError::Encoding {
                path: path.clone(),
                source,
            }
        })?;
        if envelope.component != component {
            return Err(CheckpointError::ComponentMismatch {
                path,
                expected: component,
                found: envelope.component,
            });
        }
        if envelope.device != self.device {
            warn!(
                "检查点 {} 由 {} 设备保存，当前为 {}",
                path.display(),
                envelope.device,
                self.device
            );
        }
        debug!("已读取检查点 {}", path.display());
        Ok(envelope.payload)
    }
}
