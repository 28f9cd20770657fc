/*
 * @Date         : 2026-02-10
 * @Description  : 设备类别：决定检查点文件名的 `_cpu` / `_gpu` 后缀
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// 设备类别，启动时解析一次，之后所有路径都由它构造
///
/// 两种设备产生的检查点文件互不通用，靠文件名后缀区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Cpu,
    Gpu,
}

impl DeviceClass {
    /// 解析当前运行的设备类别（自动微分引擎只有 CPU 实现）
    pub const fn detect() -> Self {
        Self::Cpu
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
