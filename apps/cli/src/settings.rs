//! CLI 配置文件
//!
//! 默认位置 `$CONFIG_DIR/amplink/config.toml`，文件不存在时使用默认值。
//!
//! ```toml
//! [serial]
//! path = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [driver]
//! tick_ms = 500
//! ```

use amplink_driver::{DriverConfig, TtyConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("无法确定配置目录")?;
    path.push("amplink");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 串口设置
    pub serial: TtyConfig,
    /// 工作线程设置
    pub driver: DriverConfig,
}

impl Settings {
    /// 从文件加载（文件不存在时返回默认值）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 按优先级解析：`--config` 指定的文件，否则默认路径
    pub fn resolve(config: Option<&Path>, device: Option<&str>) -> Result<(Self, PathBuf)> {
        let path = match config {
            Some(path) => path.to_path_buf(),
            None => default_config_file()?,
        };
        let mut settings = Self::load(&path)?;

        // 命令行参数优先
        if let Some(device) = device {
            settings.serial.path = device.to_string();
        }
        Ok((settings, path))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置失败")
    }
}
