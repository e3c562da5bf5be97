//! 命令定义和实现

pub mod config;
pub mod monitor;
pub mod volume;

pub use config::ConfigCommand;
pub use monitor::MonitorCommand;
pub use volume::VolumeCommand;

use amplink_driver::{DriverBuilder, SerialDriver};
use anyhow::{Context, Result};

use crate::settings::Settings;

/// 按配置启动驱动
pub fn start_driver(settings: &Settings) -> Result<SerialDriver> {
    DriverBuilder::new()
        .tty_config(settings.serial.clone())
        .config(settings.driver.clone())
        .build()
        .with_context(|| format!("启动串口驱动失败: {}", settings.serial.path))
}
