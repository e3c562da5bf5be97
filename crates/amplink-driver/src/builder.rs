//! Builder 模式实现
//!
//! 提供链式构造 `SerialDriver` 实例的便捷方式。

use crate::config::DriverConfig;
use crate::driver::SerialDriver;
use crate::error::DriverError;
use amplink_serial::{SerialTransport, TtyConfig};
use std::time::Duration;

/// SerialDriver Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use amplink_driver::{DriverBuilder, DriverConfig};
///
/// // 使用默认设备
/// let driver = DriverBuilder::new().build()?;
/// driver.shutdown();
///
/// // 自定义设备路径和节拍
/// let driver = DriverBuilder::new()
///     .device_path("/dev/ttyUSB0")
///     .baud_rate(19200)
///     .config(DriverConfig {
///         tick_ms: 100,
///         ..DriverConfig::default()
///     })
///     .build()?;
/// driver.shutdown();
/// # Ok::<(), amplink_driver::DriverError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DriverBuilder {
    tty: TtyConfig,
    config: DriverConfig,
}

impl DriverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置设备路径（默认 USB 转串口适配器）
    pub fn device_path(mut self, path: impl Into<String>) -> Self {
        self.tty.path = path.into();
        self
    }

    /// 设置波特率（默认 9600）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.tty.baud_rate = baud_rate;
        self
    }

    /// 设置打开后的稳定等待时间（默认 1 秒）
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.tty.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// 整体替换串口配置
    pub fn tty_config(mut self, tty: TtyConfig) -> Self {
        self.tty = tty;
        self
    }

    /// 设置工作线程配置
    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tty(&self) -> &TtyConfig {
        &self.tty
    }

    pub fn driver_config(&self) -> &DriverConfig {
        &self.config
    }

    /// 使用 termios 串口构建驱动
    #[cfg(unix)]
    pub fn build(self) -> Result<SerialDriver, DriverError> {
        let port = amplink_serial::TtyPort::new(self.tty);
        SerialDriver::initialize(port, self.config)
    }

    /// 使用任意传输构建驱动（忽略串口配置）
    pub fn build_with_transport<T>(self, transport: T) -> Result<SerialDriver, DriverError>
    where
        T: SerialTransport + Send + 'static,
    {
        SerialDriver::initialize(transport, self.config)
    }
}
