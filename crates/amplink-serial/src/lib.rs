//! # Amplink Serial Transport Layer
//!
//! 串口硬件抽象层，提供统一的传输接口。
//!
//! - [`SerialTransport`]: 工作线程使用的传输 trait
//! - [`TtyPort`]: 基于 termios 的真实串口（仅 unix）
//! - [`mock::MockTransport`]: 可编程的模拟设备（`mock` feature）

use std::time::Duration;
use thiserror::Error;

pub use amplink_protocol::{DEFAULT_BAUD_RATE, DEFAULT_DEVICE_PATH, SETTLE_DELAY};

#[cfg(unix)]
pub mod tty;

#[cfg(unix)]
pub use tty::TtyPort;

#[cfg(feature = "mock")]
pub mod mock;

/// 串口层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 打开/配置过程中某一步失败
    #[error("{stage}: {source}")]
    Setup {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Port not open")]
    NotOpen,

    #[error("Read timeout")]
    Timeout,

    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),
}

impl SerialError {
    /// 包装某个配置步骤的 OS 错误
    pub fn setup(stage: &'static str, source: impl Into<std::io::Error>) -> Self {
        Self::Setup {
            stage,
            source: source.into(),
        }
    }
}

/// 串口配置
///
/// # Example
///
/// ```
/// use amplink_serial::TtyConfig;
///
/// let config = TtyConfig {
///     path: "/dev/ttyUSB0".into(),
///     ..TtyConfig::default()
/// };
/// assert_eq!(config.baud_rate, 9600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TtyConfig {
    /// 设备路径
    pub path: String,
    /// 波特率
    pub baud_rate: u32,
    /// 打开后的稳定等待时间（毫秒）
    pub settle_delay_ms: u64,
}

impl Default for TtyConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DEVICE_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            settle_delay_ms: SETTLE_DELAY.as_millis() as u64,
        }
    }
}

impl TtyConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// 串口传输接口
///
/// 实现者由工作线程独占，不需要 `Sync`。
pub trait SerialTransport {
    /// 打开并配置端口
    ///
    /// 返回成功时端口必须已可用（包括稳定等待）。
    fn open(&mut self) -> Result<(), SerialError>;

    /// 关闭端口并恢复原始配置（幂等）
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// 写入全部字节
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError>;

    /// 等待输出缓冲区发送完毕
    fn drain(&mut self) -> Result<(), SerialError> {
        Ok(())
    }

    /// 等待最多 `timeout` 后读取可用字节
    ///
    /// - `Ok(n)`: 读到 `n >= 1` 个字节
    /// - `Err(SerialError::Timeout)`: 超时内没有数据
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError>;
}

impl<T: SerialTransport + ?Sized> SerialTransport for Box<T> {
    fn open(&mut self) -> Result<(), SerialError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        (**self).write_all(bytes)
    }

    fn drain(&mut self) -> Result<(), SerialError> {
        (**self).drain()
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        (**self).read_timeout(buf, timeout)
    }
}
