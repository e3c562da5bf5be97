//! 工作线程配置

use amplink_protocol::{PING_INTERVAL, POLL_TIMEOUT, RECONNECT_COOLDOWN, WORKER_TICK};
use std::time::Duration;

/// 工作线程的时间节奏与队列容量
///
/// 默认值与设备的参考节奏一致；测试中可以把节拍缩短到毫秒级。
///
/// # Example
///
/// ```
/// use amplink_driver::DriverConfig;
/// use std::time::Duration;
///
/// let config = DriverConfig {
///     tick_ms: 10,
///     ..DriverConfig::default()
/// };
/// assert_eq!(config.tick(), Duration::from_millis(10));
/// assert_eq!(config.reconnect_cooldown(), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverConfig {
    /// 等待命令的最长时间（毫秒）
    pub tick_ms: u64,
    /// 单次回显轮询超时（毫秒）
    pub poll_timeout_ms: u64,
    /// 打开失败后的冷却时间（毫秒）
    pub reconnect_cooldown_ms: u64,
    /// 两次 Ping 的最小间隔（毫秒）
    pub ping_interval_ms: u64,
    /// 命令队列容量
    pub channel_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_ms: WORKER_TICK.as_millis() as u64,
            poll_timeout_ms: POLL_TIMEOUT.as_millis() as u64,
            reconnect_cooldown_ms: RECONNECT_COOLDOWN.as_millis() as u64,
            ping_interval_ms: PING_INTERVAL.as_millis() as u64,
            channel_capacity: 16,
        }
    }
}

impl DriverConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn reconnect_cooldown(&self) -> Duration {
        Duration::from_millis(self.reconnect_cooldown_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}
