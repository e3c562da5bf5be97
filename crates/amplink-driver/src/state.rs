//! 连接状态
//!
//! 由工作线程发布，任何线程都可以无锁读取。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// 工作线程的连接状态
///
/// - **Disconnected**: 端口关闭，等待下一次重连
/// - **Connected**: 端口已打开并完成配置
/// - **ShutDown**: 收到 `Quit`，端口已关闭，线程已退出（终态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connected = 1,
    ShutDown = 2,
}

impl ConnectionState {
    /// 从 u8 转换，无效值视为 Disconnected
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connected,
            2 => Self::ShutDown,
            _ => Self::Disconnected,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    pub fn is_shut_down(self) -> bool {
        self == Self::ShutDown
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

/// 连接状态（原子版本，用于线程间共享）
#[derive(Debug, Default)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: ConnectionState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }

    /// 设置新状态，返回旧状态
    pub fn swap(&self, state: ConnectionState, ordering: Ordering) -> ConnectionState {
        ConnectionState::from_u8(self.inner.swap(state.as_u8(), ordering))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8() {
        assert_eq!(ConnectionState::from_u8(0), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::from_u8(1), ConnectionState::Connected);
        assert_eq!(ConnectionState::from_u8(2), ConnectionState::ShutDown);
        assert_eq!(ConnectionState::from_u8(255), ConnectionState::Disconnected); // 无效值
    }

    #[test]
    fn test_atomic_state() {
        let state = AtomicConnectionState::default();
        assert_eq!(state.get(Ordering::Acquire), ConnectionState::Disconnected);

        state.set(ConnectionState::Connected, Ordering::Release);
        assert!(state.get(Ordering::Acquire).is_connected());

        let previous = state.swap(ConnectionState::ShutDown, Ordering::AcqRel);
        assert_eq!(previous, ConnectionState::Connected);
        assert!(state.get(Ordering::Acquire).is_shut_down());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::ShutDown.to_string(), "shut down");
        assert_eq!(ConnectionState::default().to_string(), "disconnected");
    }
}
