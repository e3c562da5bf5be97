//! 设备命令定义
//!
//! 每个命令对应一段固定的字节负载和一个重试预算。

use crate::constants::*;

const PING_PAYLOAD: [u8; 1] = [PING_BYTE];
const VOLUME_UP_PAYLOAD: [u8; COARSE_REPEAT] = [VOLUME_UP_BYTE; COARSE_REPEAT];
const VOLUME_UP_PRECISE_PAYLOAD: [u8; 1] = [VOLUME_UP_BYTE];
const VOLUME_DOWN_PAYLOAD: [u8; COARSE_REPEAT] = [VOLUME_DOWN_BYTE; COARSE_REPEAT];
const VOLUME_DOWN_PRECISE_PAYLOAD: [u8; 1] = [VOLUME_DOWN_BYTE];

/// 音量调节方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VolumeDirection {
    Up,
    Down,
}

/// 设备命令
///
/// # 示例
///
/// ```rust
/// use amplink_protocol::{DeviceCommand, VolumeDirection};
///
/// let cmd = DeviceCommand::volume(VolumeDirection::Up, false);
/// assert_eq!(cmd.payload(), b"UUUUUU");
/// assert_eq!(cmd.retry_budget(), 15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceCommand {
    /// 存活检测
    Ping,
    /// 音量调节
    ///
    /// `precise` 为 true 时只发送单个字节，否则发送 6 个重复字节。
    Volume {
        direction: VolumeDirection,
        precise: bool,
    },
}

impl DeviceCommand {
    /// 创建音量命令
    pub const fn volume(direction: VolumeDirection, precise: bool) -> Self {
        Self::Volume { direction, precise }
    }

    /// 命令的字节负载（设备应原样回显）
    pub const fn payload(&self) -> &'static [u8] {
        match self {
            Self::Ping => &PING_PAYLOAD,
            Self::Volume {
                direction: VolumeDirection::Up,
                precise: false,
            } => &VOLUME_UP_PAYLOAD,
            Self::Volume {
                direction: VolumeDirection::Up,
                precise: true,
            } => &VOLUME_UP_PRECISE_PAYLOAD,
            Self::Volume {
                direction: VolumeDirection::Down,
                precise: false,
            } => &VOLUME_DOWN_PAYLOAD,
            Self::Volume {
                direction: VolumeDirection::Down,
                precise: true,
            } => &VOLUME_DOWN_PRECISE_PAYLOAD,
        }
    }

    /// 命令的重试预算（轮询次数）
    pub const fn retry_budget(&self) -> u32 {
        match self {
            Self::Ping => PING_RETRY_BUDGET,
            Self::Volume { .. } => VOLUME_RETRY_BUDGET,
        }
    }

    /// 用于日志的命令名
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Volume {
                direction: VolumeDirection::Up,
                precise: false,
            } => "vol_up",
            Self::Volume {
                direction: VolumeDirection::Up,
                precise: true,
            } => "vol_up_prec",
            Self::Volume {
                direction: VolumeDirection::Down,
                precise: false,
            } => "vol_down",
            Self::Volume {
                direction: VolumeDirection::Down,
                precise: true,
            } => "vol_down_prec",
        }
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_payload() {
        assert_eq!(DeviceCommand::Ping.payload(), b"A");
        assert_eq!(DeviceCommand::Ping.retry_budget(), 3);
    }

    #[test]
    fn test_volume_payloads() {
        let up = DeviceCommand::volume(VolumeDirection::Up, false);
        let down = DeviceCommand::volume(VolumeDirection::Down, false);
        assert_eq!(up.payload(), b"UUUUUU");
        assert_eq!(down.payload(), b"DDDDDD");

        let up_prec = DeviceCommand::volume(VolumeDirection::Up, true);
        let down_prec = DeviceCommand::volume(VolumeDirection::Down, true);
        assert_eq!(up_prec.payload(), b"U");
        assert_eq!(down_prec.payload(), b"D");
    }

    #[test]
    fn test_volume_budget_covers_precise() {
        for direction in [VolumeDirection::Up, VolumeDirection::Down] {
            for precise in [false, true] {
                let cmd = DeviceCommand::volume(direction, precise);
                assert_eq!(cmd.retry_budget(), VOLUME_RETRY_BUDGET, "{}", cmd);
            }
        }
    }

    #[test]
    fn test_command_names() {
        assert_eq!(DeviceCommand::Ping.to_string(), "ping");
        assert_eq!(
            DeviceCommand::volume(VolumeDirection::Down, true).to_string(),
            "vol_down_prec"
        );
    }
}
