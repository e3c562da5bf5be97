//! Ping 状态码

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Ping 回调收到的连接状态
///
/// 对外的整数状态码：`-1` 未连接，`0` 正常，`1` 通信错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum PingStatus {
    /// 串口未打开
    NotConnected = -1,
    /// 设备正确回显了 Ping
    Ok = 0,
    /// Ping 失败（超时或回显不一致），端口将被关闭
    CommunicationError = 1,
}

impl PingStatus {
    /// 从整数状态码转换
    pub fn from_code(code: i32) -> Result<Self, ProtocolError> {
        Self::try_from(code).map_err(|_| ProtocolError::InvalidStatusCode(code))
    }

    /// 转换为整数状态码
    pub fn code(self) -> i32 {
        self.into()
    }

    /// 是否表示链路健康
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl std::fmt::Display for PingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotConnected => "not connected",
            Self::Ok => "ok",
            Self::CommunicationError => "communication error",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PingStatus::NotConnected.code(), -1);
        assert_eq!(PingStatus::Ok.code(), 0);
        assert_eq!(PingStatus::CommunicationError.code(), 1);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(PingStatus::from_code(-1), Ok(PingStatus::NotConnected));
        assert_eq!(PingStatus::from_code(1), Ok(PingStatus::CommunicationError));
        assert_eq!(
            PingStatus::from_code(2),
            Err(ProtocolError::InvalidStatusCode(2))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(PingStatus::Ok.to_string(), "ok");
        assert_eq!(PingStatus::NotConnected.to_string(), "not connected");
        assert!(PingStatus::Ok.is_ok());
        assert!(!PingStatus::CommunicationError.is_ok());
    }
}
