//! # Amplink Protocol
//!
//! 功放主机串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 线路参数与时间常量
//! - `command`: 设备命令及其负载、重试预算
//! - `echo`: 回显匹配与重试预算
//! - `status`: Ping 状态码
//!
//! ## 回显协议
//!
//! 设备收到命令后会原样逐字节回传。主机只有在完整回显与发送内容一致时，
//! 才认为命令执行成功。

pub mod command;
pub mod constants;
pub mod echo;
pub mod status;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use echo::*;
pub use status::*;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 回显内容与发送内容不一致（协议失步）
    #[error("Echo mismatch at byte {offset}: expected {expected:#04x}, got {actual:#04x}")]
    EchoMismatch {
        /// 出错字节在命令中的偏移
        offset: usize,
        /// 期望的字节
        expected: u8,
        /// 实际收到的字节
        actual: u8,
    },

    /// 回显长度超出命令剩余长度
    #[error("Echo overflow: {received} bytes received, {remaining} expected")]
    EchoOverflow { received: usize, remaining: usize },

    /// 无效的 Ping 状态码
    #[error("Invalid ping status code: {0}")]
    InvalidStatusCode(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::EchoMismatch {
            offset: 2,
            expected: b'U',
            actual: b'?',
        };
        assert_eq!(
            err.to_string(),
            "Echo mismatch at byte 2: expected 0x55, got 0x3f"
        );

        let err = ProtocolError::InvalidStatusCode(7);
        assert!(err.to_string().contains('7'));
    }
}
