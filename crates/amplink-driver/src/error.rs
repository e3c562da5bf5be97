//! 驱动层错误类型定义

use amplink_protocol::ProtocolError;
use amplink_serial::SerialError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口错误
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),

    /// 协议错误（回显不一致）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 端口未打开，命令被丢弃
    #[error("Not connected")]
    NotConnected,

    /// 重试预算耗尽时仍有字节未收到
    #[error("{command}: no more retries, remained to read: {remaining}")]
    RetriesExhausted {
        command: &'static str,
        remaining: usize,
    },

    /// 命令通道已关闭（工作线程退出）
    #[error("Command channel closed")]
    ChannelClosed,

    /// 命令通道已满
    #[error("Command channel full")]
    ChannelFull,

    /// 工作线程错误（创建失败或 panic）
    #[error("IO thread error: {0}")]
    IoThread(String),
}

impl DriverError {
    /// 是否为超时类错误（预算耗尽）
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
