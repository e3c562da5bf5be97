//! 回显协议引擎
//!
//! 发送一段字节，然后在有限的重试预算内等待设备逐字节回显。
//! 每次带超时的轮询（包括超时本身）消耗一次预算；任何不一致立即失败。

use crate::error::DriverError;
use amplink_protocol::{DeviceCommand, EchoMatcher, RetryBudget};
use amplink_serial::{SerialError, SerialTransport};
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// 单次读取的最大长度（大于任何命令负载）
const READ_CHUNK: usize = 32;

/// 执行一个设备命令
///
/// 成功时返回消耗的轮询次数。
pub fn execute<T>(
    transport: &mut T,
    command: DeviceCommand,
    poll_timeout: Duration,
) -> Result<u32, DriverError>
where
    T: SerialTransport + ?Sized,
{
    send_with_budget(
        transport,
        command.name(),
        command.payload(),
        RetryBudget::new(command.retry_budget()),
        poll_timeout,
    )
}

/// 发送 `bytes` 并等待完整回显
///
/// # 错误
/// - `DriverError::NotConnected`: 端口未打开（不做任何 IO）
/// - `DriverError::Protocol`: 回显不一致
/// - `DriverError::RetriesExhausted`: 预算耗尽时仍有字节未收到
/// - `DriverError::Serial`: 其他读写错误
pub fn send_with_budget<T>(
    transport: &mut T,
    name: &'static str,
    bytes: &[u8],
    mut budget: RetryBudget,
    poll_timeout: Duration,
) -> Result<u32, DriverError>
where
    T: SerialTransport + ?Sized,
{
    if !transport.is_open() {
        return Err(DriverError::NotConnected);
    }

    if let Err(e) = transport.write_all(bytes) {
        error!("{}: write failed: {}", name, e);
        return Err(e.into());
    }
    transport.drain()?;

    let mut matcher = EchoMatcher::new(bytes);
    let mut buf = [0u8; READ_CHUNK];

    while !matcher.is_complete() {
        if !budget.try_consume() {
            error!(
                "{}: no more retries, remained to read: {}",
                name,
                matcher.remaining()
            );
            return Err(DriverError::RetriesExhausted {
                command: name,
                remaining: matcher.remaining(),
            });
        }

        let want = matcher.remaining().min(READ_CHUNK);
        match transport.read_timeout(&mut buf[..want], poll_timeout) {
            Ok(n) => {
                trace!("{}: read {} byte(s)", name, n);
                if let Err(e) = matcher.feed(&buf[..n]) {
                    error!("{}: {}", name, e);
                    return Err(e.into());
                }
            },
            Err(SerialError::Timeout) => {
                warn!("{}: timeout, retrying", name);
            },
            Err(e) => {
                error!("{}: read failed: {}", name, e);
                return Err(e.into());
            },
        }
    }

    debug!("{}: ok ({} attempt(s))", name, budget.used());
    Ok(budget.used())
}
