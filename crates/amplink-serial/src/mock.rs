//! 模拟设备（仅用于测试）
//!
//! `MockTransport` 可克隆，所有克隆共享同一个模拟设备。测试把一个克隆交给
//! 驱动，用另一个克隆观察写入内容、打开/关闭次数和读取尝试次数。
//!
//! 读取不会真正等待：每次 `read_timeout` 立即返回，超时按一次尝试计数。

use crate::{SerialError, SerialTransport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// 模拟设备的回显行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoBehavior {
    /// 原样回显全部字节
    #[default]
    Echo,
    /// 原样回显，但每次读取只返回一个字节
    Trickle,
    /// 先让接下来的若干次读取超时，再回显
    Delayed(u32),
    /// 回显被篡改的字节
    Corrupt,
    /// 从不回显
    Silent,
}

#[derive(Debug, Default)]
struct MockDevice {
    open: bool,
    fail_open: bool,
    fail_reads: bool,
    fail_writes: bool,
    behavior: EchoBehavior,
    pending: VecDeque<u8>,
    timeouts_before_echo: u32,
    written: Vec<Vec<u8>>,
    open_attempts: u32,
    opens: u32,
    closes: u32,
    read_attempts: u32,
}

/// 可编程的模拟串口
///
/// # Example
///
/// ```
/// use amplink_serial::SerialTransport;
/// use amplink_serial::mock::{EchoBehavior, MockTransport};
/// use std::time::Duration;
///
/// let device = MockTransport::with_behavior(EchoBehavior::Echo);
/// let mut port = device.clone();
/// port.open().unwrap();
/// port.write_all(b"A").unwrap();
///
/// let mut buf = [0u8; 1];
/// assert_eq!(port.read_timeout(&mut buf, Duration::from_millis(500)).unwrap(), 1);
/// assert_eq!(device.written(), vec![b"A".to_vec()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    device: Arc<Mutex<MockDevice>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: EchoBehavior) -> Self {
        let mock = Self::new();
        mock.set_behavior(behavior);
        mock
    }

    pub fn set_behavior(&self, behavior: EchoBehavior) {
        self.device.lock().behavior = behavior;
    }

    /// 让后续的 `open` 失败（模拟设备被拔出）
    pub fn set_fail_open(&self, fail: bool) {
        self.device.lock().fail_open = fail;
    }

    /// 让后续读取返回非超时的 IO 错误（模拟线路故障）
    pub fn set_fail_reads(&self, fail: bool) {
        self.device.lock().fail_reads = fail;
    }

    /// 让后续写入返回 IO 错误
    pub fn set_fail_writes(&self, fail: bool) {
        self.device.lock().fail_writes = fail;
    }

    /// 在接收缓冲区注入杂散字节
    pub fn inject(&self, bytes: &[u8]) {
        self.device.lock().pending.extend(bytes);
    }

    /// 按顺序返回所有成功写入的字节序列
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.device.lock().written.clone()
    }

    pub fn open_attempts(&self) -> u32 {
        self.device.lock().open_attempts
    }

    pub fn open_count(&self) -> u32 {
        self.device.lock().opens
    }

    pub fn close_count(&self) -> u32 {
        self.device.lock().closes
    }

    pub fn read_attempts(&self) -> u32 {
        self.device.lock().read_attempts
    }

    pub fn reset_read_attempts(&self) {
        self.device.lock().read_attempts = 0;
    }

    /// 端口当前是否打开（从观察者一侧）
    pub fn is_device_open(&self) -> bool {
        self.device.lock().open
    }

    /// 每次成功打开都已被关闭，原始线路配置已恢复
    pub fn line_restored(&self) -> bool {
        let device = self.device.lock();
        !device.open && device.opens == device.closes
    }
}

impl SerialTransport for MockTransport {
    fn open(&mut self) -> Result<(), SerialError> {
        let mut device = self.device.lock();
        device.open_attempts += 1;
        if device.fail_open {
            return Err(SerialError::setup(
                "open serial",
                io::Error::from(io::ErrorKind::NotFound),
            ));
        }
        if !device.open {
            device.open = true;
            device.opens += 1;
            device.pending.clear();
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut device = self.device.lock();
        if device.open {
            device.open = false;
            device.closes += 1;
            device.pending.clear();
        }
    }

    fn is_open(&self) -> bool {
        self.device.lock().open
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut device = self.device.lock();
        if !device.open {
            return Err(SerialError::NotOpen);
        }
        if device.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }
        device.written.push(bytes.to_vec());

        let behavior = device.behavior;
        match behavior {
            EchoBehavior::Echo | EchoBehavior::Trickle => device.pending.extend(bytes),
            EchoBehavior::Delayed(timeouts) => {
                device.pending.extend(bytes);
                device.timeouts_before_echo = timeouts;
            },
            EchoBehavior::Corrupt => device.pending.extend(bytes.iter().map(|b| b ^ 0x20)),
            EchoBehavior::Silent => {},
        }
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, SerialError> {
        let mut device = self.device.lock();
        if !device.open {
            return Err(SerialError::NotOpen);
        }
        device.read_attempts += 1;
        if device.fail_reads {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }

        if device.timeouts_before_echo > 0 {
            device.timeouts_before_echo -= 1;
            return Err(SerialError::Timeout);
        }
        if device.pending.is_empty() || buf.is_empty() {
            return Err(SerialError::Timeout);
        }

        let limit = match device.behavior {
            EchoBehavior::Trickle => 1,
            _ => buf.len(),
        };
        let count = limit.min(buf.len()).min(device.pending.len());
        for (slot, byte) in buf.iter_mut().zip(device.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[test]
    fn test_open_close_counts() {
        let device = MockTransport::new();
        let mut port = device.clone();

        port.open().unwrap();
        port.open().unwrap();
        assert_eq!(device.open_attempts(), 2);
        assert_eq!(device.open_count(), 1);

        port.close();
        port.close();
        assert_eq!(device.close_count(), 1);
        assert!(device.line_restored());
    }

    #[test]
    fn test_fail_open() {
        let device = MockTransport::new();
        device.set_fail_open(true);
        let mut port = device.clone();
        assert!(matches!(port.open(), Err(SerialError::Setup { .. })));
        assert!(!port.is_open());
        assert_eq!(device.open_attempts(), 1);
    }

    #[test]
    fn test_trickle_returns_one_byte() {
        let mut port = MockTransport::with_behavior(EchoBehavior::Trickle);
        port.open().unwrap();
        port.write_all(b"UUU").unwrap();

        let mut buf = [0u8; 8];
        for _ in 0..3 {
            assert_eq!(port.read_timeout(&mut buf, TIMEOUT).unwrap(), 1);
            assert_eq!(buf[0], b'U');
        }
        assert!(matches!(
            port.read_timeout(&mut buf, TIMEOUT),
            Err(SerialError::Timeout)
        ));
    }

    #[test]
    fn test_delayed_echo() {
        let device = MockTransport::with_behavior(EchoBehavior::Delayed(2));
        let mut port = device.clone();
        port.open().unwrap();
        port.write_all(b"A").unwrap();

        let mut buf = [0u8; 1];
        assert!(port.read_timeout(&mut buf, TIMEOUT).is_err());
        assert!(port.read_timeout(&mut buf, TIMEOUT).is_err());
        assert_eq!(port.read_timeout(&mut buf, TIMEOUT).unwrap(), 1);
        assert_eq!(device.read_attempts(), 3);
    }

    #[test]
    fn test_corrupt_echo_differs() {
        let mut port = MockTransport::with_behavior(EchoBehavior::Corrupt);
        port.open().unwrap();
        port.write_all(b"A").unwrap();
        let mut buf = [0u8; 1];
        port.read_timeout(&mut buf, TIMEOUT).unwrap();
        assert_ne!(buf[0], b'A');
    }

    #[test]
    fn test_injected_io_errors() {
        let device = MockTransport::new();
        let mut port = device.clone();
        port.open().unwrap();

        device.set_fail_writes(true);
        assert!(matches!(port.write_all(b"A"), Err(SerialError::Io(_))));
        assert!(device.written().is_empty());

        device.set_fail_writes(false);
        device.set_fail_reads(true);
        port.write_all(b"A").unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(
            port.read_timeout(&mut buf, TIMEOUT),
            Err(SerialError::Io(_))
        ));
        assert_eq!(device.read_attempts(), 1);
    }

    #[test]
    fn test_write_requires_open() {
        let mut port = MockTransport::new();
        assert!(matches!(port.write_all(b"A"), Err(SerialError::NotOpen)));
    }

    #[test]
    fn test_close_discards_pending() {
        let mut port = MockTransport::new();
        port.open().unwrap();
        port.write_all(b"A").unwrap();
        port.close();
        port.open().unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(
            port.read_timeout(&mut buf, TIMEOUT),
            Err(SerialError::Timeout)
        ));
    }
}
