//! 协议常量定义
//!
//! 线路参数、命令字节与参考时间节奏。

use std::time::Duration;

/// 默认设备路径（USB 转串口适配器）
pub const DEFAULT_DEVICE_PATH: &str = "/dev/tty.usbserial-AH015UG3";

/// 默认波特率（8-N-1）
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Ping 命令字节
pub const PING_BYTE: u8 = b'A';

/// 音量增加命令字节
pub const VOLUME_UP_BYTE: u8 = b'U';

/// 音量减少命令字节
pub const VOLUME_DOWN_BYTE: u8 = b'D';

/// 粗调命令的重复次数
pub const COARSE_REPEAT: usize = 6;

/// Ping 的重试预算
pub const PING_RETRY_BUDGET: u32 = 3;

/// 音量命令的重试预算
///
/// 机械音量调节的响应窗口比存活检测长得多。
pub const VOLUME_RETRY_BUDGET: u32 = 15;

/// 单次读取轮询超时
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// 打开端口后的稳定等待时间
///
/// 设备在线路打开后需要这段静默期，之前发出的命令会读不到回显。
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// 重连失败后的冷却时间
pub const RECONNECT_COOLDOWN: Duration = Duration::from_secs(3);

/// 两次 Ping 之间的最小间隔
pub const PING_INTERVAL: Duration = Duration::from_secs(1);

/// 工作线程等待命令的节拍
pub const WORKER_TICK: Duration = Duration::from_millis(500);
