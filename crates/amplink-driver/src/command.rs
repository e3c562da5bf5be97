//! 命令帧与 Ping 回调定义
//!
//! 调用线程通过命令通道发送 [`DriverCommand`]，工作线程逐个消费。
//! Ping 回调及其上下文作为一个整体随 `StartPing` 帧传递，
//! 消费者永远不会看到"只有回调没有上下文"的半帧。

use amplink_protocol::{DeviceCommand, PingStatus, VolumeDirection};
use std::fmt;
use std::sync::Arc;

/// Ping 回调 Trait
///
/// 在工作线程中调用，调用期间工作线程不处理其他命令，实现应尽快返回。
///
/// 闭包自动实现此 trait：
///
/// ```rust
/// use amplink_driver::PingCallback;
/// use amplink_protocol::PingStatus;
///
/// fn assert_callback(_: impl PingCallback) {}
/// assert_callback(|status: PingStatus| println!("ping: {}", status));
/// ```
pub trait PingCallback: Send + Sync {
    fn on_ping(&self, status: PingStatus);
}

impl<F> PingCallback for F
where
    F: Fn(PingStatus) + Send + Sync,
{
    fn on_ping(&self, status: PingStatus) {
        self(status)
    }
}

/// Ping 订阅
///
/// 同一时间最多一个有效订阅，新订阅替换旧订阅。
#[derive(Clone)]
pub struct PingSubscription {
    callback: Arc<dyn PingCallback>,
}

impl PingSubscription {
    pub fn new(callback: impl PingCallback + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn from_arc(callback: Arc<dyn PingCallback>) -> Self {
        Self { callback }
    }

    /// 回调 + 不透明上下文
    ///
    /// # 示例
    ///
    /// ```rust
    /// use amplink_driver::PingSubscription;
    /// use amplink_protocol::PingStatus;
    /// use std::sync::atomic::{AtomicI32, Ordering};
    ///
    /// fn record(last: &AtomicI32, status: PingStatus) {
    ///     last.store(status.code(), Ordering::Relaxed);
    /// }
    ///
    /// let sub = PingSubscription::with_context(AtomicI32::new(99), record);
    /// sub.notify(PingStatus::Ok);
    /// ```
    pub fn with_context<C>(context: C, callback: fn(&C, PingStatus)) -> Self
    where
        C: Send + Sync + 'static,
    {
        Self::new(move |status: PingStatus| callback(&context, status))
    }

    /// 调用回调
    #[inline]
    pub fn notify(&self, status: PingStatus) {
        self.callback.on_ping(status);
    }
}

impl fmt::Debug for PingSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PingSubscription").finish_non_exhaustive()
    }
}

/// 命令帧
///
/// 每个帧只会被工作线程消费一次。
#[derive(Debug, Clone)]
pub enum DriverCommand {
    /// 关闭端口并退出工作线程
    Quit,
    /// 安装 Ping 订阅（替换旧订阅）
    StartPing(PingSubscription),
    /// 清除 Ping 订阅
    StopPing,
    /// 音量调节
    Volume {
        direction: VolumeDirection,
        precise: bool,
    },
}

impl DriverCommand {
    pub fn volume_up(precise: bool) -> Self {
        Self::Volume {
            direction: VolumeDirection::Up,
            precise,
        }
    }

    pub fn volume_down(precise: bool) -> Self {
        Self::Volume {
            direction: VolumeDirection::Down,
            precise,
        }
    }

    /// 需要经过协议引擎发送的设备命令
    pub fn device_command(&self) -> Option<DeviceCommand> {
        match self {
            Self::Volume { direction, precise } => {
                Some(DeviceCommand::volume(*direction, *precise))
            },
            _ => None,
        }
    }

    /// 用于日志的命令名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::StartPing(_) => "start_ping",
            Self::StopPing => "stop_ping",
            Self::Volume { .. } => match self.device_command() {
                Some(cmd) => cmd.name(),
                None => "volume",
            },
        }
    }
}
