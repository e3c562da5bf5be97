//! 对外驱动句柄
//!
//! `SerialDriver` 封装命令通道和工作线程。所有提交方法都是非阻塞的，
//! 只报告命令是否进入队列；命令的执行结果通过日志、指标和 Ping 回调观察。

use crate::channel::{CommandSender, command_channel};
use crate::clock::{Clock, MonotonicClock};
use crate::command::{DriverCommand, PingCallback, PingSubscription};
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::metrics::MetricsSnapshot;
use crate::state::ConnectionState;
use crate::worker::{WorkerContext, worker_loop};
use amplink_serial::SerialTransport;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// 工作线程名
pub const WORKER_THREAD_NAME: &str = "amplink-serial";

/// 串口驱动（对外 API）
///
/// # Example
///
/// ```no_run
/// use amplink_driver::{PingStatus, SerialDriver};
///
/// let driver = amplink_driver::initialize()?;
/// driver.start_ping(|status: PingStatus| println!("ping: {}", status))?;
/// driver.volume_up(false)?;
/// driver.shutdown();
/// # Ok::<(), amplink_driver::DriverError>(())
/// ```
pub struct SerialDriver {
    /// 命令发送端；`shutdown` 时取出，之后所有提交都返回 `ChannelClosed`
    cmd_tx: Option<CommandSender>,
    ctx: Arc<WorkerContext>,
    worker: Option<JoinHandle<()>>,
}

impl SerialDriver {
    /// 启动工作线程
    ///
    /// 端口在工作线程的第一轮迭代中打开，打开失败不会导致这里出错。
    ///
    /// # 错误
    /// - `DriverError::IoThread`: 线程创建失败
    pub fn initialize<T>(transport: T, config: DriverConfig) -> Result<Self, DriverError>
    where
        T: SerialTransport + Send + 'static,
    {
        Self::initialize_with_clock(transport, MonotonicClock, config)
    }

    /// 使用自定义时钟启动工作线程
    pub fn initialize_with_clock<T, C>(
        transport: T,
        clock: C,
        config: DriverConfig,
    ) -> Result<Self, DriverError>
    where
        T: SerialTransport + Send + 'static,
        C: Clock + 'static,
    {
        let (cmd_tx, cmd_rx) = command_channel(config.channel_capacity);
        let ctx = Arc::new(WorkerContext::new());
        let ctx_clone = ctx.clone();

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker_loop(transport, clock, cmd_rx, ctx_clone, config))
            .map_err(|e| {
                error!("can not create serial thread: {}", e);
                DriverError::IoThread(e.to_string())
            })?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            ctx,
            worker: Some(worker),
        })
    }

    fn submit(&self, command: DriverCommand) -> Result<(), DriverError> {
        let tx = self.cmd_tx.as_ref().ok_or(DriverError::ChannelClosed)?;
        let name = command.name();
        tx.enqueue(command).inspect_err(|e| {
            error!("{}: can not enqueue command: {}", name, e);
        })
    }

    /// 安装 Ping 回调（替换旧回调）
    ///
    /// 回调在工作线程中调用：端口关闭时每轮迭代报告 `NotConnected`，
    /// 端口打开时每隔一个 Ping 间隔报告 `Ok` 或 `CommunicationError`。
    pub fn start_ping(&self, callback: impl PingCallback + 'static) -> Result<(), DriverError> {
        self.start_ping_subscription(PingSubscription::new(callback))
    }

    /// 安装已构造好的 Ping 订阅（例如 [`PingSubscription::with_context`]）
    pub fn start_ping_subscription(
        &self,
        subscription: PingSubscription,
    ) -> Result<(), DriverError> {
        self.submit(DriverCommand::StartPing(subscription))
    }

    /// 清除 Ping 回调（没有回调时为空操作）
    pub fn stop_ping(&self) -> Result<(), DriverError> {
        self.submit(DriverCommand::StopPing)
    }

    /// 音量增加
    ///
    /// `precise` 为 true 时发送单步命令，否则发送粗调命令。
    pub fn volume_up(&self, precise: bool) -> Result<(), DriverError> {
        self.submit(DriverCommand::volume_up(precise))
    }

    /// 音量减少
    pub fn volume_down(&self, precise: bool) -> Result<(), DriverError> {
        self.submit(DriverCommand::volume_down(precise))
    }

    /// 当前连接状态
    pub fn connection_state(&self) -> ConnectionState {
        self.ctx.connection_state()
    }

    /// 运行指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 重置运行指标
    pub fn reset_metrics(&self) {
        self.ctx.metrics.reset();
    }

    /// 关闭驱动
    ///
    /// 在所有已入队命令之后发送 `Quit`，等待工作线程退出。
    /// 工作线程退出前会关闭端口并恢复原始线路配置。
    ///
    /// 返回工作线程退出时的最终指标。
    pub fn shutdown(mut self) -> MetricsSnapshot {
        self.stop();
        self.ctx.metrics.snapshot()
    }

    fn stop(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            // 阻塞发送：队列满时等待工作线程腾出空间
            if tx.enqueue_blocking(DriverCommand::Quit).is_err() {
                debug!("serial thread already gone");
            }
        }

        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            error!("serial thread panicked");
        }
    }
}

impl Drop for SerialDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
