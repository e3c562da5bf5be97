//! 工作线程主循环
//!
//! 每轮迭代：重连 → Ping → 最多等待一个节拍取命令 → 分发。
//! 工作线程独占端口、Ping 订阅和两个定时器；调用线程只能通过命令通道
//! 影响它，并通过 [`WorkerContext`] 读取连接状态与指标。

use crate::channel::CommandReceiver;
use crate::clock::Clock;
use crate::command::{DriverCommand, PingSubscription};
use crate::config::DriverConfig;
use crate::engine;
use crate::error::DriverError;
use crate::metrics::DriverMetrics;
use crate::scheduler::{PingOutcome, ReconnectOutcome, Scheduler, record_failure};
use crate::state::{AtomicConnectionState, ConnectionState};
use amplink_serial::SerialTransport;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, trace};

/// 工作线程与调用线程共享的只读上下文
#[derive(Debug, Default)]
pub struct WorkerContext {
    /// 连接状态（工作线程写，其他线程读）
    pub state: AtomicConnectionState,
    /// 运行指标
    pub metrics: DriverMetrics,
}

impl WorkerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.get(Ordering::Acquire)
    }

    fn publish(&self, state: ConnectionState) {
        let previous = self.state.swap(state, Ordering::AcqRel);
        if previous != state {
            debug!("thread: {} -> {}", previous, state);
        }
    }
}

/// 工作线程状态机
pub struct Worker<T, C>
where
    T: SerialTransport,
    C: Clock,
{
    transport: T,
    scheduler: Scheduler<C>,
    subscription: Option<PingSubscription>,
    ctx: Arc<WorkerContext>,
    tick: Duration,
    poll_timeout: Duration,
}

impl<T, C> Worker<T, C>
where
    T: SerialTransport,
    C: Clock,
{
    pub fn new(transport: T, clock: C, ctx: Arc<WorkerContext>, config: &DriverConfig) -> Self {
        Self {
            transport,
            scheduler: Scheduler::new(clock, config),
            subscription: None,
            ctx,
            tick: config.tick(),
            poll_timeout: config.poll_timeout(),
        }
    }

    /// 运行直到收到 `Quit` 或所有发送端释放
    pub fn run(mut self, rx: CommandReceiver) {
        debug!("thread: started");
        while self.run_once(&rx).is_continue() {}
        self.finish();
    }

    /// 执行一轮迭代
    ///
    /// 返回 `ControlFlow::Break` 表示应当退出。
    pub fn run_once(&mut self, rx: &CommandReceiver) -> ControlFlow<()> {
        self.reconnect();
        self.ping();

        match rx.dequeue(self.tick) {
            Ok(Some(command)) => self.dispatch(command),
            Ok(None) => ControlFlow::Continue(()),
            Err(DriverError::ChannelClosed) => {
                debug!("thread: command channel closed");
                ControlFlow::Break(())
            },
            Err(e) => {
                error!("thread: {}", e);
                ControlFlow::Break(())
            },
        }
    }

    fn reconnect(&mut self) {
        match self
            .scheduler
            .poll_reconnect(&mut self.transport, &self.ctx.metrics)
        {
            ReconnectOutcome::Opened => self.ctx.publish(ConnectionState::Connected),
            ReconnectOutcome::Failed => self.ctx.publish(ConnectionState::Disconnected),
            ReconnectOutcome::AlreadyOpen | ReconnectOutcome::CoolingDown => {},
        }
    }

    fn ping(&mut self) {
        let outcome = self.scheduler.poll_ping(
            &mut self.transport,
            self.subscription.as_ref(),
            &self.ctx.metrics,
        );
        if outcome == PingOutcome::Failed {
            self.ctx.publish(ConnectionState::Disconnected);
        }
    }

    fn dispatch(&mut self, command: DriverCommand) -> ControlFlow<()> {
        DriverMetrics::incr(&self.ctx.metrics.commands_processed);
        trace!("thread: received {} command", command.name());

        if let Some(device_command) = command.device_command() {
            self.execute(device_command);
            return ControlFlow::Continue(());
        }

        match command {
            DriverCommand::Quit => {
                debug!("thread: received quit command");
                return ControlFlow::Break(());
            },
            DriverCommand::StartPing(subscription) => {
                self.subscription = Some(subscription);
                debug!("thread: received start ping command");
            },
            DriverCommand::StopPing => {
                self.subscription = None;
                debug!("thread: received stop ping command");
            },
            // 已由协议引擎执行
            DriverCommand::Volume { .. } => {},
        }
        ControlFlow::Continue(())
    }

    fn execute(&mut self, command: amplink_protocol::DeviceCommand) {
        let metrics = &self.ctx.metrics;
        match engine::execute(&mut self.transport, command, self.poll_timeout) {
            Ok(_) => DriverMetrics::incr(&metrics.transactions_ok),
            Err(DriverError::NotConnected) => {
                error!("{}: no connection", command.name());
                DriverMetrics::incr(&metrics.dropped_commands);
            },
            // 引擎已记录细节
            Err(e) => record_failure(metrics, &e),
        }
    }

    fn finish(mut self) {
        self.subscription = None;
        self.transport.close();
        self.ctx.publish(ConnectionState::ShutDown);
        debug!("thread: exit");
    }
}

/// 工作线程入口
pub fn worker_loop<T, C>(
    transport: T,
    clock: C,
    rx: CommandReceiver,
    ctx: Arc<WorkerContext>,
    config: DriverConfig,
) where
    T: SerialTransport,
    C: Clock,
{
    Worker::new(transport, clock, ctx, &config).run(rx);
}
