//! 重连与 Ping 调度
//!
//! 两个定时器都是调度器的字段，通过 [`Clock`] 读取时间。
//! 到期判断使用严格大于：`now > deadline`。

use crate::clock::Clock;
use crate::command::PingSubscription;
use crate::config::DriverConfig;
use crate::engine;
use crate::metrics::DriverMetrics;
use amplink_protocol::{DeviceCommand, PingStatus};
use amplink_serial::SerialTransport;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// 一次重连检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// 端口已打开，无需重连
    AlreadyOpen,
    /// 冷却中，未尝试
    CoolingDown,
    /// 打开成功
    Opened,
    /// 打开失败，冷却已重新计时
    Failed,
}

/// 一次 Ping 检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    /// 没有订阅
    Idle,
    /// 订阅存在，但本轮没有需要报告的内容
    Waiting,
    /// 端口未打开，已通知 `NotConnected`
    NotConnected,
    /// Ping 成功
    Ok,
    /// Ping 失败，端口已被强制关闭
    Failed,
}

/// 重连与 Ping 调度器
pub struct Scheduler<C: Clock> {
    clock: C,
    reconnect_cooldown: Duration,
    ping_interval: Duration,
    poll_timeout: Duration,
    /// 下一次允许打开的时间（None 表示立即）
    next_open: Option<Instant>,
    /// 下一次允许 Ping 的时间（None 表示立即）
    next_ping: Option<Instant>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C, config: &DriverConfig) -> Self {
        Self {
            clock,
            reconnect_cooldown: config.reconnect_cooldown(),
            ping_interval: config.ping_interval(),
            poll_timeout: config.poll_timeout(),
            next_open: None,
            next_ping: None,
        }
    }

    fn is_due(&self, deadline: Option<Instant>) -> bool {
        match deadline {
            None => true,
            Some(deadline) => self.clock.now() > deadline,
        }
    }

    /// 端口关闭且冷却结束时尝试打开
    pub fn poll_reconnect<T>(&mut self, transport: &mut T, metrics: &DriverMetrics) -> ReconnectOutcome
    where
        T: SerialTransport + ?Sized,
    {
        if transport.is_open() {
            return ReconnectOutcome::AlreadyOpen;
        }
        if !self.is_due(self.next_open) {
            return ReconnectOutcome::CoolingDown;
        }

        DriverMetrics::incr(&metrics.open_attempts);
        match transport.open() {
            Ok(()) => {
                self.next_open = None;
                ReconnectOutcome::Opened
            },
            Err(_) => {
                // 错误已由传输层记录；冷却从尝试结束时开始
                DriverMetrics::incr(&metrics.open_failures);
                self.next_open = Some(self.clock.now() + self.reconnect_cooldown);
                ReconnectOutcome::Failed
            },
        }
    }

    /// 有订阅时检查连接并按间隔 Ping
    ///
    /// 端口关闭时每次调用都会通知 `NotConnected`，不受 Ping 间隔限制。
    pub fn poll_ping<T>(
        &mut self,
        transport: &mut T,
        subscription: Option<&PingSubscription>,
        metrics: &DriverMetrics,
    ) -> PingOutcome
    where
        T: SerialTransport + ?Sized,
    {
        let Some(subscription) = subscription else {
            return PingOutcome::Idle;
        };

        let mut outcome = PingOutcome::Waiting;
        if !transport.is_open() {
            notify(subscription, PingStatus::NotConnected);
            outcome = PingOutcome::NotConnected;
        }

        if !self.is_due(self.next_ping) {
            return outcome;
        }

        if transport.is_open() {
            DriverMetrics::incr(&metrics.pings_sent);
            match engine::execute(transport, DeviceCommand::Ping, self.poll_timeout) {
                Ok(_) => {
                    DriverMetrics::incr(&metrics.transactions_ok);
                    notify(subscription, PingStatus::Ok);
                    outcome = PingOutcome::Ok;
                },
                Err(e) => {
                    record_failure(metrics, &e);
                    notify(subscription, PingStatus::CommunicationError);
                    warn!("ping failed, closing serial: {}", e);
                    transport.close();
                    DriverMetrics::incr(&metrics.forced_disconnects);
                    outcome = PingOutcome::Failed;
                },
            }
        }

        // 端口关闭时也重新计时
        self.next_ping = Some(self.clock.now() + self.ping_interval);
        outcome
    }
}

/// 失败事务计数
pub(crate) fn record_failure(metrics: &DriverMetrics, error: &crate::DriverError) {
    use crate::DriverError;

    DriverMetrics::incr(&metrics.transactions_failed);
    match error {
        DriverError::Protocol(_) => DriverMetrics::incr(&metrics.echo_mismatches),
        DriverError::RetriesExhausted { .. } => DriverMetrics::incr(&metrics.transaction_timeouts),
        _ => {},
    }
}

/// 调用回调，捕获回调中的 panic
fn notify(subscription: &PingSubscription, status: PingStatus) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| subscription.notify(status)));
    if result.is_err() {
        error!("ping callback panicked (status: {})", status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use amplink_serial::mock::{EchoBehavior, MockTransport};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn scheduler(clock: &ManualClock) -> Scheduler<ManualClock> {
        Scheduler::new(clock.clone(), &DriverConfig::default())
    }

    fn recording() -> (PingSubscription, Arc<Mutex<Vec<PingStatus>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sub = PingSubscription::new(move |status: PingStatus| seen_clone.lock().push(status));
        (sub, seen)
    }

    #[test]
    fn test_reconnect_immediately_then_cooldown() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let device = MockTransport::new();
        device.set_fail_open(true);
        let mut port = device.clone();

        // 第一次立即尝试
        assert_eq!(sched.poll_reconnect(&mut port, &metrics), ReconnectOutcome::Failed);
        assert_eq!(device.open_attempts(), 1);

        // 冷却期内不尝试
        for _ in 0..5 {
            clock.advance(Duration::from_millis(500));
            assert_eq!(
                sched.poll_reconnect(&mut port, &metrics),
                ReconnectOutcome::CoolingDown
            );
        }
        // 恰好 3 秒仍不到期（严格大于）
        clock.advance(Duration::from_millis(500));
        assert_eq!(
            sched.poll_reconnect(&mut port, &metrics),
            ReconnectOutcome::CoolingDown
        );
        assert_eq!(device.open_attempts(), 1);

        device.set_fail_open(false);
        clock.advance(Duration::from_millis(1));
        assert_eq!(sched.poll_reconnect(&mut port, &metrics), ReconnectOutcome::Opened);
        assert_eq!(device.open_attempts(), 2);
        assert_eq!(
            sched.poll_reconnect(&mut port, &metrics),
            ReconnectOutcome::AlreadyOpen
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.open_attempts, 2);
        assert_eq!(snapshot.open_failures, 1);
    }

    #[test]
    fn test_not_connected_every_call() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let (sub, seen) = recording();
        let mut port = MockTransport::new();

        for _ in 0..4 {
            assert_eq!(
                sched.poll_ping(&mut port, Some(&sub), &metrics),
                PingOutcome::NotConnected
            );
        }
        assert_eq!(seen.lock().as_slice(), &[PingStatus::NotConnected; 4]);
        assert_eq!(metrics.snapshot().pings_sent, 0);
    }

    #[test]
    fn test_ping_rate_limited() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let (sub, seen) = recording();
        let device = MockTransport::new();
        let mut port = device.clone();
        port.open().unwrap();

        assert_eq!(sched.poll_ping(&mut port, Some(&sub), &metrics), PingOutcome::Ok);
        assert_eq!(sched.poll_ping(&mut port, Some(&sub), &metrics), PingOutcome::Waiting);
        clock.advance(Duration::from_millis(1000));
        assert_eq!(sched.poll_ping(&mut port, Some(&sub), &metrics), PingOutcome::Waiting);
        clock.advance(Duration::from_millis(1));
        assert_eq!(sched.poll_ping(&mut port, Some(&sub), &metrics), PingOutcome::Ok);

        assert_eq!(seen.lock().as_slice(), &[PingStatus::Ok, PingStatus::Ok]);
        assert_eq!(device.written().len(), 2);
        assert_eq!(metrics.snapshot().pings_sent, 2);
    }

    #[test]
    fn test_failed_ping_closes_port() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let (sub, seen) = recording();
        let device = MockTransport::with_behavior(EchoBehavior::Corrupt);
        let mut port = device.clone();
        port.open().unwrap();

        assert_eq!(
            sched.poll_ping(&mut port, Some(&sub), &metrics),
            PingOutcome::Failed
        );
        assert!(!device.is_device_open());
        assert_eq!(seen.lock().as_slice(), &[PingStatus::CommunicationError]);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.forced_disconnects, 1);
        assert_eq!(snapshot.echo_mismatches, 1);
        assert_eq!(snapshot.transactions_failed, 1);
    }

    #[test]
    fn test_silent_device_uses_ping_budget() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let (sub, _seen) = recording();
        let device = MockTransport::with_behavior(EchoBehavior::Silent);
        let mut port = device.clone();
        port.open().unwrap();

        assert_eq!(
            sched.poll_ping(&mut port, Some(&sub), &metrics),
            PingOutcome::Failed
        );
        assert_eq!(device.read_attempts(), 3);
        assert_eq!(metrics.snapshot().transaction_timeouts, 1);
    }

    #[test]
    fn test_no_subscription_is_idle() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let device = MockTransport::new();
        let mut port = device.clone();
        port.open().unwrap();

        assert_eq!(sched.poll_ping(&mut port, None, &metrics), PingOutcome::Idle);
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let clock = ManualClock::new();
        let mut sched = scheduler(&clock);
        let metrics = DriverMetrics::new();
        let sub = PingSubscription::new(|_: PingStatus| panic!("callback failure"));
        let mut port = MockTransport::new();

        assert_eq!(
            sched.poll_ping(&mut port, Some(&sub), &metrics),
            PingOutcome::NotConnected
        );
    }
}
