//! 驱动运行指标
//!
//! 原子计数器，工作线程更新，任何线程都可以无锁读取快照。

use std::sync::atomic::{AtomicU64, Ordering};

/// 驱动实时指标
///
/// # 使用示例
///
/// ```rust
/// use amplink_driver::DriverMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = DriverMetrics::new();
/// metrics.transactions_ok.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.transactions_ok, 1);
/// ```
#[derive(Debug, Default)]
pub struct DriverMetrics {
    /// 工作线程消费的命令帧总数
    pub commands_processed: AtomicU64,

    /// 回显完整匹配的事务数
    pub transactions_ok: AtomicU64,

    /// 失败的事务数（包括下面细分的两类）
    pub transactions_failed: AtomicU64,

    /// 回显不一致次数
    pub echo_mismatches: AtomicU64,

    /// 重试预算耗尽次数
    pub transaction_timeouts: AtomicU64,

    /// 打开端口尝试次数
    pub open_attempts: AtomicU64,

    /// 打开端口失败次数
    pub open_failures: AtomicU64,

    /// 实际发送到设备的 Ping 数
    pub pings_sent: AtomicU64,

    /// Ping 失败导致的强制断开次数
    pub forced_disconnects: AtomicU64,

    /// 端口未打开时被丢弃的命令数
    pub dropped_commands: AtomicU64,
}

impl DriverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    ///
    /// 各计数器分别读取，彼此之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            transactions_ok: self.transactions_ok.load(Ordering::Relaxed),
            transactions_failed: self.transactions_failed.load(Ordering::Relaxed),
            echo_mismatches: self.echo_mismatches.load(Ordering::Relaxed),
            transaction_timeouts: self.transaction_timeouts.load(Ordering::Relaxed),
            open_attempts: self.open_attempts.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
            pings_sent: self.pings_sent.load(Ordering::Relaxed),
            forced_disconnects: self.forced_disconnects.load(Ordering::Relaxed),
            dropped_commands: self.dropped_commands.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.commands_processed.store(0, Ordering::Relaxed);
        self.transactions_ok.store(0, Ordering::Relaxed);
        self.transactions_failed.store(0, Ordering::Relaxed);
        self.echo_mismatches.store(0, Ordering::Relaxed);
        self.transaction_timeouts.store(0, Ordering::Relaxed);
        self.open_attempts.store(0, Ordering::Relaxed);
        self.open_failures.store(0, Ordering::Relaxed);
        self.pings_sent.store(0, Ordering::Relaxed);
        self.forced_disconnects.store(0, Ordering::Relaxed);
        self.dropped_commands.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    pub commands_processed: u64,
    pub transactions_ok: u64,
    pub transactions_failed: u64,
    pub echo_mismatches: u64,
    pub transaction_timeouts: u64,
    pub open_attempts: u64,
    pub open_failures: u64,
    pub pings_sent: u64,
    pub forced_disconnects: u64,
    pub dropped_commands: u64,
}

impl MetricsSnapshot {
    /// 事务成功率（百分比）
    ///
    /// 返回 0.0 到 100.0 之间的值。没有事务时返回 0.0。
    pub fn success_rate(&self) -> f64 {
        let total = self.transactions_ok + self.transactions_failed;
        if total == 0 {
            return 0.0;
        }
        (self.transactions_ok as f64 / total as f64) * 100.0
    }
}
