//! 连接监控命令
//!
//! 订阅 Ping，打印每次状态变化，直到超时或 Ctrl-C。

use amplink_driver::PingStatus;
use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

use crate::settings::Settings;

/// 还没有收到任何状态
const NO_STATUS: i32 = i32::MIN;

/// 监控命令参数
#[derive(Args, Debug, Clone)]
pub struct MonitorCommand {
    /// 监控时长（秒），不指定时一直运行到 Ctrl-C
    #[arg(short, long)]
    pub seconds: Option<u64>,
}

/// 只在状态变化时打印
///
/// 端口关闭期间每个节拍都会收到 `NotConnected`，逐条打印没有意义。
#[derive(Debug)]
struct StatusPrinter {
    last: AtomicI32,
}

impl StatusPrinter {
    fn new() -> Self {
        Self {
            last: AtomicI32::new(NO_STATUS),
        }
    }

    /// 返回状态是否发生变化
    fn observe(&self, status: PingStatus) -> bool {
        let previous = self.last.swap(status.code(), Ordering::Relaxed);
        previous != status.code()
    }
}

impl MonitorCommand {
    pub fn execute(&self, settings: &Settings) -> Result<()> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        ctrlc::set_handler(move || {
            running_clone.store(false, Ordering::SeqCst);
        })
        .context("注册 Ctrl-C 处理失败")?;

        let driver = super::start_driver(settings)?;
        println!("monitoring {} (Ctrl-C to stop)", settings.serial.path);

        let printer = Arc::new(StatusPrinter::new());
        let started = Instant::now();
        let printer_clone = printer.clone();
        driver.start_ping(move |status: PingStatus| {
            if printer_clone.observe(status) {
                println!("[{:>7.1}s] {}", started.elapsed().as_secs_f64(), status);
            }
        })?;

        let deadline = self.seconds.map(|s| started + Duration::from_secs(s));
        while running.load(Ordering::SeqCst) {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }
            thread::sleep(Duration::from_millis(100));
        }

        driver.stop_ping()?;
        let metrics = driver.shutdown();
        info!(
            "pings: {}, forced disconnects: {}, open attempts: {} ({} failed)",
            metrics.pings_sent,
            metrics.forced_disconnects,
            metrics.open_attempts,
            metrics.open_failures
        );
        Ok(())
    }
}
