//! # Amplink Driver
//!
//! 功放主机串口驱动：后台工作线程独占串口，调用线程通过命令队列提交命令。
//!
//! - 命令通道（`channel`）：多生产者单消费者的有界 FIFO
//! - 协议引擎（`engine`）：发送字节并在重试预算内等待完整回显
//! - 调度器（`scheduler`）：重连冷却与周期性 Ping
//! - 工作线程（`worker`）：把以上组件串起来的状态机
//! - 对外句柄（[`SerialDriver`]）：`start_ping` / `stop_ping` / `volume_up` /
//!   `volume_down` / `shutdown`
//!
//! # 快速开始
//!
//! ```no_run
//! use amplink_driver::PingStatus;
//!
//! let driver = amplink_driver::initialize()?;
//! driver.start_ping(|status: PingStatus| {
//!     if !status.is_ok() {
//!         eprintln!("amplifier: {}", status);
//!     }
//! })?;
//! driver.volume_up(true)?;
//! driver.shutdown();
//! # Ok::<(), amplink_driver::DriverError>(())
//! ```

mod builder;
pub mod channel;
pub mod clock;
pub mod command;
pub mod config;
mod driver;
pub mod engine;
mod error;
pub mod metrics;
pub mod scheduler;
pub mod state;
pub mod worker;

pub use amplink_protocol::{PingStatus, VolumeDirection};
pub use amplink_serial::{SerialTransport, TtyConfig};
pub use builder::DriverBuilder;
pub use command::{DriverCommand, PingCallback, PingSubscription};
pub use config::DriverConfig;
pub use driver::{SerialDriver, WORKER_THREAD_NAME};
pub use error::DriverError;
pub use metrics::{DriverMetrics, MetricsSnapshot};
pub use state::{AtomicConnectionState, ConnectionState};

/// 使用默认设备和默认配置启动驱动
#[cfg(unix)]
pub fn initialize() -> Result<SerialDriver, DriverError> {
    DriverBuilder::new().build()
}
