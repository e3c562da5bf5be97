//! 音量命令

use amplink_driver::{SerialDriver, VolumeDirection};
use anyhow::{Result, bail};
use clap::Args;

use crate::settings::Settings;

/// 音量命令参数
#[derive(Args, Debug, Clone)]
pub struct VolumeCommand {
    /// 单步调节（只发送一个字节）
    #[arg(short, long)]
    pub precise: bool,

    /// 重复次数
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub repeat: u32,
}

impl VolumeCommand {
    /// 启动驱动、提交命令、关闭驱动
    ///
    /// 关闭请求排在所有音量命令之后，因此返回时命令都已执行完毕。
    pub fn execute(&self, direction: VolumeDirection, settings: &Settings) -> Result<()> {
        let mut settings = settings.clone();
        let repeat = self.repeat as usize;
        settings.driver.channel_capacity = settings.driver.channel_capacity.max(repeat + 1);

        let driver = super::start_driver(&settings)?;
        for _ in 0..repeat {
            submit(&driver, direction, self.precise)?;
        }
        let metrics = driver.shutdown();

        println!(
            "{} x{}: {} ok, {} failed, {} dropped",
            label(direction, self.precise),
            repeat,
            metrics.transactions_ok,
            metrics.transactions_failed,
            metrics.dropped_commands
        );
        if metrics.transactions_ok < repeat as u64 {
            bail!("{} 条音量命令未成功执行", repeat as u64 - metrics.transactions_ok);
        }
        Ok(())
    }
}

fn submit(driver: &SerialDriver, direction: VolumeDirection, precise: bool) -> Result<()> {
    match direction {
        VolumeDirection::Up => driver.volume_up(precise)?,
        VolumeDirection::Down => driver.volume_down(precise)?,
    }
    Ok(())
}

fn label(direction: VolumeDirection, precise: bool) -> &'static str {
    match (direction, precise) {
        (VolumeDirection::Up, false) => "volume up",
        (VolumeDirection::Up, true) => "volume up (precise)",
        (VolumeDirection::Down, false) => "volume down",
        (VolumeDirection::Down, true) => "volume down (precise)",
    }
}
