//! # Amplink CLI
//!
//! 功放主机串口驱动的命令行调用方。
//!
//! ```bash
//! # 粗调音量
//! amplink-cli up
//!
//! # 单步降低三次
//! amplink-cli --device /dev/ttyUSB0 down --precise --repeat 3
//!
//! # 监控连接状态
//! amplink-cli monitor --seconds 30
//! ```

use amplink_driver::VolumeDirection;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod settings;

use commands::{ConfigCommand, MonitorCommand, VolumeCommand};
use settings::Settings;

/// Amplink CLI - 功放主机命令行工具
#[derive(Parser, Debug)]
#[command(name = "amplink-cli")]
#[command(about = "Command-line caller for the amplink serial driver", long_about = None)]
#[command(version)]
struct Cli {
    /// 串口设备路径（覆盖配置文件）
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// 配置文件路径（默认 $CONFIG_DIR/amplink/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 音量增加
    Up {
        #[command(flatten)]
        args: VolumeCommand,
    },

    /// 音量减少
    Down {
        #[command(flatten)]
        args: VolumeCommand,
    },

    /// 监控连接状态
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("amplink=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let (settings, path) = Settings::resolve(cli.config.as_deref(), cli.device.as_deref())?;

    match cli.command {
        Commands::Up { args } => args.execute(VolumeDirection::Up, &settings),
        Commands::Down { args } => args.execute(VolumeDirection::Down, &settings),
        Commands::Monitor { args } => args.execute(&settings),
        Commands::Config(cmd) => cmd.execute(&settings, &path),
    }
}
