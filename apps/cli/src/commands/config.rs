//! 配置管理命令

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use crate::settings::Settings;

/// 配置命令
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// 打印生效的配置（TOML）
    Show,

    /// 打印配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(&self, settings: &Settings, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                println!("# {}", path.display());
                if !path.exists() {
                    println!("# (文件不存在，使用默认值)");
                }
                print!("{}", settings.to_toml()?);
            },
            ConfigCommand::Path => println!("{}", path.display()),
        }
        Ok(())
    }
}
