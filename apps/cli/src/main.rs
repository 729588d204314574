//! # Mechanism CLI
//!
//! 机器人描述检查与内存硬件上的控制循环演示。
//!
//! ```bash
//! # 加载描述并报告传动机构、关节与警告
//! mechanism-cli check robot.urdf --config mechanism.toml
//!
//! # 在模拟硬件上运行 2000 个 tick，把肩关节保持在 0.5 rad
//! mechanism-cli run robot.urdf --config mechanism.toml -n 2000 --target shoulder=0.5
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，默认 `mechanism_cli=info,mechanism_model=warn`。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{CheckCommand, RunCommand};

/// Mechanism CLI - 传动模型命令行工具
#[derive(Parser, Debug)]
#[command(name = "mechanism-cli")]
#[command(about = "Load robot descriptions and drive the mechanism control loop", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 加载描述文件并报告模型
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },

    /// 在模拟硬件上运行控制循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mechanism_cli=info".parse()?)
                .add_directive("mechanism_model=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { args } => args.execute(),
        Commands::Run { args } => args.execute(),
    }
}
