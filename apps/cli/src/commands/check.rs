//! check 命令
//!
//! 加载描述文件，报告传动机构、关节绑定与构建警告

use anyhow::{Result, bail};
use clap::Args;
use mechanism_model::RobotState;
use std::path::PathBuf;

use super::{load_config, load_robot};

/// 描述检查命令参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 机器人描述文件（URDF 风格 XML）
    pub description: PathBuf,

    /// 运行配置（提供执行器列表）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 有警告时返回失败
    #[arg(long)]
    pub strict: bool,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let (_hw, state) = load_robot(&self.description, &config)?;

        print_report(&state);

        let warnings = state.model().warnings().len() + state.warnings().len();
        if self.strict && warnings > 0 {
            bail!("{} warning(s) while loading {}", warnings, self.description.display());
        }
        Ok(())
    }
}

fn print_report(state: &RobotState) {
    let robot = state.model();
    let model = robot.kinematic_model();

    println!("🤖 机器人: {}", model.name());
    println!("    {} 个连杆, {} 个关节", model.links().len(), model.joints().len());
    println!();

    println!("⚙️  传动机构 ({}):", robot.transmissions().len());
    for t in robot.transmissions() {
        println!(
            "  {}: [{}] → [{}]",
            t.name(),
            t.actuator_names().join(", "),
            t.joint_names().join(", ")
        );
    }

    let driven: Vec<&str> = state.joint_states().iter().map(|js| js.name()).collect();
    let undriven: Vec<&str> = model
        .joints()
        .iter()
        .map(|j| j.name.as_str())
        .filter(|name| !driven.contains(name))
        .collect();
    println!();
    println!("🔗 受驱关节: {}", driven.join(", "));
    if !undriven.is_empty() {
        println!("   未驱动关节: {}", undriven.join(", "));
    }

    let warnings: Vec<String> = robot
        .warnings()
        .iter()
        .chain(state.warnings())
        .map(ToString::to_string)
        .collect();
    if warnings.is_empty() {
        println!();
        println!("✅ 无警告");
    } else {
        println!();
        println!("⚠️  警告 ({}):", warnings.len());
        for w in &warnings {
            println!("  {}", w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_command_creation() {
        let cmd = CheckCommand {
            description: PathBuf::from("robot.urdf"),
            config: None,
            strict: true,
        };
        assert_eq!(cmd.description, PathBuf::from("robot.urdf"));
        assert!(cmd.config.is_none());
        assert!(cmd.strict);
    }
}
