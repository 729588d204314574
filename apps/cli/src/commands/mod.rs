//! 命令定义和实现

pub mod check;
pub mod run;

pub use check::CheckCommand;
pub use run::RunCommand;

use anyhow::{Context, Result};
use mechanism_model::{MechanismConfig, Robot, RobotState, TransmissionRegistry};
use std::path::Path;
use std::sync::Arc;

/// 加载配置（未指定时使用默认配置）
pub(crate) fn load_config(path: Option<&Path>) -> Result<MechanismConfig> {
    match path {
        Some(path) => MechanismConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(MechanismConfig::default()),
    }
}

/// 按配置构建硬件、模型与运行时状态
pub(crate) fn load_robot(
    description: &Path,
    config: &MechanismConfig,
) -> Result<(mechanism_hardware::SharedHardware, RobotState)> {
    let hw = config.build_hardware()?.into_shared();
    let robot = Robot::load_file(description, hw.clone(), &TransmissionRegistry::default())
        .with_context(|| format!("Failed to load robot description {}", description.display()))?;
    Ok((hw, RobotState::new(Arc::new(robot))))
}
