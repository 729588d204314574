//! # 运行配置
//!
//! 控制循环参数与内存硬件的执行器列表，TOML 格式：
//!
//! ```toml
//! [control]
//! rate_hz = 1000.0
//! enforce_safety = true
//!
//! [[actuators]]
//! name = "shoulder_motor"
//! max_effort = 30.0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use mechanism_hardware::{Actuator, HardwareInterface};

use crate::error::ConfigError;

/// 运行配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanismConfig {
    /// 控制循环参数
    pub control: ControlLoopConfig,

    /// 执行器列表（用于构建内存硬件接口）
    pub actuators: Vec<ActuatorConfig>,
}

impl MechanismConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 校验配置值
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.control.validate()?;

        let mut seen = HashSet::new();
        for act in &self.actuators {
            if !seen.insert(act.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate actuator name '{}'",
                    act.name
                )));
            }
            if !act.max_effort.is_finite() || act.max_effort < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "actuator '{}' has invalid max_effort {} (must be finite and >= 0)",
                    act.name, act.max_effort
                )));
            }
        }
        Ok(())
    }

    /// 按执行器列表构建内存硬件接口
    pub fn build_hardware(&self) -> Result<HardwareInterface, ConfigError> {
        let actuators = self
            .actuators
            .iter()
            .map(|a| Actuator::new(a.name.as_str()).with_max_effort(a.max_effort));
        Ok(HardwareInterface::with_actuators(actuators)?)
    }
}

/// 控制循环参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLoopConfig {
    /// 控制频率（Hz）
    pub rate_hz: f64,

    /// 每周期在力矩传播前执行 `enforce_safety()`
    pub enforce_safety: bool,
}

impl ControlLoopConfig {
    /// 标称周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rate_hz must be > 0, got {}",
                self.rate_hz
            )));
        }
        Ok(())
    }
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: 1000.0, // PR2 实时循环频率
            enforce_safety: true,
        }
    }
}

/// 执行器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub name: String,

    /// 最大力矩（Nm），0 表示不限制
    #[serde(default)]
    pub max_effort: f64,
}
