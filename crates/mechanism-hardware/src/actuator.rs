//! 执行器（电机）数据结构
//!
//! 执行器是硬件层的叶子节点：
//! - `ActuatorState`：由硬件 IO 周期刷新的原始测量值（电机空间单位）
//! - `ActuatorCommand`：由传动机构写入、由硬件 IO 周期消费的原始指令
//!
//! 两者都是 POD 结构，`Copy` 语义，控制循环内读写不涉及堆分配。

use std::time::Duration;

/// 执行器测量状态（电机空间）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorState {
    /// 最近一次刷新的硬件时间戳
    pub timestamp: Duration,

    /// 电机位置（原始单位，通常为电机侧弧度）
    pub position: f64,

    /// 电机速度
    pub velocity: f64,

    /// 最近一次测得的电机力矩
    pub last_measured_effort: f64,

    /// 最近一次下发的电机力矩（硬件回读）
    pub last_commanded_effort: f64,

    /// 电机能输出的最大力矩
    pub max_effort: f64,

    /// 零位偏移（校准时写入）
    pub zero_offset: f64,

    /// 驱动器是否使能
    pub is_enabled: bool,

    /// 驱动器是否处于停机（故障/急停）状态
    pub halted: bool,
}

/// 执行器指令（电机空间）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorCommand {
    /// 是否使能驱动器
    pub enable: bool,

    /// 期望电机力矩
    pub effort: f64,
}

/// 执行器
///
/// 名称在硬件接口内唯一，注册后不可更改。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actuator {
    name: String,

    /// 测量状态
    pub state: ActuatorState,

    /// 指令
    pub command: ActuatorCommand,
}

impl Actuator {
    /// 创建新的执行器（状态和指令均为零）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ActuatorState::default(),
            command: ActuatorCommand::default(),
        }
    }

    /// 设置最大力矩
    pub fn with_max_effort(mut self, max_effort: f64) -> Self {
        self.state.max_effort = max_effort;
        self
    }

    /// 执行器名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否处于停机状态
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// 清空指令（失能并将力矩置零）
    pub fn clear_command(&mut self) {
        self.command = ActuatorCommand::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_new_is_zeroed() {
        let act = Actuator::new("fl_caster_motor");
        assert_eq!(act.name(), "fl_caster_motor");
        assert_eq!(act.state, ActuatorState::default());
        assert_eq!(act.command, ActuatorCommand::default());
        assert!(!act.is_halted());
    }

    #[test]
    fn test_with_max_effort() {
        let act = Actuator::new("m").with_max_effort(3.5);
        assert_eq!(act.state.max_effort, 3.5);
    }

    #[test]
    fn test_clear_command() {
        let mut act = Actuator::new("m");
        act.command.enable = true;
        act.command.effort = 1.25;

        act.clear_command();
        assert!(!act.command.enable);
        assert_eq!(act.command.effort, 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_actuator_serde_roundtrip() {
        let mut act = Actuator::new("m");
        act.state.position = 1.5;
        act.state.halted = true;

        let json = serde_json::to_string(&act).unwrap();
        let back: Actuator = serde_json::from_str(&json).unwrap();
        assert_eq!(act, back);
    }
}
