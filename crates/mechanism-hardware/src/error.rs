//! 硬件层错误类型定义

use thiserror::Error;

/// 硬件层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// 执行器名称重复
    #[error("Duplicate actuator name: {0}")]
    DuplicateActuator(String),

    /// 执行器不存在
    #[error("Unknown actuator: {0}")]
    UnknownActuator(String),
}

#[cfg(test)]
mod tests {
    use super::HardwareError;

    #[test]
    fn test_hardware_error_display() {
        let err = HardwareError::DuplicateActuator("motor_a".to_string());
        assert_eq!(format!("{}", err), "Duplicate actuator name: motor_a");

        let err = HardwareError::UnknownActuator("motor_b".to_string());
        assert_eq!(format!("{}", err), "Unknown actuator: motor_b");
    }
}
