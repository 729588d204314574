//! # Mechanism Hardware
//!
//! 硬件抽象层：执行器存储与硬件接口（无 IO 依赖）
//!
//! ## 模块
//!
//! - `actuator`: 执行器状态与指令
//! - `interface`: 硬件接口（执行器存储、名称解析、当前时间）
//! - `error`: 错误类型
//!
//! 真实的硬件 IO 周期（EtherCAT、CAN 等）不在本 crate 范围内，
//! 由上层在每个 tick 边界写入 `ActuatorState`、读取 `ActuatorCommand`。

pub mod actuator;
mod error;
pub mod interface;

// 重新导出常用类型
pub use actuator::{Actuator, ActuatorCommand, ActuatorState};
pub use error::HardwareError;
pub use interface::{ActuatorId, HardwareInterface, SharedHardware};
