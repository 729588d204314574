//! # Mechanism Model
//!
//! 执行器空间 ⇄ 关节空间的传动传播引擎
//!
//! ## 模块
//!
//! - `description`: URDF 风格的机器人描述解析
//! - `joint` / `joint_state`: 关节描述、运行时关节状态、限位与统计
//! - `transmission`: 传动机构 trait、绑定视图、内置 `simple` / `differential`
//! - `registry`: 类型名 → 传动机构构造器
//! - `robot`: 不可变的机器人模型
//! - `robot_state`: 每周期原地更新的运行时状态
//! - `control_loop`: tick 驱动的控制循环
//! - `config`: TOML 运行配置
//!
//! ## 使用示例
//!
//! ```rust
//! use mechanism_hardware::{Actuator, HardwareInterface};
//! use mechanism_model::{Robot, RobotState};
//! use std::sync::Arc;
//!
//! let xml = r#"
//!   <robot name="demo">
//!     <joint name="j1" type="continuous"/>
//!     <transmission type="simple" name="t1">
//!       <actuator name="act1"/>
//!       <joint name="j1"/>
//!       <mechanicalReduction>2</mechanicalReduction>
//!     </transmission>
//!   </robot>"#;
//!
//! let hw = HardwareInterface::with_actuators([Actuator::new("act1")])?.into_shared();
//! let robot = Arc::new(Robot::from_xml(xml, hw.clone())?);
//! let mut state = RobotState::new(robot);
//!
//! hw.write().actuator_mut("act1").unwrap().state.position = 10.0;
//! state.propagate_actuator_position_to_joint_position();
//! assert_eq!(state.joint_state("j1").unwrap().position, 5.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod control_loop;
pub mod description;
mod error;
pub mod joint;
pub mod joint_state;
pub mod registry;
pub mod robot;
pub mod robot_state;
pub mod transmission;

pub use config::{ActuatorConfig, ControlLoopConfig, MechanismConfig};
pub use control_loop::{ControlLoop, Controller, LoopStats, TickOutcome};
pub use description::{Description, Element, TransmissionBlock};
pub use error::{
    ConfigError, DescriptionError, ModelError, ModelWarning, RegistryError, Severity,
    TransmissionError,
};
pub use joint::{Joint, JointLimits, JointType, KinematicModel, SafetyController};
pub use joint_state::{JointState, JointStatistics, LimitStatus};
pub use registry::TransmissionRegistry;
pub use robot::Robot;
pub use robot_state::RobotState;
pub use transmission::{LoadContext, Transmission, TransmissionInfo, TransmissionLoader};
