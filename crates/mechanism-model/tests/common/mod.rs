//! 集成测试共享夹具

#![allow(dead_code)]

use mechanism_hardware::{Actuator, HardwareInterface, SharedHardware};
use mechanism_model::{Robot, RobotState};
use std::sync::Arc;

/// 单个 simple 传动：act1 → joint1，传动比 2
pub const SINGLE_REDUCER: &str = r#"
<robot name="single">
  <link name="base"/>
  <link name="arm"/>
  <joint name="joint1" type="revolute">
    <parent link="base"/>
    <child link="arm"/>
  </joint>
  <transmission type="simple" name="trans1">
    <actuator name="act1"/>
    <joint name="joint1"/>
    <mechanicalReduction>2</mechanicalReduction>
  </transmission>
</robot>
"#;

/// 腕部差动 + 肩部减速器
pub const ARM: &str = r#"
<robot name="arm">
  <joint name="shoulder" type="revolute">
    <limit lower="-2" upper="2" effort="30" velocity="3"/>
    <safety_controller soft_lower_limit="-1.9" soft_upper_limit="1.9" k_position="10" k_velocity="20"/>
  </joint>
  <joint name="wrist_flex" type="revolute"/>
  <joint name="wrist_roll" type="continuous"/>
  <joint name="gripper" type="prismatic"/>
  <transmission type="pr2_mechanism_model/SimpleTransmission" name="shoulder_trans">
    <actuator name="shoulder_motor"/>
    <joint name="shoulder"/>
    <mechanicalReduction>50</mechanicalReduction>
  </transmission>
  <transmission type="DifferentialTransmission" name="wrist_trans">
    <leftActuator name="wrist_l_motor"/>
    <rightActuator name="wrist_r_motor"/>
    <flexJoint name="wrist_flex" mechanicalReduction="60"/>
    <rollJoint name="wrist_roll" mechanicalReduction="60"/>
  </transmission>
</robot>
"#;

pub const ARM_ACTUATORS: [&str; 3] = ["shoulder_motor", "wrist_l_motor", "wrist_r_motor"];

pub fn hardware(names: &[&str]) -> SharedHardware {
    HardwareInterface::with_actuators(names.iter().map(|n| Actuator::new(*n)))
        .expect("unique actuator names")
        .into_shared()
}

pub fn robot_state(xml: &str, actuators: &[&str]) -> (SharedHardware, RobotState) {
    let hw = hardware(actuators);
    let robot = Robot::from_xml(xml, hw.clone()).expect("robot builds");
    (hw, RobotState::new(Arc::new(robot)))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
