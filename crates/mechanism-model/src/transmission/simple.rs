//! 简单减速器
//!
//! 一个执行器驱动一个关节，传动比为 `mechanical_reduction`（电机转数 / 关节转数）：
//!
//! ```text
//! 关节位置 = 电机位置 / 传动比 + joint_offset
//! 关节力矩 = 电机力矩 × 传动比
//! ```
//!
//! 配置示例：
//!
//! ```xml
//! <transmission type="simple" name="caster_trans">
//!   <actuator name="caster_motor"/>
//!   <joint name="caster_joint"/>
//!   <mechanicalReduction>2.0</mechanicalReduction>
//!   <jointOffset>0.0</jointOffset>  <!-- 可选 -->
//! </transmission>
//! ```

use super::{
    Actuators, ActuatorsMut, Joints, JointsMut, LoadContext, Transmission, TransmissionInfo,
    TransmissionLoader, named_child, parse_reduction, transmission_name,
};
use crate::description::Element;
use crate::error::TransmissionError;

/// 简单减速器
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTransmission {
    info: TransmissionInfo,
    mechanical_reduction: f64,
    joint_offset: f64,
}

impl SimpleTransmission {
    pub fn new(
        name: impl Into<String>,
        actuator: impl Into<String>,
        joint: impl Into<String>,
        mechanical_reduction: f64,
    ) -> Self {
        Self {
            info: TransmissionInfo::new(name, [actuator.into()], [joint.into()]),
            mechanical_reduction,
            joint_offset: 0.0,
        }
    }

    pub fn with_joint_offset(mut self, offset: f64) -> Self {
        self.joint_offset = offset;
        self
    }

    pub fn mechanical_reduction(&self) -> f64 {
        self.mechanical_reduction
    }

    pub fn joint_offset(&self) -> f64 {
        self.joint_offset
    }
}

impl Transmission for SimpleTransmission {
    fn info(&self) -> &TransmissionInfo {
        &self.info
    }

    fn propagate_position(&self, actuators: Actuators<'_>, mut joints: JointsMut<'_>) {
        let state = &actuators[0].state;
        let joint = &mut joints[0];
        joint.position = state.position / self.mechanical_reduction + self.joint_offset;
        joint.velocity = state.velocity / self.mechanical_reduction;
        joint.measured_effort = state.last_measured_effort * self.mechanical_reduction;
    }

    fn propagate_effort(&self, joints: Joints<'_>, mut actuators: ActuatorsMut<'_>) {
        let command = &mut actuators[0].command;
        command.enable = true;
        command.effort = joints[0].commanded_effort / self.mechanical_reduction;
    }

    fn propagate_position_backwards(&self, joints: Joints<'_>, mut actuators: ActuatorsMut<'_>) {
        let joint = &joints[0];
        let state = &mut actuators[0].state;
        state.position = (joint.position - self.joint_offset) * self.mechanical_reduction;
        state.velocity = joint.velocity * self.mechanical_reduction;
        state.last_measured_effort = joint.measured_effort / self.mechanical_reduction;
    }

    fn propagate_effort_backwards(&self, actuators: Actuators<'_>, mut joints: JointsMut<'_>) {
        joints[0].commanded_effort = actuators[0].command.effort * self.mechanical_reduction;
    }
}

/// `simple` 类型的加载器
#[derive(Debug, Default)]
pub struct SimpleTransmissionLoader;

impl TransmissionLoader for SimpleTransmissionLoader {
    fn load(
        self: Box<Self>,
        config: &Element,
        ctx: &LoadContext<'_>,
    ) -> Result<Box<dyn Transmission>, TransmissionError> {
        let name = transmission_name(config)?;

        let joint = named_child(config, name, "joint")?.attribute("name").unwrap_or_default();
        ctx.require_joint(name, joint)?;

        let actuator = named_child(config, name, "actuator")?
            .attribute("name")
            .unwrap_or_default();
        ctx.require_actuator(name, actuator)?;

        let raw = config
            .child("mechanicalReduction")
            .and_then(Element::text)
            .ok_or_else(|| TransmissionError::MissingElement {
                transmission: name.to_string(),
                element: "mechanicalReduction",
            })?;
        let reduction = parse_reduction(raw, name, "mechanicalReduction")?;

        let offset = match config.child("jointOffset").and_then(Element::text) {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TransmissionError::InvalidParameter {
                    transmission: name.to_string(),
                    parameter: "jointOffset",
                    value: raw.to_string(),
                })?,
            None => 0.0,
        };

        Ok(Box::new(
            SimpleTransmission::new(name, actuator, joint, reduction).with_joint_offset(offset),
        ))
    }
}
