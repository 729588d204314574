//! 差动传动（腕部 flex/roll 结构）
//!
//! 两个执行器共同驱动两个关节：同向转动产生 flex，反向转动产生 roll。
//!
//! ```text
//! q_flex = (p_left + p_right) / (2 · n_flex)
//! q_roll = (p_left - p_right) / (2 · n_roll)
//!
//! τ_flex = n_flex · (τ_left + τ_right)
//! τ_roll = n_roll · (τ_left - τ_right)
//! ```
//!
//! ```xml
//! <transmission type="differential" name="wrist_trans">
//!   <leftActuator name="wrist_l_motor"/>
//!   <rightActuator name="wrist_r_motor"/>
//!   <flexJoint name="wrist_flex_joint" mechanicalReduction="60.0"/>
//!   <rollJoint name="wrist_roll_joint" mechanicalReduction="60.0"/>
//! </transmission>
//! ```

use super::{
    Actuators, ActuatorsMut, Joints, JointsMut, LoadContext, Transmission, TransmissionInfo,
    TransmissionLoader, named_child, parse_reduction, transmission_name,
};
use crate::description::Element;
use crate::error::TransmissionError;

const LEFT: usize = 0;
const RIGHT: usize = 1;
const FLEX: usize = 0;
const ROLL: usize = 1;

/// 差动传动
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialTransmission {
    info: TransmissionInfo,
    flex_reduction: f64,
    roll_reduction: f64,
}

impl DifferentialTransmission {
    /// 执行器顺序为 `[left, right]`，关节顺序为 `[flex, roll]`
    pub fn new(
        name: impl Into<String>,
        actuators: [&str; 2],
        joints: [&str; 2],
        reductions: [f64; 2],
    ) -> Self {
        Self {
            info: TransmissionInfo::new(name, actuators, joints),
            flex_reduction: reductions[FLEX],
            roll_reduction: reductions[ROLL],
        }
    }

    pub fn reductions(&self) -> [f64; 2] {
        [self.flex_reduction, self.roll_reduction]
    }

    #[inline]
    fn to_joint(&self, left: f64, right: f64) -> (f64, f64) {
        (
            (left + right) / (2.0 * self.flex_reduction),
            (left - right) / (2.0 * self.roll_reduction),
        )
    }

    #[inline]
    fn to_actuator(&self, flex: f64, roll: f64) -> (f64, f64) {
        let f = self.flex_reduction * flex;
        let r = self.roll_reduction * roll;
        (f + r, f - r)
    }

    #[inline]
    fn effort_to_joint(&self, left: f64, right: f64) -> (f64, f64) {
        (
            self.flex_reduction * (left + right),
            self.roll_reduction * (left - right),
        )
    }

    #[inline]
    fn effort_to_actuator(&self, flex: f64, roll: f64) -> (f64, f64) {
        let f = flex / self.flex_reduction;
        let r = roll / self.roll_reduction;
        ((f + r) / 2.0, (f - r) / 2.0)
    }
}

impl Transmission for DifferentialTransmission {
    fn info(&self) -> &TransmissionInfo {
        &self.info
    }

    fn propagate_position(&self, actuators: Actuators<'_>, mut joints: JointsMut<'_>) {
        let (l, r) = (&actuators[LEFT].state, &actuators[RIGHT].state);

        let (flex, roll) = self.to_joint(l.position, r.position);
        joints[FLEX].position = flex;
        joints[ROLL].position = roll;

        let (flex, roll) = self.to_joint(l.velocity, r.velocity);
        joints[FLEX].velocity = flex;
        joints[ROLL].velocity = roll;

        let (flex, roll) = self.effort_to_joint(l.last_measured_effort, r.last_measured_effort);
        joints[FLEX].measured_effort = flex;
        joints[ROLL].measured_effort = roll;
    }

    fn propagate_effort(&self, joints: Joints<'_>, mut actuators: ActuatorsMut<'_>) {
        let (left, right) =
            self.effort_to_actuator(joints[FLEX].commanded_effort, joints[ROLL].commanded_effort);
        actuators[LEFT].command.enable = true;
        actuators[LEFT].command.effort = left;
        actuators[RIGHT].command.enable = true;
        actuators[RIGHT].command.effort = right;
    }

    fn propagate_position_backwards(&self, joints: Joints<'_>, mut actuators: ActuatorsMut<'_>) {
        let (flex, roll) = (&joints[FLEX], &joints[ROLL]);

        let (left, right) = self.to_actuator(flex.position, roll.position);
        actuators[LEFT].state.position = left;
        actuators[RIGHT].state.position = right;

        let (left, right) = self.to_actuator(flex.velocity, roll.velocity);
        actuators[LEFT].state.velocity = left;
        actuators[RIGHT].state.velocity = right;

        let (left, right) = self.effort_to_actuator(flex.measured_effort, roll.measured_effort);
        actuators[LEFT].state.last_measured_effort = left;
        actuators[RIGHT].state.last_measured_effort = right;
    }

    fn propagate_effort_backwards(&self, actuators: Actuators<'_>, mut joints: JointsMut<'_>) {
        let (flex, roll) = self.effort_to_joint(
            actuators[LEFT].command.effort,
            actuators[RIGHT].command.effort,
        );
        joints[FLEX].commanded_effort = flex;
        joints[ROLL].commanded_effort = roll;
    }
}

/// `differential` 类型的加载器
#[derive(Debug, Default)]
pub struct DifferentialTransmissionLoader;

impl DifferentialTransmissionLoader {
    fn joint<'e>(
        config: &'e Element,
        ctx: &LoadContext<'_>,
        transmission: &str,
        tag: &'static str,
    ) -> Result<(&'e str, f64), TransmissionError> {
        let el = named_child(config, transmission, tag)?;
        let name = el.attribute("name").unwrap_or_default();
        ctx.require_joint(transmission, name)?;

        let raw = el
            .attribute("mechanicalReduction")
            .ok_or_else(|| TransmissionError::MissingElement {
                transmission: transmission.to_string(),
                element: "mechanicalReduction",
            })?;
        Ok((name, parse_reduction(raw, transmission, "mechanicalReduction")?))
    }

    fn actuator<'e>(
        config: &'e Element,
        ctx: &LoadContext<'_>,
        transmission: &str,
        tag: &'static str,
    ) -> Result<&'e str, TransmissionError> {
        let name = named_child(config, transmission, tag)?
            .attribute("name")
            .unwrap_or_default();
        ctx.require_actuator(transmission, name)?;
        Ok(name)
    }
}

impl TransmissionLoader for DifferentialTransmissionLoader {
    fn load(
        self: Box<Self>,
        config: &Element,
        ctx: &LoadContext<'_>,
    ) -> Result<Box<dyn Transmission>, TransmissionError> {
        let name = transmission_name(config)?;

        let left = Self::actuator(config, ctx, name, "leftActuator")?;
        let right = Self::actuator(config, ctx, name, "rightActuator")?;
        let (flex, flex_reduction) = Self::joint(config, ctx, name, "flexJoint")?;
        let (roll, roll_reduction) = Self::joint(config, ctx, name, "rollJoint")?;

        Ok(Box::new(DifferentialTransmission::new(
            name,
            [left, right],
            [flex, roll],
            [flex_reduction, roll_reduction],
        )))
    }
}
