//! 机器人运行时状态
//!
//! `RobotState` 是控制循环每个周期原地更新的聚合体：
//!
//! ```text
//! 硬件刷新执行器
//!   → propagate_actuator_position_to_joint_position()   位置传播 + 统计
//!   → 控制器写 commanded_effort（可选 enforce_safety / zero_commands）
//!   → propagate_joint_effort_to_actuator_effort()        力矩传播
//! 硬件消费执行器指令
//! ```
//!
//! 所有容器在构建时一次性分配，传播过程中不分配内存。每个传播操作在入口处获取一次
//! 硬件锁（位置传播取读锁，力矩传播取写锁），周期边界即同步点。

use std::collections::HashMap;
use std::sync::Arc;

use mechanism_hardware::ActuatorId;
use tracing::{debug, warn};

use crate::error::ModelWarning;
use crate::joint_state::JointState;
use crate::robot::Robot;
use crate::transmission::{Bound, BoundMut};

/// 机器人运行时状态
#[derive(Debug)]
pub struct RobotState {
    robot: Arc<Robot>,
    joint_states: Vec<JointState>,
    joint_index: HashMap<String, usize>,
    /// 第 i 个传动机构绑定的执行器（声明顺序）
    transmissions_in: Vec<Vec<ActuatorId>>,
    /// 第 i 个传动机构绑定的关节状态下标（声明顺序）
    transmissions_out: Vec<Vec<usize>>,
    warnings: Vec<ModelWarning>,
}

impl RobotState {
    /// 由模型构建运行时状态
    ///
    /// 每个传动机构声明的每个关节各占一个 `JointState` 槽位（不去重；重名时名称映射指向
    /// 最后一个）。
    ///
    /// # Panics
    ///
    /// 传动机构声明的执行器或关节无法解析时 panic。[`Robot`] 在加载时已校验全部名称，
    /// 此处失败说明硬件接口在加载后被修改。
    pub fn new(robot: Arc<Robot>) -> Self {
        let transmissions = robot.transmissions();
        let mut joint_states = Vec::new();
        let mut joint_index = HashMap::new();
        let mut transmissions_in = Vec::with_capacity(transmissions.len());
        let mut transmissions_out = Vec::with_capacity(transmissions.len());

        {
            let hw = robot.hardware().read();
            for t in transmissions {
                let bound: Vec<ActuatorId> = t
                    .actuator_names()
                    .iter()
                    .map(|name| {
                        hw.actuator_id(name).unwrap_or_else(|| {
                            panic!(
                                "Transmission '{}' references actuator '{}' which is not in the hardware interface",
                                t.name(),
                                name
                            )
                        })
                    })
                    .collect();
                transmissions_in.push(bound);

                let mut slots = Vec::with_capacity(t.joint_names().len());
                for name in t.joint_names() {
                    let joint = robot.kinematic_model().joint(name).unwrap_or_else(|| {
                        panic!(
                            "Transmission '{}' references joint '{}' which is not in the kinematic model",
                            t.name(),
                            name
                        )
                    });
                    let slot = joint_states.len();
                    joint_states.push(JointState::new(Arc::clone(joint)));
                    joint_index.insert(name.clone(), slot);
                    slots.push(slot);
                }
                transmissions_out.push(slots);
            }
        }

        let mut warnings = Vec::new();
        if transmissions.is_empty() {
            warn!("{}", ModelWarning::NoTransmissions);
            warnings.push(ModelWarning::NoTransmissions);
        }
        if joint_states.is_empty() {
            warn!("{}", ModelWarning::NoJointStates);
            warnings.push(ModelWarning::NoJointStates);
        }

        debug!(
            "Robot state ready: {} transmissions, {} joint states",
            transmissions_in.len(),
            joint_states.len()
        );

        Self {
            robot,
            joint_states,
            joint_index,
            transmissions_in,
            transmissions_out,
            warnings,
        }
    }

    /// 执行器位置 → 关节位置，然后更新全部关节统计
    pub fn propagate_actuator_position_to_joint_position(&mut self) {
        {
            let hw = self.robot.hardware().read();
            let actuators = hw.actuators();
            for (i, t) in self.robot.transmissions().iter().enumerate() {
                t.propagate_position(
                    Bound::new(&self.transmissions_in[i], actuators),
                    BoundMut::new(&self.transmissions_out[i], &mut self.joint_states),
                );
            }
        }

        for js in &mut self.joint_states {
            js.update_statistics();
        }
    }

    /// 关节指令力矩 → 执行器指令力矩
    pub fn propagate_joint_effort_to_actuator_effort(&mut self) {
        let mut hw = self.robot.hardware().write();
        let actuators = hw.actuators_mut();
        for (i, t) in self.robot.transmissions().iter().enumerate() {
            t.propagate_effort(
                Bound::new(&self.transmissions_out[i], &self.joint_states),
                BoundMut::new(&self.transmissions_in[i], &mut *actuators),
            );
        }
    }

    /// 关节位置 → 执行器位置（仿真/诊断用）
    pub fn propagate_joint_position_to_actuator_position(&mut self) {
        let mut hw = self.robot.hardware().write();
        let actuators = hw.actuators_mut();
        for (i, t) in self.robot.transmissions().iter().enumerate() {
            t.propagate_position_backwards(
                Bound::new(&self.transmissions_out[i], &self.joint_states),
                BoundMut::new(&self.transmissions_in[i], &mut *actuators),
            );
        }
    }

    /// 执行器指令力矩 → 关节指令力矩
    pub fn propagate_actuator_effort_to_joint_effort(&mut self) {
        let hw = self.robot.hardware().read();
        let actuators = hw.actuators();
        for (i, t) in self.robot.transmissions().iter().enumerate() {
            t.propagate_effort_backwards(
                Bound::new(&self.transmissions_in[i], actuators),
                BoundMut::new(&self.transmissions_out[i], &mut self.joint_states),
            );
        }
    }

    /// 是否有任何绑定的执行器处于急停状态
    pub fn is_halted(&self) -> bool {
        let hw = self.robot.hardware().read();
        self.transmissions_in
            .iter()
            .flatten()
            .any(|&id| hw.get(id).is_halted())
    }

    /// 按关节限位收紧全部指令力矩
    pub fn enforce_safety(&mut self) {
        for js in &mut self.joint_states {
            js.enforce_limits();
        }
    }

    /// 全部指令力矩清零
    pub fn zero_commands(&mut self) {
        for js in &mut self.joint_states {
            js.commanded_effort = 0.0;
        }
    }

    /// 清空全部关节统计
    pub fn reset_statistics(&mut self) {
        for js in &mut self.joint_states {
            js.statistics.reset();
        }
    }

    /// 按关节名查找状态
    pub fn joint_state(&self, name: &str) -> Option<&JointState> {
        self.joint_index.get(name).map(|&i| &self.joint_states[i])
    }

    /// 按关节名查找状态（可变）
    pub fn joint_state_mut(&mut self, name: &str) -> Option<&mut JointState> {
        let i = *self.joint_index.get(name)?;
        Some(&mut self.joint_states[i])
    }

    /// 全部关节状态（传动机构声明顺序）
    pub fn joint_states(&self) -> &[JointState] {
        &self.joint_states
    }

    pub fn joint_states_mut(&mut self) -> &mut [JointState] {
        &mut self.joint_states
    }

    /// 第 i 个传动机构绑定的执行器
    pub fn actuator_bindings(&self, transmission: usize) -> Option<&[ActuatorId]> {
        self.transmissions_in.get(transmission).map(Vec::as_slice)
    }

    /// 第 i 个传动机构绑定的关节状态下标
    pub fn joint_bindings(&self, transmission: usize) -> Option<&[usize]> {
        self.transmissions_out.get(transmission).map(Vec::as_slice)
    }

    pub fn transmission_count(&self) -> usize {
        self.transmissions_in.len()
    }

    /// 所属的机器人模型
    pub fn model(&self) -> &Arc<Robot> {
        &self.robot
    }

    /// 构建期间产生的警告
    pub fn warnings(&self) -> &[ModelWarning] {
        &self.warnings
    }
}
