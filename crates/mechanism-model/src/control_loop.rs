//! 控制循环
//!
//! 一个 tick 的顺序：
//!
//! 1. `propagate_actuator_position_to_joint_position()`
//! 2. 有执行器急停 → `zero_commands()`，跳过控制器；否则调用控制器，
//!    按配置执行 `enforce_safety()`
//! 3. `propagate_joint_effort_to_actuator_effort()`
//!
//! [`ControlLoop::run`] 使用 `spin_sleep` 按标称周期定时，dt 超过两倍周期时被钳位。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use mechanism_model::{ControlLoop, ControlLoopConfig, RobotState};
//! use std::time::Duration;
//!
//! # fn example(state: RobotState) {
//! let mut control = ControlLoop::new(state, ControlLoopConfig::default());
//! let mut hold = |state: &mut RobotState, _dt: Duration| {
//!     if let Some(js) = state.joint_state_mut("shoulder") {
//!         js.commanded_effort = -10.0 * js.position;
//!     }
//! };
//! control.run(&mut hold, Some(1000), || false);
//! # }
//! ```

use std::time::{Duration, Instant};

use tracing::{info, trace, warn};

use crate::config::ControlLoopConfig;
use crate::robot_state::RobotState;

/// 控制器
///
/// 读取 `RobotState` 中的关节状态，写入 `commanded_effort`。
/// 与传播操作一样在实时循环中调用，禁止阻塞。
pub trait Controller {
    fn update(&mut self, state: &mut RobotState, dt: Duration);

    /// 执行器进入急停时调用一次
    fn on_halt(&mut self) {}
}

impl<F> Controller for F
where
    F: FnMut(&mut RobotState, Duration),
{
    fn update(&mut self, state: &mut RobotState, dt: Duration) {
        self(state, dt)
    }
}

/// 单个 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// 从 1 开始的 tick 序号
    pub tick: u64,
    /// 本 tick 是否因急停而清零了指令
    pub halted: bool,
}

/// 循环统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    pub ticks: u64,
    pub halted_ticks: u64,
    /// 实际 dt 超过两倍周期的次数
    pub overruns: u64,
}

/// 控制循环
#[derive(Debug)]
pub struct ControlLoop {
    state: RobotState,
    config: ControlLoopConfig,
    stats: LoopStats,
    was_halted: bool,
}

impl ControlLoop {
    pub fn new(state: RobotState, config: ControlLoopConfig) -> Self {
        Self {
            state,
            config,
            stats: LoopStats::default(),
            was_halted: false,
        }
    }

    /// 执行一个 tick
    pub fn tick<C: Controller + ?Sized>(&mut self, controller: &mut C, dt: Duration) -> TickOutcome {
        self.state.propagate_actuator_position_to_joint_position();

        let halted = self.state.is_halted();
        if halted {
            if !self.was_halted {
                warn!("Actuator halted at tick {}, zeroing commands", self.stats.ticks + 1);
                controller.on_halt();
            }
            self.state.zero_commands();
            self.stats.halted_ticks += 1;
        } else {
            if self.was_halted {
                info!("Actuators released from halt at tick {}", self.stats.ticks + 1);
            }
            controller.update(&mut self.state, dt);
            if self.config.enforce_safety {
                self.state.enforce_safety();
            }
        }
        self.was_halted = halted;

        self.state.propagate_joint_effort_to_actuator_effort();

        self.stats.ticks += 1;
        trace!(tick = self.stats.ticks, halted, "tick");
        TickOutcome {
            tick: self.stats.ticks,
            halted,
        }
    }

    /// 按配置频率循环执行，直到达到 `max_ticks` 或 `should_stop()` 返回 true
    pub fn run<C, S>(&mut self, controller: &mut C, max_ticks: Option<u64>, mut should_stop: S) -> LoopStats
    where
        C: Controller + ?Sized,
        S: FnMut() -> bool,
    {
        let period = self.config.period();
        let max_dt = period * 2;
        let sleeper = spin_sleep::SpinSleeper::default();

        let start_ticks = self.stats.ticks;
        let mut last = Instant::now();
        let mut next_deadline = last + period;

        while max_ticks.is_none_or(|max| self.stats.ticks - start_ticks < max) && !should_stop() {
            let now = Instant::now();
            let mut dt = now - last;
            if dt > max_dt {
                self.stats.overruns += 1;
                dt = max_dt;
            }
            last = now;

            self.tick(controller, dt);

            let now = Instant::now();
            if next_deadline > now {
                sleeper.sleep(next_deadline - now);
            } else {
                next_deadline = now;
            }
            next_deadline += period;
        }

        self.stats
    }

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RobotState {
        &mut self.state
    }

    pub fn config(&self) -> &ControlLoopConfig {
        &self.config
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn into_state(self) -> RobotState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::Robot;
    use mechanism_hardware::{Actuator, HardwareInterface, SharedHardware};
    use std::sync::Arc;

    const XML: &str = r#"
        <robot>
          <joint name="j" type="revolute">
            <limit lower="-1" upper="1" effort="5" velocity="10"/>
            <safety_controller soft_lower_limit="-1" soft_upper_limit="1" k_position="1" k_velocity="100"/>
          </joint>
          <transmission type="simple" name="t">
            <actuator name="m"/><joint name="j"/>
            <mechanicalReduction>1</mechanicalReduction>
          </transmission>
        </robot>"#;

    fn setup(enforce_safety: bool) -> (SharedHardware, ControlLoop) {
        let hw = HardwareInterface::with_actuators([Actuator::new("m")])
            .unwrap()
            .into_shared();
        let robot = Arc::new(Robot::from_xml(XML, hw.clone()).unwrap());
        let config = ControlLoopConfig {
            rate_hz: 1000.0,
            enforce_safety,
        };
        (hw, ControlLoop::new(RobotState::new(robot), config))
    }

    fn push(effort: f64) -> impl FnMut(&mut RobotState, Duration) {
        move |state: &mut RobotState, _dt: Duration| {
            for js in state.joint_states_mut() {
                js.commanded_effort = effort;
            }
        }
    }

    #[test]
    fn test_tick_runs_controller_and_clamps() {
        let (hw, mut control) = setup(true);
        let mut controller = push(50.0);

        let outcome = control.tick(&mut controller, Duration::from_millis(1));
        assert_eq!(outcome, TickOutcome { tick: 1, halted: false });
        assert_eq!(hw.read().actuator("m").unwrap().command.effort, 5.0);
    }

    #[test]
    fn test_tick_without_safety() {
        let (hw, mut control) = setup(false);
        let mut controller = push(50.0);
        control.tick(&mut controller, Duration::from_millis(1));
        assert_eq!(hw.read().actuator("m").unwrap().command.effort, 50.0);
    }

    #[test]
    fn test_halt_zeroes_commands() {
        struct Counting {
            updates: u32,
            halts: u32,
        }
        impl Controller for Counting {
            fn update(&mut self, state: &mut RobotState, _dt: Duration) {
                self.updates += 1;
                state.joint_states_mut()[0].commanded_effort = 1.0;
            }
            fn on_halt(&mut self) {
                self.halts += 1;
            }
        }

        let (hw, mut control) = setup(true);
        let mut c = Counting { updates: 0, halts: 0 };

        control.tick(&mut c, Duration::ZERO);
        hw.write().actuator_mut("m").unwrap().state.halted = true;
        let outcome = control.tick(&mut c, Duration::ZERO);
        control.tick(&mut c, Duration::ZERO);

        assert!(outcome.halted);
        assert_eq!(hw.read().actuator("m").unwrap().command.effort, 0.0);
        assert_eq!(c.updates, 1);
        assert_eq!(c.halts, 1);

        hw.write().actuator_mut("m").unwrap().state.halted = false;
        control.tick(&mut c, Duration::ZERO);
        assert_eq!(c.updates, 2);
        assert_eq!(
            control.stats(),
            LoopStats {
                ticks: 4,
                halted_ticks: 2,
                overruns: 0
            }
        );
    }

    #[test]
    fn test_run_stops_at_max_ticks() {
        let (_hw, mut control) = setup(true);
        let mut controller = push(0.0);

        let stats = control.run(&mut controller, Some(5), || false);
        assert_eq!(stats.ticks, 5);

        let mut calls = 0;
        let stats = control.run(&mut controller, None, || {
            calls += 1;
            calls > 3
        });
        assert_eq!(stats.ticks, 8);
    }
}
