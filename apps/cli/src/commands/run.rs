//! run 命令
//!
//! 在内存硬件上运行控制循环。每个 tick 之后由一个单位惯量的模拟对象积分执行器
//! 指令力矩，更新执行器位置与速度，下一个 tick 再经传动机构传播到关节空间。

use anyhow::{Context, Result, bail};
use clap::Args;
use mechanism_hardware::SharedHardware;
use mechanism_model::{ControlLoop, Controller, RobotState};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use super::{load_config, load_robot};

/// 控制循环运行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 机器人描述文件（URDF 风格 XML）
    pub description: PathBuf,

    /// 运行配置（控制频率与执行器列表）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 运行的 tick 数
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub ticks: u64,

    /// 关节目标位置 `name=value`（可重复；未指定的关节保持在 0）
    #[arg(long = "target", value_parser = parse_target)]
    pub targets: Vec<(String, f64)>,

    /// 位置增益
    #[arg(long, default_value_t = 50.0)]
    pub kp: f64,

    /// 速度增益
    #[arg(long, default_value_t = 5.0)]
    pub kd: f64,

    /// 不按控制频率定时，尽快执行
    #[arg(long)]
    pub fast: bool,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let (hw, state) = load_robot(&self.description, &config)?;

        for (joint, _) in &self.targets {
            if state.joint_state(joint).is_none() {
                bail!("Joint '{}' is not driven by any transmission", joint);
            }
        }

        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nReceived interrupt signal. Stopping...");
            r.store(false, Ordering::SeqCst);
        })
        .context("Failed to install Ctrl-C handler")?;

        let period = config.control.period();
        let mut control = ControlLoop::new(state, config.control.clone());
        let mut controller = HoldController {
            targets: self.targets.iter().cloned().collect(),
            kp: self.kp,
            kd: self.kd,
        };
        let plant = SimulatedPlant::new(hw.clone());
        let sleeper = spin_sleep::SpinSleeper::default();

        info!(
            "Running {} ticks at {:.1} Hz ({})",
            self.ticks,
            config.control.rate_hz,
            if self.fast { "unpaced" } else { "paced" }
        );

        let start = Instant::now();
        let mut next_deadline = start + period;
        for _ in 0..self.ticks {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            control.tick(&mut controller, period);
            plant.step(period);

            if !self.fast {
                let now = Instant::now();
                if next_deadline > now {
                    sleeper.sleep(next_deadline - now);
                }
                next_deadline += period;
            }
        }

        let stats = control.stats();
        println!(
            "📊 {} ticks ({} halted) in {:.3} s",
            stats.ticks,
            stats.halted_ticks,
            start.elapsed().as_secs_f64()
        );
        print_joints(control.state());
        Ok(())
    }
}

/// 每个受驱关节的 PD 位置保持
struct HoldController {
    targets: HashMap<String, f64>,
    kp: f64,
    kd: f64,
}

impl Controller for HoldController {
    fn update(&mut self, state: &mut RobotState, _dt: Duration) {
        for js in state.joint_states_mut() {
            let target = self.targets.get(js.name()).copied().unwrap_or(0.0);
            js.commanded_effort = self.kp * (target - js.position) - self.kd * js.velocity;
        }
    }

    fn on_halt(&mut self) {
        info!("Hold controller paused while actuators are halted");
    }
}

/// 单位惯量的执行器模拟
struct SimulatedPlant {
    hw: SharedHardware,
}

impl SimulatedPlant {
    fn new(hw: SharedHardware) -> Self {
        Self { hw }
    }

    fn step(&self, dt: Duration) {
        let mut hw = self.hw.write();
        let now = hw.current_time() + dt;
        let secs = dt.as_secs_f64();

        for act in hw.actuators_mut() {
            let mut effort = if act.command.enable { act.command.effort } else { 0.0 };
            if act.state.max_effort > 0.0 {
                effort = effort.clamp(-act.state.max_effort, act.state.max_effort);
            }
            act.state.velocity += effort * secs;
            act.state.position += act.state.velocity * secs;
            act.state.last_commanded_effort = act.command.effort;
            act.state.last_measured_effort = effort;
            act.state.timestamp = now;
        }
        hw.set_current_time(now);
    }
}

fn print_joints(state: &RobotState) {
    println!();
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>12}",
        "joint", "position", "velocity", "effort", "odometer"
    );
    for js in state.joint_states() {
        println!(
            "{:<20} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            js.name(),
            js.position,
            js.velocity,
            js.commanded_effort,
            js.statistics.odometer
        );
    }
}

/// 解析 `name=value`
fn parse_target(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid position '{}' for joint '{}'", value, name))?;
    if name.trim().is_empty() {
        return Err(format!("missing joint name in '{}'", s));
    }
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanism_hardware::{Actuator, HardwareInterface};

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("shoulder=0.5"), Ok(("shoulder".to_string(), 0.5)));
        assert_eq!(parse_target(" elbow = -1 "), Ok(("elbow".to_string(), -1.0)));
        assert!(parse_target("shoulder").is_err());
        assert!(parse_target("shoulder=abc").is_err());
        assert!(parse_target("=1.0").is_err());
    }

    #[test]
    fn test_plant_integrates_effort() {
        let hw = HardwareInterface::with_actuators([Actuator::new("m").with_max_effort(1.0)])
            .unwrap()
            .into_shared();
        {
            let mut hw = hw.write();
            let act = hw.actuator_mut("m").unwrap();
            act.command.enable = true;
            act.command.effort = 5.0;
        }

        let plant = SimulatedPlant::new(hw.clone());
        plant.step(Duration::from_millis(500));

        let hw = hw.read();
        let act = hw.actuator("m").unwrap();
        assert_eq!(act.state.last_measured_effort, 1.0);
        assert_eq!(act.state.velocity, 0.5);
        assert_eq!(act.state.position, 0.25);
        assert_eq!(hw.current_time(), Duration::from_millis(500));
    }

    #[test]
    fn test_disabled_actuator_does_not_move() {
        let hw = HardwareInterface::with_actuators([Actuator::new("m")])
            .unwrap()
            .into_shared();
        hw.write().actuator_mut("m").unwrap().command.effort = 5.0;

        SimulatedPlant::new(hw.clone()).step(Duration::from_secs(1));
        assert_eq!(hw.read().actuator("m").unwrap().state.position, 0.0);
    }
}
