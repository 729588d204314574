//! 关节状态
//!
//! 每个被传动机构驱动的关节对应一个 `JointState`，由 [`RobotState`](crate::RobotState)
//! 在构建时一次性分配，之后每个控制周期原地更新：
//! - 位置传播写入 `position` / `velocity` / `measured_effort`
//! - 控制器写入 `commanded_effort`
//! - `enforce_limits()` 按关节限位收紧 `commanded_effort`

use std::sync::Arc;

use crate::joint::Joint;

/// 限位检查结果
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LimitStatus {
    /// 本周期尚未检查
    #[default]
    Unchecked,
    /// 关节未配置限位或安全控制器，不做限制
    Unlimited,
    /// 指令在允许范围内
    WithinLimits,
    /// 指令被截断
    Clamped { requested: f64, applied: f64 },
}

/// 关节统计
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointStatistics {
    /// 累计行程
    pub odometer: f64,
    pub min_position: f64,
    pub max_position: f64,
    pub max_abs_velocity: f64,
    pub max_abs_effort: f64,
    /// 限位关节的指令力矩曾超过实测力矩
    pub violated_limits: bool,
    old_position: f64,
    initialized: bool,
}

impl JointStatistics {
    /// 记录一次采样
    ///
    /// 首次采样只初始化位置范围，不累计行程。
    pub fn update(
        &mut self,
        position: f64,
        velocity: f64,
        measured_effort: f64,
        commanded_effort: f64,
        safety_limited: bool,
    ) {
        if self.initialized {
            self.odometer += (self.old_position - position).abs();
            if safety_limited && commanded_effort.abs() > measured_effort.abs() {
                self.violated_limits = true;
            }
            self.min_position = self.min_position.min(position);
            self.max_position = self.max_position.max(position);
            self.max_abs_velocity = self.max_abs_velocity.max(velocity.abs());
            self.max_abs_effort = self.max_abs_effort.max(measured_effort.abs());
        } else {
            self.min_position = position;
            self.max_position = position;
            self.initialized = true;
        }
        self.old_position = position;
    }

    /// 是否已有采样
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 清空统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 关节状态
#[derive(Debug, Clone)]
pub struct JointState {
    joint: Arc<Joint>,

    /// 关节位置（rad 或 m）
    pub position: f64,

    /// 关节速度
    pub velocity: f64,

    /// 实测力矩
    pub measured_effort: f64,

    /// 指令力矩（控制器写入）
    pub commanded_effort: f64,

    /// 是否已完成校准
    pub calibrated: bool,

    /// 校准参考位置
    pub reference_position: f64,

    /// 统计
    pub statistics: JointStatistics,

    limit_status: LimitStatus,
}

impl JointState {
    pub fn new(joint: Arc<Joint>) -> Self {
        Self {
            joint,
            position: 0.0,
            velocity: 0.0,
            measured_effort: 0.0,
            commanded_effort: 0.0,
            calibrated: false,
            reference_position: 0.0,
            statistics: JointStatistics::default(),
            limit_status: LimitStatus::Unchecked,
        }
    }

    /// 关节描述
    pub fn joint(&self) -> &Joint {
        &self.joint
    }

    /// 关节名称
    pub fn name(&self) -> &str {
        &self.joint.name
    }

    /// 最近一次限位检查结果
    pub fn limit_status(&self) -> LimitStatus {
        self.limit_status
    }

    /// 计算当前允许的力矩范围 `(low, high)`
    ///
    /// 只有同时配置了硬限位和安全控制器的关节才会被限制，否则返回 `None`。
    /// 已校准的旋转/直线关节额外按到软限位的距离收紧速度范围。
    pub fn effort_limits(&self) -> Option<(f64, f64)> {
        let (limits, safety) = match (&self.joint.limits, &self.joint.safety) {
            (Some(limits), Some(safety)) => (limits, safety),
            _ => return None,
        };

        let max_velocity = limits.velocity;
        let (vel_low, vel_high) = if self.calibrated && self.joint.joint_type.has_position_limits()
        {
            let high = (-safety.k_position * (self.position - safety.soft_upper_limit))
                .min(max_velocity)
                .max(-max_velocity);
            let low = (-safety.k_position * (self.position - safety.soft_lower_limit))
                .max(-max_velocity)
                .min(max_velocity);
            (low, high)
        } else {
            (-max_velocity, max_velocity)
        };

        let max_effort = limits.effort;
        let effort_high = (-safety.k_velocity * (self.velocity - vel_high))
            .min(max_effort)
            .max(-max_effort);
        let effort_low = (-safety.k_velocity * (self.velocity - vel_low))
            .max(-max_effort)
            .min(max_effort);

        Some((effort_low, effort_high))
    }

    /// 按限位收紧指令力矩
    ///
    /// 只修改 `commanded_effort`，重复调用结果不变。
    pub fn enforce_limits(&mut self) {
        let Some((low, high)) = self.effort_limits() else {
            self.limit_status = LimitStatus::Unlimited;
            return;
        };

        let requested = self.commanded_effort;
        let applied = requested.max(low).min(high);
        self.commanded_effort = applied;
        self.limit_status = if applied == requested {
            LimitStatus::WithinLimits
        } else {
            LimitStatus::Clamped { requested, applied }
        };
    }

    /// 用当前测量值更新统计
    pub fn update_statistics(&mut self) {
        let limited = self.joint.is_safety_limited();
        self.statistics.update(
            self.position,
            self.velocity,
            self.measured_effort,
            self.commanded_effort,
            limited,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{JointLimits, JointType, SafetyController};

    fn limited_joint() -> Arc<Joint> {
        Arc::new(
            Joint::new("elbow", JointType::Revolute)
                .with_limits(JointLimits {
                    lower: -1.0,
                    upper: 1.0,
                    effort: 10.0,
                    velocity: 2.0,
                })
                .with_safety(SafetyController {
                    soft_lower_limit: -0.9,
                    soft_upper_limit: 0.9,
                    k_position: 20.0,
                    k_velocity: 100.0,
                }),
        )
    }

    #[test]
    fn test_unlimited_joint_not_clamped() {
        let mut js = JointState::new(Arc::new(Joint::new("free", JointType::Continuous)));
        js.commanded_effort = 1e6;
        js.enforce_limits();
        assert_eq!(js.commanded_effort, 1e6);
        assert_eq!(js.limit_status(), LimitStatus::Unlimited);
        assert!(js.effort_limits().is_none());
    }

    #[test]
    fn test_effort_clamped_to_limit() {
        let mut js = JointState::new(limited_joint());
        js.commanded_effort = 50.0;
        js.enforce_limits();
        assert_eq!(js.commanded_effort, 10.0);
        assert_eq!(
            js.limit_status(),
            LimitStatus::Clamped {
                requested: 50.0,
                applied: 10.0
            }
        );

        js.commanded_effort = -50.0;
        js.enforce_limits();
        assert_eq!(js.commanded_effort, -10.0);
    }

    #[test]
    fn test_within_limits() {
        let mut js = JointState::new(limited_joint());
        js.commanded_effort = 3.0;
        js.enforce_limits();
        assert_eq!(js.commanded_effort, 3.0);
        assert_eq!(js.limit_status(), LimitStatus::WithinLimits);
    }

    #[test]
    fn test_enforce_limits_idempotent() {
        let mut js = JointState::new(limited_joint());
        js.calibrated = true;
        js.position = 0.95;
        js.velocity = 0.5;
        js.commanded_effort = 8.0;

        js.enforce_limits();
        let once = js.commanded_effort;
        js.enforce_limits();
        assert_eq!(js.commanded_effort, once);
        assert_eq!(js.position, 0.95);
        assert_eq!(js.velocity, 0.5);
    }

    #[test]
    fn test_soft_limit_only_when_calibrated() {
        let mut js = JointState::new(limited_joint());
        js.position = 0.95;

        // 未校准：只按速度限位
        let (_, high) = js.effort_limits().unwrap();
        assert_eq!(high, 10.0);

        // 已校准且越过软上限：允许速度 = -20 * 0.05 = -1.0，静止时上限力矩为 -100
        js.calibrated = true;
        let (_, high) = js.effort_limits().unwrap();
        assert_eq!(high, -10.0);
    }

    #[test]
    fn test_velocity_bound() {
        let mut js = JointState::new(limited_joint());
        // 速度已达上限，不允许继续加速
        js.velocity = 2.0;
        let (low, high) = js.effort_limits().unwrap();
        assert_eq!(high, 0.0);
        assert_eq!(low, -10.0);
    }

    #[test]
    fn test_statistics_update() {
        let mut stats = JointStatistics::default();
        stats.update(1.0, 0.5, 2.0, 0.0, false);
        assert!(stats.is_initialized());
        assert_eq!(stats.odometer, 0.0);
        assert_eq!(stats.min_position, 1.0);
        assert_eq!(stats.max_position, 1.0);

        stats.update(0.5, -3.0, -4.0, 0.0, false);
        stats.update(2.0, 1.0, 1.0, 0.0, false);
        assert_eq!(stats.odometer, 2.0);
        assert_eq!(stats.min_position, 0.5);
        assert_eq!(stats.max_position, 2.0);
        assert_eq!(stats.max_abs_velocity, 3.0);
        assert_eq!(stats.max_abs_effort, 4.0);
        assert!(!stats.violated_limits);
    }

    #[test]
    fn test_statistics_violation_only_for_limited_joints() {
        let mut stats = JointStatistics::default();
        stats.update(0.0, 0.0, 0.0, 0.0, false);
        stats.update(0.0, 0.0, 1.0, 5.0, false);
        assert!(!stats.violated_limits);

        stats.update(0.0, 0.0, 1.0, 5.0, true);
        assert!(stats.violated_limits);

        stats.reset();
        assert!(!stats.violated_limits);
        assert!(!stats.is_initialized());
    }

    #[test]
    fn test_update_statistics_from_state() {
        let mut js = JointState::new(limited_joint());
        js.position = 0.2;
        js.update_statistics();
        js.position = 0.5;
        js.measured_effort = 1.0;
        js.commanded_effort = 4.0;
        js.update_statistics();

        assert!((js.statistics.odometer - 0.3).abs() < 1e-12);
        assert!(js.statistics.violated_limits);
        assert_eq!(js.name(), "elbow");
    }
}
