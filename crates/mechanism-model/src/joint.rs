//! 关节描述与运动学模型
//!
//! 关节描述是静态数据：由描述文件解析一次，之后以 `Arc<Joint>` 的形式被多个
//! `JointState` 共享，不再修改。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DescriptionError;

/// 关节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// 有限位的旋转关节
    Revolute,
    /// 无限位的旋转关节
    Continuous,
    /// 直线关节
    Prismatic,
    /// 固定关节
    Fixed,
    /// 6 自由度浮动关节
    Floating,
    /// 平面关节
    Planar,
}

impl JointType {
    /// 从描述文件中的类型字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "revolute" => Some(JointType::Revolute),
            "continuous" => Some(JointType::Continuous),
            "prismatic" => Some(JointType::Prismatic),
            "fixed" => Some(JointType::Fixed),
            "floating" => Some(JointType::Floating),
            "planar" => Some(JointType::Planar),
            _ => None,
        }
    }

    /// 类型字符串
    pub const fn as_str(self) -> &'static str {
        match self {
            JointType::Revolute => "revolute",
            JointType::Continuous => "continuous",
            JointType::Prismatic => "prismatic",
            JointType::Fixed => "fixed",
            JointType::Floating => "floating",
            JointType::Planar => "planar",
        }
    }

    /// 是否有位置限位
    pub const fn has_position_limits(self) -> bool {
        matches!(self, JointType::Revolute | JointType::Prismatic)
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 关节硬限位
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointLimits {
    /// 位置下限（rad 或 m）
    pub lower: f64,
    /// 位置上限（rad 或 m）
    pub upper: f64,
    /// 最大力矩（Nm 或 N）
    pub effort: f64,
    /// 最大速度（rad/s 或 m/s）
    pub velocity: f64,
}

/// 安全控制器参数
///
/// 用于在软限位附近按位置、速度收紧允许的力矩范围。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SafetyController {
    pub soft_lower_limit: f64,
    pub soft_upper_limit: f64,
    /// 位置增益：距离软限位越近，允许的速度越小
    pub k_position: f64,
    /// 速度增益：速度越接近上限，允许的力矩越小
    pub k_velocity: f64,
}

/// 关节描述
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub joint_type: JointType,
    pub parent_link: Option<String>,
    pub child_link: Option<String>,
    pub limits: Option<JointLimits>,
    pub safety: Option<SafetyController>,
}

impl Joint {
    /// 创建无限位的关节
    pub fn new(name: impl Into<String>, joint_type: JointType) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent_link: None,
            child_link: None,
            limits: None,
            safety: None,
        }
    }

    pub fn with_links(mut self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.parent_link = Some(parent.into());
        self.child_link = Some(child.into());
        self
    }

    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_safety(mut self, safety: SafetyController) -> Self {
        self.safety = Some(safety);
        self
    }

    /// 是否启用限位保护（同时具备硬限位和安全控制器）
    pub fn is_safety_limited(&self) -> bool {
        self.limits.is_some() && self.safety.is_some()
    }
}

/// 运动学模型（关节与连杆集合）
///
/// 关节按声明顺序保存，名称唯一。
#[derive(Debug, Clone, Default)]
pub struct KinematicModel {
    name: String,
    links: Vec<String>,
    joints: Vec<Arc<Joint>>,
    index: HashMap<String, usize>,
}

impl KinematicModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 机器人名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 添加连杆
    pub fn add_link(&mut self, name: impl Into<String>) {
        self.links.push(name.into());
    }

    /// 添加关节（名称重复时报错）
    pub fn add_joint(&mut self, joint: Joint) -> Result<(), DescriptionError> {
        if self.index.contains_key(&joint.name) {
            return Err(DescriptionError::DuplicateJoint(joint.name));
        }
        self.index.insert(joint.name.clone(), self.joints.len());
        self.joints.push(Arc::new(joint));
        Ok(())
    }

    /// 按名称查找关节
    pub fn joint(&self, name: &str) -> Option<&Arc<Joint>> {
        self.index.get(name).map(|&i| &self.joints[i])
    }

    /// 全部关节（声明顺序）
    pub fn joints(&self) -> &[Arc<Joint>] {
        &self.joints
    }

    /// 全部连杆（声明顺序）
    pub fn links(&self) -> &[String] {
        &self.links
    }
}
