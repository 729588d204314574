//! 传动机构
//!
//! 传动机构在执行器空间（电机）与关节空间（运动学）之间做双向换算。
//! 引擎只依赖 [`Transmission`] trait 的四个传播操作，从不关心具体的传动类型。
//!
//! # 绑定视图
//!
//! 每个传动机构只看到自己绑定的执行器和关节状态。[`Bound`] / [`BoundMut`] 是
//! "槽位索引表 + 底层存储" 的零分配视图：`view[j]` 访问第 j 个绑定对象，顺序与
//! 传动机构声明的 `actuator_names()` / `joint_names()` 一致。
//!
//! ```text
//! transmissions_in[i]  = [ActuatorId(3), ActuatorId(0)]
//!                                │              │
//! hardware.actuators() = [a0, a1, a2, a3]       │
//!                          ▲       ▲────────────┘
//!                          └── view[1]   view[0] ──▶ a3
//! ```
//!
//! # 构建
//!
//! 类型名由 [`TransmissionRegistry`](crate::TransmissionRegistry) 解析为一个
//! [`TransmissionLoader`]（未配置的实例），再由它解析 `<transmission>` 配置块，
//! 生成可用的 `Box<dyn Transmission>`。

mod differential;
mod simple;

pub use differential::{DifferentialTransmission, DifferentialTransmissionLoader};
pub use simple::{SimpleTransmission, SimpleTransmissionLoader};

use mechanism_hardware::{Actuator, ActuatorId, HardwareInterface};
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::description::Element;
use crate::error::TransmissionError;
use crate::joint::KinematicModel;
use crate::joint_state::JointState;

/// 槽位索引
///
/// 把绑定表中的条目转换为底层存储的下标。
pub trait SlotIndex: Copy {
    fn slot(self) -> usize;
}

impl SlotIndex for usize {
    #[inline]
    fn slot(self) -> usize {
        self
    }
}

impl SlotIndex for ActuatorId {
    #[inline]
    fn slot(self) -> usize {
        self.index()
    }
}

/// 只读绑定视图
pub struct Bound<'a, T, I: SlotIndex = usize> {
    slots: &'a [I],
    items: &'a [T],
}

impl<'a, T, I: SlotIndex> Bound<'a, T, I> {
    #[inline]
    pub fn new(slots: &'a [I], items: &'a [T]) -> Self {
        Self { slots, items }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&'a T> {
        let items = self.items;
        self.slots.get(index).map(|s| &items[s.slot()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let (slots, items) = (self.slots, self.items);
        slots.iter().map(move |s| &items[s.slot()])
    }
}

impl<T, I: SlotIndex> Index<usize> for Bound<'_, T, I> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.items[self.slots[index].slot()]
    }
}

/// 可写绑定视图
pub struct BoundMut<'a, T, I: SlotIndex = usize> {
    slots: &'a [I],
    items: &'a mut [T],
}

impl<'a, T, I: SlotIndex> BoundMut<'a, T, I> {
    #[inline]
    pub fn new(slots: &'a [I], items: &'a mut [T]) -> Self {
        Self { slots, items }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).map(|s| &self.items[s.slot()])
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let slot = self.slots.get(index)?.slot();
        Some(&mut self.items[slot])
    }
}

impl<T, I: SlotIndex> Index<usize> for BoundMut<'_, T, I> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.items[self.slots[index].slot()]
    }
}

impl<T, I: SlotIndex> IndexMut<usize> for BoundMut<'_, T, I> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[self.slots[index].slot()]
    }
}

/// 传动机构绑定的执行器（只读）
pub type Actuators<'a> = Bound<'a, Actuator, ActuatorId>;
/// 传动机构绑定的执行器（可写）
pub type ActuatorsMut<'a> = BoundMut<'a, Actuator, ActuatorId>;
/// 传动机构绑定的关节状态（只读）
pub type Joints<'a> = Bound<'a, JointState>;
/// 传动机构绑定的关节状态（可写）
pub type JointsMut<'a> = BoundMut<'a, JointState>;

/// 传动机构的身份与连接声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionInfo {
    pub name: String,
    pub actuator_names: Vec<String>,
    pub joint_names: Vec<String>,
}

impl TransmissionInfo {
    pub fn new<A, J>(name: impl Into<String>, actuator_names: A, joint_names: J) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        Self {
            name: name.into(),
            actuator_names: actuator_names.into_iter().map(Into::into).collect(),
            joint_names: joint_names.into_iter().map(Into::into).collect(),
        }
    }
}

/// 传动机构
///
/// 四个传播操作收到的两个视图长度分别等于 `actuator_names().len()` 和
/// `joint_names().len()`，下标顺序与声明顺序一致。
///
/// # 实时约束
///
/// 四个传播操作在控制循环中每周期调用，禁止阻塞、禁止分配内存。
/// 同一个实例被多个 `RobotState` 共享（`&self`），需要跨周期记忆的类型自行使用内部可变性。
pub trait Transmission: fmt::Debug + Send + Sync {
    /// 身份与连接声明
    fn info(&self) -> &TransmissionInfo;

    /// 执行器位置/速度/力矩 → 关节位置/速度/力矩
    fn propagate_position(&self, actuators: Actuators<'_>, joints: JointsMut<'_>);

    /// 关节指令力矩 → 执行器指令力矩
    fn propagate_effort(&self, joints: Joints<'_>, actuators: ActuatorsMut<'_>);

    /// 关节位置/速度/力矩 → 执行器空间估计（仿真/诊断用）
    fn propagate_position_backwards(&self, joints: Joints<'_>, actuators: ActuatorsMut<'_>);

    /// 执行器指令力矩 → 关节指令力矩
    fn propagate_effort_backwards(&self, actuators: Actuators<'_>, joints: JointsMut<'_>);

    fn name(&self) -> &str {
        &self.info().name
    }

    fn actuator_names(&self) -> &[String] {
        &self.info().actuator_names
    }

    fn joint_names(&self) -> &[String] {
        &self.info().joint_names
    }
}

/// 未配置的传动机构实例
///
/// 由注册表按类型名构造，负责解析自身的 `<transmission>` 配置块。
pub trait TransmissionLoader: Send {
    fn load(
        self: Box<Self>,
        config: &Element,
        ctx: &LoadContext<'_>,
    ) -> Result<Box<dyn Transmission>, TransmissionError>;
}

/// 传动机构解析配置时可见的上下文
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    model: &'a KinematicModel,
    hardware: &'a HardwareInterface,
}

impl<'a> LoadContext<'a> {
    pub fn new(model: &'a KinematicModel, hardware: &'a HardwareInterface) -> Self {
        Self { model, hardware }
    }

    pub fn model(&self) -> &'a KinematicModel {
        self.model
    }

    pub fn hardware(&self) -> &'a HardwareInterface {
        self.hardware
    }

    /// 检查执行器存在
    pub fn require_actuator(&self, transmission: &str, actuator: &str) -> Result<(), TransmissionError> {
        match self.hardware.actuator_id(actuator) {
            Some(_) => Ok(()),
            None => Err(TransmissionError::UnknownActuator {
                transmission: transmission.to_string(),
                actuator: actuator.to_string(),
            }),
        }
    }

    /// 检查关节存在
    pub fn require_joint(&self, transmission: &str, joint: &str) -> Result<(), TransmissionError> {
        match self.model.joint(joint) {
            Some(_) => Ok(()),
            None => Err(TransmissionError::UnknownJoint {
                transmission: transmission.to_string(),
                joint: joint.to_string(),
            }),
        }
    }

    /// 检查传动机构声明的全部执行器和关节
    pub fn validate(&self, transmission: &dyn Transmission) -> Result<(), TransmissionError> {
        for actuator in transmission.actuator_names() {
            self.require_actuator(transmission.name(), actuator)?;
        }
        for joint in transmission.joint_names() {
            self.require_joint(transmission.name(), joint)?;
        }
        Ok(())
    }
}

/// 读取 `name` 属性
pub(crate) fn transmission_name(config: &Element) -> Result<&str, TransmissionError> {
    config
        .attribute("name")
        .ok_or(TransmissionError::MissingName)
}

/// 查找带 name 属性的子元素 `<tag name="..."/>`
pub(crate) fn named_child<'e>(
    config: &'e Element,
    transmission: &str,
    tag: &'static str,
) -> Result<&'e Element, TransmissionError> {
    config
        .child(tag)
        .filter(|el| el.attribute("name").is_some())
        .ok_or_else(|| TransmissionError::MissingElement {
            transmission: transmission.to_string(),
            element: tag,
        })
}

/// 解析非零、有限的传动比
pub(crate) fn parse_reduction(
    raw: &str,
    transmission: &str,
    parameter: &'static str,
) -> Result<f64, TransmissionError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v != 0.0 => Ok(v),
        _ => Err(TransmissionError::InvalidParameter {
            transmission: transmission.to_string(),
            parameter,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_follows_slots() {
        let items = [10, 20, 30, 40];
        let slots = [3usize, 0];
        let view = Bound::new(&slots, &items);

        assert_eq!(view.len(), 2);
        assert_eq!(view[0], 40);
        assert_eq!(view[1], 10);
        assert_eq!(view.get(2), None);
        assert_eq!(view.iter().copied().collect::<Vec<_>>(), vec![40, 10]);
    }

    #[test]
    fn test_bound_mut_writes_through() {
        let mut items = [0, 0, 0];
        let slots = [2usize, 1];
        {
            let mut view = BoundMut::new(&slots, &mut items);
            view[0] = 7;
            *view.get_mut(1).unwrap() = 8;
            assert!(view.get_mut(2).is_none());
        }
        assert_eq!(items, [0, 8, 7]);
    }

    #[test]
    fn test_empty_bound() {
        let items: [u8; 0] = [];
        let view: Bound<'_, u8> = Bound::new(&[], &items);
        assert!(view.is_empty());
    }

    #[test]
    fn test_parse_reduction() {
        assert_eq!(parse_reduction(" 2.5 ", "t", "mechanicalReduction").unwrap(), 2.5);
        assert_eq!(parse_reduction("-4", "t", "mechanicalReduction").unwrap(), -4.0);
        assert!(parse_reduction("0", "t", "mechanicalReduction").is_err());
        assert!(parse_reduction("inf", "t", "mechanicalReduction").is_err());
        assert!(parse_reduction("abc", "t", "mechanicalReduction").is_err());
    }

    #[test]
    fn test_named_child() {
        let el = Element::new("transmission")
            .with_child(Element::new("joint").with_attribute("name", "j"))
            .with_child(Element::new("actuator"));

        assert!(named_child(&el, "t", "joint").is_ok());
        assert_eq!(
            named_child(&el, "t", "actuator").unwrap_err(),
            TransmissionError::MissingElement {
                transmission: "t".to_string(),
                element: "actuator"
            }
        );
    }
}
