//! 硬件接口
//!
//! `HardwareInterface` 拥有全部执行器的存储，并提供：
//! - 按名称查找执行器（仅在初始化阶段使用）
//! - 按 `ActuatorId` 的 O(1) 索引访问（控制循环热路径）
//! - 进程级的"当前时间"
//!
//! # 线程模型
//!
//! 硬件 IO 线程与控制循环通过 [`SharedHardware`]（`Arc<parking_lot::RwLock<_>>`）共享同一份
//! 执行器存储。控制循环在每个 tick 的边界获取锁：读锁期间执行器状态视为冻结快照，
//! 写锁释放即视为指令原子发布。

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::actuator::Actuator;
use crate::error::HardwareError;

/// 执行器句柄
///
/// 在初始化阶段由名称解析一次，之后作为稠密索引缓存使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorId(usize);

impl ActuatorId {
    /// 获取底层索引
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 共享硬件句柄
pub type SharedHardware = Arc<RwLock<HardwareInterface>>;

/// 硬件接口
#[derive(Debug, Default)]
pub struct HardwareInterface {
    actuators: Vec<Actuator>,
    index: HashMap<String, ActuatorId>,
    current_time: Duration,
}

impl HardwareInterface {
    /// 创建空的硬件接口
    pub fn new() -> Self {
        Self::default()
    }

    /// 由执行器列表创建（名称重复时报错）
    pub fn with_actuators<I>(actuators: I) -> Result<Self, HardwareError>
    where
        I: IntoIterator<Item = Actuator>,
    {
        let mut hw = Self::new();
        for act in actuators {
            hw.add_actuator(act)?;
        }
        Ok(hw)
    }

    /// 注册执行器
    ///
    /// 只能在控制循环启动前调用：注册会使存储扩容。
    pub fn add_actuator(&mut self, actuator: Actuator) -> Result<ActuatorId, HardwareError> {
        if self.index.contains_key(actuator.name()) {
            return Err(HardwareError::DuplicateActuator(actuator.name().to_string()));
        }

        let id = ActuatorId(self.actuators.len());
        debug!("Registered actuator '{}' as {}", actuator.name(), id);
        self.index.insert(actuator.name().to_string(), id);
        self.actuators.push(actuator);
        Ok(id)
    }

    /// 按名称解析执行器句柄
    pub fn actuator_id(&self, name: &str) -> Option<ActuatorId> {
        self.index.get(name).copied()
    }

    /// 按名称解析执行器句柄，不存在时返回错误
    pub fn resolve(&self, name: &str) -> Result<ActuatorId, HardwareError> {
        self.actuator_id(name)
            .ok_or_else(|| HardwareError::UnknownActuator(name.to_string()))
    }

    /// 按名称查找执行器
    pub fn actuator(&self, name: &str) -> Option<&Actuator> {
        self.actuator_id(name).map(|id| &self.actuators[id.0])
    }

    /// 按名称查找执行器（可变）
    pub fn actuator_mut(&mut self, name: &str) -> Option<&mut Actuator> {
        let id = self.actuator_id(name)?;
        Some(&mut self.actuators[id.0])
    }

    /// 按句柄访问
    ///
    /// # Panics
    ///
    /// 句柄不属于本接口时 panic。
    #[inline]
    pub fn get(&self, id: ActuatorId) -> &Actuator {
        &self.actuators[id.0]
    }

    /// 按句柄访问（可变）
    #[inline]
    pub fn get_mut(&mut self, id: ActuatorId) -> &mut Actuator {
        &mut self.actuators[id.0]
    }

    /// 全部执行器（注册顺序）
    #[inline]
    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    /// 全部执行器（可变，注册顺序）
    #[inline]
    pub fn actuators_mut(&mut self) -> &mut [Actuator] {
        &mut self.actuators
    }

    /// 执行器数量
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// 是否没有执行器
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    /// 当前硬件时间
    #[inline]
    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    /// 更新当前硬件时间（由硬件 IO 周期调用）
    #[inline]
    pub fn set_current_time(&mut self, time: Duration) {
        self.current_time = time;
    }

    /// 将所有执行器的指令清零
    pub fn clear_commands(&mut self) {
        for act in &mut self.actuators {
            act.clear_command();
        }
    }

    /// 包装为共享句柄
    pub fn into_shared(self) -> SharedHardware {
        Arc::new(RwLock::new(self))
    }
}
