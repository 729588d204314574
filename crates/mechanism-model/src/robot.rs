//! 机器人模型（不可变）
//!
//! `Robot` 在加载阶段构建一次：解析描述文件、按类型名解析传动机构、由传动机构解析
//! 自己的配置块。构建完成后只读，可通过 `Arc<Robot>` 被多个 [`RobotState`](crate::RobotState)
//! 共享。
//!
//! # 错误分级
//!
//! | 情况 | 处理 |
//! |------|------|
//! | 未提供硬件接口 | `Err(ModelError::MissingHardware)` |
//! | 描述文件解析失败 | `Err(ModelError::Description)` |
//! | 类型未注册 / 构造失败 | `Err(ModelError::Resolve)`（带类型名与位置） |
//! | 缺少 type 属性 | 跳过，记录 [`ModelWarning::MissingTransmissionType`] |
//! | 传动机构配置失败 | 丢弃，记录 [`ModelWarning::SkippedTransmission`] |
//! | 没有传动机构 | 记录 [`ModelWarning::NoTransmissions`] |

use std::path::Path;
use std::time::Duration;

use mechanism_hardware::{Actuator, ActuatorId, SharedHardware};
use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};
use tracing::{error, info, warn};

use crate::description::Description;
use crate::error::{ModelError, ModelWarning};
use crate::joint::KinematicModel;
use crate::registry::TransmissionRegistry;
use crate::transmission::{LoadContext, Transmission};

/// 机器人模型
#[derive(Debug)]
pub struct Robot {
    model: KinematicModel,
    transmissions: Vec<Box<dyn Transmission>>,
    hardware: SharedHardware,
    warnings: Vec<ModelWarning>,
}

impl Robot {
    /// 从 XML 描述构建
    ///
    /// `hardware` 为 `None` 时直接返回 [`ModelError::MissingHardware`]，不解析描述。
    pub fn build(
        xml: &str,
        hardware: Option<SharedHardware>,
        registry: &TransmissionRegistry,
    ) -> Result<Self, ModelError> {
        let hardware = hardware.ok_or(ModelError::MissingHardware)?;
        let description = Description::parse_str(xml)?;
        Self::from_description(description, hardware, registry)
    }

    /// 使用内置传动机构类型构建
    pub fn from_xml(xml: &str, hardware: SharedHardware) -> Result<Self, ModelError> {
        Self::build(xml, Some(hardware), &TransmissionRegistry::default())
    }

    /// 从描述文件构建
    pub fn load_file<P: AsRef<Path>>(
        path: P,
        hardware: SharedHardware,
        registry: &TransmissionRegistry,
    ) -> Result<Self, ModelError> {
        let description = Description::load_file(path)?;
        Self::from_description(description, hardware, registry)
    }

    /// 从已解析的描述构建
    pub fn from_description(
        description: Description,
        hardware: SharedHardware,
        registry: &TransmissionRegistry,
    ) -> Result<Self, ModelError> {
        let Description {
            model,
            transmissions: blocks,
        } = description;

        let mut transmissions: Vec<Box<dyn Transmission>> = Vec::with_capacity(blocks.len());
        let mut warnings = Vec::new();

        {
            let hw = hardware.read();
            let ctx = LoadContext::new(&model, &hw);

            for (index, block) in blocks.iter().enumerate() {
                let Some(type_name) = block.type_name() else {
                    error!(
                        "Transmission #{} ('{}') has no type attribute, skipping",
                        index,
                        block.name().unwrap_or("<unnamed>")
                    );
                    warnings.push(ModelWarning::MissingTransmissionType { index });
                    continue;
                };

                let loader = registry.resolve(type_name).map_err(|source| {
                    error!(
                        "Could not resolve transmission #{} of type '{}': {}",
                        index, type_name, source
                    );
                    ModelError::Resolve {
                        index,
                        type_name: type_name.to_string(),
                        source,
                    }
                })?;

                let loaded = loader
                    .load(&block.element, &ctx)
                    .and_then(|t| ctx.validate(t.as_ref()).map(|()| t));

                match loaded {
                    Ok(t) => transmissions.push(t),
                    Err(e) => {
                        warn!(
                            "Failed to initialize transmission #{} of type '{}': {}",
                            index, type_name, e
                        );
                        warnings.push(ModelWarning::SkippedTransmission {
                            index,
                            type_name: type_name.to_string(),
                            error: e,
                        });
                    },
                }
            }
        }

        if blocks.is_empty() {
            warn!("{}", ModelWarning::NoTransmissions);
            warnings.push(ModelWarning::NoTransmissions);
        }

        info!(
            "Loaded robot '{}': {} joints, {} of {} transmissions",
            model.name(),
            model.joints().len(),
            transmissions.len(),
            blocks.len()
        );

        Ok(Self {
            model,
            transmissions,
            hardware,
            warnings,
        })
    }

    /// 全部传动机构（声明顺序，不含被跳过的）
    pub fn transmissions(&self) -> &[Box<dyn Transmission>] {
        &self.transmissions
    }

    /// 按名称查找传动机构的位置（线性查找，返回第一个匹配）
    pub fn transmission_index(&self, name: &str) -> Option<usize> {
        self.transmissions.iter().position(|t| t.name() == name)
    }

    /// 按名称查找传动机构
    pub fn transmission(&self, name: &str) -> Option<&dyn Transmission> {
        self.transmission_index(name)
            .map(|i| self.transmissions[i].as_ref())
    }

    /// 按名称解析执行器句柄
    pub fn actuator_id(&self, name: &str) -> Option<ActuatorId> {
        self.hardware.read().actuator_id(name)
    }

    /// 按名称读取执行器（持有硬件读锁直到守卫释放）
    pub fn actuator(&self, name: &str) -> Option<MappedRwLockReadGuard<'_, Actuator>> {
        RwLockReadGuard::try_map(self.hardware.read(), |hw| hw.actuator(name)).ok()
    }

    /// 共享硬件句柄
    pub fn hardware(&self) -> &SharedHardware {
        &self.hardware
    }

    /// 运动学模型
    pub fn kinematic_model(&self) -> &KinematicModel {
        &self.model
    }

    /// 当前硬件时间
    pub fn time(&self) -> Duration {
        self.hardware.read().current_time()
    }

    /// 构建期间产生的警告
    pub fn warnings(&self) -> &[ModelWarning] {
        &self.warnings
    }
}
