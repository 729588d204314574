//! 模型层错误类型定义
//!
//! 两种严重级别：
//! - **Fatal**：模型无法构建（[`ModelError`]）
//! - **Warning**：模型可用但有降级（[`ModelWarning`]），构建成功后以值的形式返回，同时写入日志

use mechanism_hardware::HardwareError;
use std::path::PathBuf;
use thiserror::Error;

/// 错误严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// 模型无法使用
    Fatal,
    /// 模型可用但有降级
    Warning,
}

/// 机器人描述文件解析错误
#[derive(Error, Debug)]
pub enum DescriptionError {
    /// 读取文件失败
    #[error("Failed to read robot description {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML 格式错误
    #[error("Malformed robot description XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// 根元素不是 `<robot>`
    #[error("Robot description root element must be <robot>, found <{0}>")]
    InvalidRoot(String),

    /// 缺少必需属性
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// 数值属性无法解析
    #[error("Invalid number for <{element}> attribute '{attribute}': '{value}'")]
    InvalidNumber {
        element: String,
        attribute: &'static str,
        value: String,
    },

    /// 未知的关节类型
    #[error("Unknown type '{joint_type}' for joint '{joint}'")]
    UnknownJointType { joint: String, joint_type: String },

    /// 关节名称重复
    #[error("Duplicate joint name: {0}")]
    DuplicateJoint(String),
}

/// 传动机构配置错误
///
/// 由具体传动机构解析自身配置时返回。该错误可恢复：对应的传动机构被丢弃，模型构建继续。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransmissionError {
    /// 缺少 name 属性
    #[error("Transmission is missing a name")]
    MissingName,

    /// 缺少必需的子元素
    #[error("Transmission '{transmission}' is missing <{element}>")]
    MissingElement {
        transmission: String,
        element: &'static str,
    },

    /// 参数无效
    #[error("Transmission '{transmission}' has invalid {parameter}: '{value}'")]
    InvalidParameter {
        transmission: String,
        parameter: &'static str,
        value: String,
    },

    /// 引用了不存在的执行器
    #[error("Transmission '{transmission}' references unknown actuator '{actuator}'")]
    UnknownActuator {
        transmission: String,
        actuator: String,
    },

    /// 引用了不存在的关节
    #[error("Transmission '{transmission}' references unknown joint '{joint}'")]
    UnknownJoint { transmission: String, joint: String },
}

/// 传动机构类型解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 类型未注册
    #[error("Unknown transmission type: {0}")]
    UnknownType(String),

    /// 构造器失败或 panic
    #[error("Could not construct transmission of type {type_name}: {reason}")]
    InstantiationFailed { type_name: String, reason: String },
}

/// 模型构建的致命错误
#[derive(Error, Debug)]
pub enum ModelError {
    /// 未提供硬件接口
    #[error("Mechanism model received an invalid hardware interface")]
    MissingHardware,

    /// 描述文件解析失败
    #[error("Failed to parse the robot description: {0}")]
    Description(#[from] DescriptionError),

    /// 传动机构类型无法解析或实例化
    #[error("Transmission #{index} of type '{type_name}' could not be resolved: {source}")]
    Resolve {
        index: usize,
        type_name: String,
        #[source]
        source: RegistryError,
    },
}

impl ModelError {
    /// 严重级别（始终为 Fatal）
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

/// 模型构建的非致命警告
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelWarning {
    /// 传动机构未声明类型，已跳过
    #[error("Transmission #{index} has no type attribute and was skipped")]
    MissingTransmissionType { index: usize },

    /// 传动机构配置失败，已丢弃
    #[error("Transmission #{index} of type '{type_name}' failed to initialize: {error}")]
    SkippedTransmission {
        index: usize,
        type_name: String,
        error: TransmissionError,
    },

    /// 描述文件中没有传动机构
    #[error("No transmissions were specified in the robot description")]
    NoTransmissions,

    /// 没有任何关节连接到电机
    #[error("None of the joints in the robot description matches up to a motor; the robot is uncontrollable")]
    NoJointStates,
}

impl ModelWarning {
    /// 严重级别（始终为 Warning）
    pub fn severity(&self) -> Severity {
        Severity::Warning
    }
}

/// 配置文件错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写文件失败
    #[error("Config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 配置值无效
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// 构建硬件接口失败
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}
