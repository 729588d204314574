//! 传动机构类型注册表
//!
//! 把描述文件中的类型名（`<transmission type="...">`）映射到构造器。构造器每次返回一个
//! 全新的、未配置的 [`TransmissionLoader`]，由它解析自己的配置块。
//!
//! # 使用示例
//!
//! ```rust
//! use mechanism_model::TransmissionRegistry;
//! use mechanism_model::transmission::SimpleTransmissionLoader;
//!
//! let mut registry = TransmissionRegistry::with_builtins();
//! registry.register("my_vendor/Reducer", || Box::new(SimpleTransmissionLoader));
//!
//! assert!(registry.contains("simple"));
//! assert!(registry.resolve("my_vendor/Reducer").is_ok());
//! assert!(registry.resolve("bogus").is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::transmission::{
    DifferentialTransmissionLoader, SimpleTransmissionLoader, TransmissionLoader,
};

type Constructor =
    Arc<dyn Fn() -> Result<Box<dyn TransmissionLoader>, String> + Send + Sync + 'static>;

/// 传动机构类型注册表
#[derive(Clone)]
pub struct TransmissionRegistry {
    constructors: HashMap<String, Constructor>,
}

impl TransmissionRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// 创建包含内置类型的注册表
    ///
    /// - `simple`（别名 `SimpleTransmission`、`pr2_mechanism_model/SimpleTransmission`）
    /// - `differential`（别名 `DifferentialTransmission`）
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for name in [
            "simple",
            "SimpleTransmission",
            "pr2_mechanism_model/SimpleTransmission",
        ] {
            registry.register(name, || Box::new(SimpleTransmissionLoader));
        }
        for name in ["differential", "DifferentialTransmission"] {
            registry.register(name, || Box::new(DifferentialTransmissionLoader));
        }
        registry
    }

    /// 注册类型（同名覆盖）
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn TransmissionLoader> + Send + Sync + 'static,
    {
        self.register_fallible(type_name, move || Ok(constructor()));
    }

    /// 注册可能失败的构造器
    ///
    /// 构造器返回的 `Err(reason)` 会被转换为 [`RegistryError::InstantiationFailed`]。
    pub fn register_fallible<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Result<Box<dyn TransmissionLoader>, String> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        debug!("Registering transmission type '{}'", type_name);
        self.constructors.insert(type_name, Arc::new(constructor));
    }

    /// 是否已注册
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// 已注册的类型名（排序）
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// 构造一个未配置的实例
    ///
    /// 构造器 panic 时不会传播，而是返回 `InstantiationFailed`。
    pub fn resolve(&self, type_name: &str) -> Result<Box<dyn TransmissionLoader>, RegistryError> {
        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;

        match catch_unwind(AssertUnwindSafe(|| constructor())) {
            Ok(Ok(loader)) => Ok(loader),
            Ok(Err(reason)) => Err(RegistryError::InstantiationFailed {
                type_name: type_name.to_string(),
                reason,
            }),
            Err(payload) => Err(RegistryError::InstantiationFailed {
                type_name: type_name.to_string(),
                reason: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl Default for TransmissionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for TransmissionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransmissionRegistry")
            .field("types", &self.types())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "constructor panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = TransmissionRegistry::default();
        assert_eq!(
            registry.types(),
            vec![
                "DifferentialTransmission",
                "SimpleTransmission",
                "differential",
                "pr2_mechanism_model/SimpleTransmission",
                "simple",
            ]
        );
        assert!(registry.resolve("simple").is_ok());
        assert!(registry.resolve("DifferentialTransmission").is_ok());
    }

    #[test]
    fn test_unknown_type() {
        let registry = TransmissionRegistry::new();
        assert_eq!(
            registry.resolve("simple").err(),
            Some(RegistryError::UnknownType("simple".to_string()))
        );
    }

    #[test]
    fn test_fallible_constructor() {
        let mut registry = TransmissionRegistry::new();
        registry.register_fallible("broken", || Err("missing firmware".to_string()));

        match registry.resolve("broken") {
            Err(RegistryError::InstantiationFailed { type_name, reason }) => {
                assert_eq!(type_name, "broken");
                assert_eq!(reason, "missing firmware");
            }
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn test_panicking_constructor() {
        let mut registry = TransmissionRegistry::new();
        registry.register("explodes", || panic!("kaboom"));

        match registry.resolve("explodes") {
            Err(RegistryError::InstantiationFailed { reason, .. }) => {
                assert_eq!(reason, "kaboom");
            }
            other => panic!("unexpected: {:?}", other.err()),
        }
    }

    #[test]
    fn test_register_overrides() {
        let mut registry = TransmissionRegistry::with_builtins();
        registry.register_fallible("simple", || Err("disabled".to_string()));
        assert!(registry.resolve("simple").is_err());
        assert!(registry.resolve("SimpleTransmission").is_ok());
        assert!(format!("{:?}", registry).contains("differential"));
    }
}
