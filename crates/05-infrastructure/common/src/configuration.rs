//! 配置相关的基础接口定义

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 可配置组件 trait
///
/// 需要配置的组件必须实现此 trait
pub trait Configurable: Send + Sync {
    /// 配置类型
    type Config: for<'de> Deserialize<'de> + Serialize + Clone + Send + Sync + 'static;

    /// 应用配置
    fn configure(&mut self, config: Self::Config) -> Result<(), ConfigError>;

    /// 获取配置路径
    fn get_config_path() -> &'static str;

    /// 获取默认配置
    fn default_config() -> Self::Config
    where
        Self::Config: Default,
    {
        Self::Config::default()
    }
}

/// 配置节
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSection {
    /// 配置数据
    pub data: HashMap<String, serde_json::Value>,
}

impl ConfigSection {
    /// 创建新的配置节
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// 插入配置项
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// 获取配置项
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// 按点号分隔的路径查找配置值，例如 `container.registry`
    pub fn get_path(&self, path: &str) -> Option<&serde_json::Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.data.get(first)?, |value, segment| value.get(segment))
    }

    /// 绑定到具体类型
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        serde_json::from_value(value).map_err(|e| ConfigError::SerializationError { source: e })
    }

    /// 将指定路径下的配置绑定到具体类型
    pub fn bind_path<T>(&self, path: &str) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self.get_path(path).ok_or_else(|| ConfigError::KeyNotFound {
            key: path.to_string(),
        })?;

        serde_json::from_value(value.clone()).map_err(|e| ConfigError::SerializationError { source: e })
    }
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self::new()
    }
}
