//! 注册表配置与统计

use infrastructure_common::{ConfigError, ConfigSection, Configurable};
use serde::{Deserialize, Serialize};

/// 注册表配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 是否允许以相同名称覆盖已注册的定义
    pub allow_definition_overriding: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_definition_overriding: true,
            max_resolution_depth: 100,
        }
    }
}

impl RegistryConfig {
    /// 从配置节绑定，路径为 [`RegistryConfig::get_config_path`]
    pub fn from_section(section: &ConfigSection) -> Result<Self, ConfigError> {
        let config: Self = section.bind_path(Self::get_config_path())?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Configurable for RegistryConfig {
    type Config = RegistryConfig;

    fn configure(&mut self, config: Self::Config) -> Result<(), ConfigError> {
        config.validate()?;
        *self = config;
        Ok(())
    }

    fn get_config_path() -> &'static str {
        "container.registry"
    }
}

/// 注册表统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// 已注册定义数量
    pub definitions: usize,
    /// 仅手动注册的单例数量
    pub manual_singletons: usize,
    /// 活跃单例数量（含手动注册）
    pub active_singletons: usize,
    /// 已缓存的合并定义数量
    pub cached_merged_definitions: usize,
    /// 配置是否已冻结
    pub frozen: bool,
}
