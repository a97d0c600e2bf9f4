//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置验证失败: {message}")]
    ValidationError { message: String },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件定义不存在: {name}")]
    NoSuchDefinition { name: String },

    #[error("存在多个候选组件: {type_name}, 候选: {candidates:?}")]
    NoUniqueDefinition {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("组件创建失败: {name}, 原因: {source}")]
    ConstructionFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("不允许覆盖组件定义: {name}")]
    DefinitionOverrideNotAllowed { name: String },

    #[error("组件定义无效: {name}, 原因: {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("单例已存在: {name}")]
    SingletonAlreadyRegistered { name: String },

    #[error("依赖解析深度超出限制: {name}, 最大深度: {max_depth}")]
    ResolutionDepthExceeded { name: String, max_depth: usize },

    #[error("组件类型不匹配: {name}, 期望类型: {expected}")]
    TypeMismatch { name: String, expected: String },
}

impl DependencyError {
    /// 创建组件定义不存在错误
    pub fn no_such_definition(name: impl Into<String>) -> Self {
        Self::NoSuchDefinition { name: name.into() }
    }

    /// 创建组件创建失败错误
    pub fn construction_failed(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConstructionFailed {
            name: name.into(),
            source: source.into(),
        }
    }

    /// 创建组件定义无效错误
    pub fn invalid_definition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 是否为组件定义不存在错误
    pub fn is_no_such_definition(&self) -> bool {
        matches!(self, Self::NoSuchDefinition { .. })
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
