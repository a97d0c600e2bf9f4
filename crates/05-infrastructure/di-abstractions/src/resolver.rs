//! 依赖描述与自动装配候选
//!
//! 描述一次依赖请求以及候选查找的结果

use infrastructure_common::{ComponentInstance, TypeInfo};
use std::fmt;

/// 依赖描述符
///
/// 每次解析时创建，不会被注册表保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    /// 请求的类型或能力
    pub dependency_type: TypeInfo,
    /// 声明依赖的位置，例如 `OrderService.repository`
    pub declaring_site: Option<String>,
    /// 是否必需
    pub required: bool,
    /// 限定符
    pub qualifier: Option<String>,
}

impl DependencyDescriptor {
    /// 创建必需依赖描述符
    pub fn new(dependency_type: TypeInfo) -> Self {
        Self {
            dependency_type,
            declaring_site: None,
            required: true,
            qualifier: None,
        }
    }

    /// 为类型 `T` 创建必需依赖描述符，`T` 可以是 `dyn Trait`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>())
    }

    /// 设置为可选依赖
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 设置声明位置
    pub fn declared_by(mut self, site: impl Into<String>) -> Self {
        self.declaring_site = Some(site.into());
        self
    }
}

impl fmt::Display for DependencyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dependency_type)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, " @{}", qualifier)?;
        }
        if let Some(site) = &self.declaring_site {
            write!(f, " (声明于 {})", site)?;
        }
        Ok(())
    }
}

/// 自动装配候选
#[derive(Clone)]
pub enum AutowireCandidate {
    /// 由可解析依赖覆盖直接提供的值
    Resolvable(ComponentInstance),
    /// 注册表中的组件名称
    Named(String),
}

impl AutowireCandidate {
    /// 候选名称（覆盖值没有名称）
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Resolvable(_) => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl fmt::Debug for AutowireCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolvable(_) => f.write_str("Resolvable(<instance>)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Repository {}

    #[test]
    fn test_descriptor_display_includes_declaring_site() {
        let descriptor = DependencyDescriptor::of::<dyn Repository>()
            .with_qualifier("primary_db")
            .declared_by("OrderService.repository");

        assert!(descriptor.required);
        assert_eq!(descriptor.declaring_site.as_deref(), Some("OrderService.repository"));
        let rendered = descriptor.to_string();
        assert!(rendered.ends_with(" @primary_db (声明于 OrderService.repository)"));
        assert!(rendered.starts_with(&TypeInfo::of::<dyn Repository>().to_string()));
    }

    #[test]
    fn test_named_candidate_has_name() {
        assert_eq!(AutowireCandidate::Named("clock".to_string()).name(), Some("clock"));
        let value: ComponentInstance = std::sync::Arc::new(1_u8);
        assert_eq!(AutowireCandidate::Resolvable(value).name(), None);
    }
}
