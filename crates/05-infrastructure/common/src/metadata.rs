//! 元数据定义
//!
//! 提供组件类型及其可赋值关系的元数据

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 以 `TypeId` 作为身份，名称只用于日志和错误信息。
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息，`T` 可以是 `dyn Trait`
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full_name = std::any::type_name::<T>();
        Self {
            name: full_name
                .split("::")
                .last()
                .unwrap_or(full_name)
                .to_string(),
            id: TypeId::of::<T>(),
            module_path: full_name.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module_path)
    }
}

/// 组件对外暴露的类型
///
/// 由具体类型和它可以赋值给的能力类型（通常是 `dyn Trait`）组成。
/// Rust 没有继承关系，可赋值关系需要在注册时显式声明。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentType {
    /// 具体类型
    pub type_info: TypeInfo,
    /// 可赋值的能力类型
    pub capabilities: Vec<TypeInfo>,
}

impl ComponentType {
    /// 创建组件类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            capabilities: Vec::new(),
        }
    }

    /// 声明组件可以作为 `C` 注入
    pub fn with_capability<C: ?Sized + 'static>(mut self) -> Self {
        let capability = TypeInfo::of::<C>();
        if capability != self.type_info && !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// 请求类型 `requested` 能否由此类型满足
    pub fn is_assignable_to(&self, requested: &TypeInfo) -> bool {
        self.type_info == *requested || self.capabilities.contains(requested)
    }

    /// 所有暴露的类型，具体类型在前
    pub fn exposed_types(&self) -> impl Iterator<Item = &TypeInfo> {
        std::iter::once(&self.type_info).chain(self.capabilities.iter())
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}
    trait Unrelated {}
    struct English;

    #[test]
    fn test_type_info_identity_is_type_id() {
        assert_eq!(TypeInfo::of::<English>(), TypeInfo::of::<English>());
        assert_ne!(TypeInfo::of::<English>(), TypeInfo::of::<dyn Greeter>());
        assert_eq!(TypeInfo::of::<English>().short_name(), "English");
    }

    #[test]
    fn test_component_type_assignability() {
        let component_type = ComponentType::of::<English>().with_capability::<dyn Greeter>();

        assert!(component_type.is_assignable_to(&TypeInfo::of::<English>()));
        assert!(component_type.is_assignable_to(&TypeInfo::of::<dyn Greeter>()));
        assert!(!component_type.is_assignable_to(&TypeInfo::of::<dyn Unrelated>()));
        assert_eq!(component_type.exposed_types().count(), 2);
    }

    #[test]
    fn test_duplicate_capability_is_ignored() {
        let component_type = ComponentType::of::<English>()
            .with_capability::<dyn Greeter>()
            .with_capability::<dyn Greeter>()
            .with_capability::<English>();
        assert_eq!(component_type.capabilities.len(), 1);
    }
}
