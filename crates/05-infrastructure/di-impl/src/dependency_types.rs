//! 依赖类型注册表
//!
//! 记录自动装配时需要排除的依赖类型和能力接口，以及可解析依赖覆盖

use di_abstractions::{RegistryAware, ResolvableValue};
use infrastructure_common::{ComponentType, TypeInfo};
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

/// 可解析依赖覆盖条目
#[derive(Debug, Clone)]
struct ResolvableDependency {
    dependency_type: ComponentType,
    value: ResolvableValue,
}

/// 依赖类型注册表
#[derive(Debug)]
pub struct DependencyTypeRegistry {
    ignored_types: RwLock<HashSet<TypeInfo>>,
    ignored_interfaces: RwLock<HashSet<TypeInfo>>,
    resolvable_dependencies: RwLock<Vec<ResolvableDependency>>,
}

impl DependencyTypeRegistry {
    /// 创建注册表，默认忽略 [`RegistryAware`] 能力接口
    pub fn new() -> Self {
        let mut ignored_interfaces = HashSet::new();
        ignored_interfaces.insert(TypeInfo::of::<dyn RegistryAware>());

        Self {
            ignored_types: RwLock::new(HashSet::new()),
            ignored_interfaces: RwLock::new(ignored_interfaces),
            resolvable_dependencies: RwLock::new(Vec::new()),
        }
    }

    /// 忽略依赖类型
    pub fn ignore_dependency_type(&self, dependency_type: TypeInfo) {
        debug!("忽略依赖类型: {}", dependency_type);
        self.ignored_types.write().insert(dependency_type);
    }

    /// 忽略能力接口
    pub fn ignore_dependency_interface(&self, capability: TypeInfo) {
        debug!("忽略依赖接口: {}", capability);
        self.ignored_interfaces.write().insert(capability);
    }

    /// 注册可解析依赖覆盖，同一类型重复注册时覆盖旧值
    pub fn register_resolvable_dependency(&self, dependency_type: ComponentType, value: ResolvableValue) {
        debug!("注册可解析依赖: {}", dependency_type);
        let mut entries = self.resolvable_dependencies.write();
        match entries
            .iter_mut()
            .find(|entry| entry.dependency_type.type_info == dependency_type.type_info)
        {
            Some(entry) => {
                entry.dependency_type = dependency_type;
                entry.value = value;
            }
            None => entries.push(ResolvableDependency {
                dependency_type,
                value,
            }),
        }
    }

    /// 请求类型是否被排除（忽略的类型或能力接口）
    pub fn is_excluded(&self, requested: &TypeInfo) -> bool {
        self.ignored_types.read().contains(requested)
            || self.ignored_interfaces.read().contains(requested)
    }

    /// 组件类型是否被忽略
    pub fn is_type_ignored(&self, type_info: &TypeInfo) -> bool {
        self.ignored_types.read().contains(type_info)
    }

    /// 查找能满足请求类型的覆盖值，按注册顺序返回，不调用提供者
    pub fn find_overrides(&self, requested: &TypeInfo) -> Vec<ResolvableValue> {
        self.resolvable_dependencies
            .read()
            .iter()
            .filter(|entry| entry.dependency_type.is_assignable_to(requested))
            .map(|entry| entry.value.clone())
            .collect()
    }
}

impl Default for DependencyTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
