//! 组件定义存储
//!
//! 名称到定义的权威映射，以及没有定义支撑的手动注册单例名称

use di_abstractions::{ComponentDefinition, ComponentNames, DefinitionHandle};
use infrastructure_common::{ComponentType, DependencyError, DependencyResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct StoreInner {
    definitions: HashMap<String, DefinitionHandle>,
    /// 按注册顺序排列，写时复制，读者持有的快照不受后续修改影响
    definition_names: Arc<Vec<String>>,
    manual_singleton_names: Vec<String>,
    manual_singleton_types: HashMap<String, ComponentType>,
}

/// 组件定义存储
///
/// 所有状态由一把锁保护，读者不会看到只更新了一半的映射和名称列表
#[derive(Debug, Default)]
pub struct DefinitionStore {
    inner: RwLock<StoreInner>,
}

impl DefinitionStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册定义，返回被覆盖的旧定义
    pub fn register(
        &self,
        name: &str,
        definition: ComponentDefinition,
        allow_overriding: bool,
    ) -> DependencyResult<Option<DefinitionHandle>> {
        definition.validate(name)?;

        let mut inner = self.inner.write();
        let handle = Arc::new(RwLock::new(definition));
        if inner.definitions.contains_key(name) {
            if !allow_overriding {
                return Err(DependencyError::DefinitionOverrideNotAllowed {
                    name: name.to_string(),
                });
            }
            info!("覆盖组件定义: {}", name);
            return Ok(inner.definitions.insert(name.to_string(), handle));
        }

        debug!("注册组件定义: {}", name);
        inner.definitions.insert(name.to_string(), handle);
        Arc::make_mut(&mut inner.definition_names).push(name.to_string());
        Ok(None)
    }

    /// 移除定义
    pub fn remove(&self, name: &str) -> DependencyResult<DefinitionHandle> {
        let mut inner = self.inner.write();
        let handle = inner
            .definitions
            .remove(name)
            .ok_or_else(|| DependencyError::no_such_definition(name))?;
        Arc::make_mut(&mut inner.definition_names).retain(|n| n != name);
        debug!("移除组件定义: {}", name);
        Ok(handle)
    }

    /// 获取原始定义句柄
    pub fn get(&self, name: &str) -> DependencyResult<DefinitionHandle> {
        self.inner
            .read()
            .definitions
            .get(name)
            .cloned()
            .ok_or_else(|| DependencyError::no_such_definition(name))
    }

    /// 是否存在定义
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().definitions.contains_key(name)
    }

    /// 定义数量
    pub fn len(&self) -> usize {
        self.inner.read().definitions.len()
    }

    /// 是否没有定义
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 定义名称快照
    pub fn definition_names(&self) -> Arc<Vec<String>> {
        self.inner.read().definition_names.clone()
    }

    /// 记录手动注册的单例名称和类型
    pub fn add_manual_singleton(&self, name: &str, component_type: ComponentType) {
        let mut inner = self.inner.write();
        if !inner.manual_singleton_names.iter().any(|n| n == name) {
            inner.manual_singleton_names.push(name.to_string());
        }
        inner
            .manual_singleton_types
            .insert(name.to_string(), component_type);
    }

    /// 手动注册单例的类型
    pub fn manual_singleton_type(&self, name: &str) -> Option<ComponentType> {
        self.inner.read().manual_singleton_types.get(name).cloned()
    }

    /// 是否为手动注册的单例
    pub fn is_manual_singleton(&self, name: &str) -> bool {
        self.inner.read().manual_singleton_types.contains_key(name)
    }

    /// 仅手动注册（没有同名定义）的单例数量
    pub fn manual_only_count(&self) -> usize {
        let inner = self.inner.read();
        inner
            .manual_singleton_names
            .iter()
            .filter(|name| !inner.definitions.contains_key(*name))
            .count()
    }

    /// 清除所有手动注册的单例名称
    pub fn clear_manual_singletons(&self) {
        let mut inner = self.inner.write();
        inner.manual_singleton_names.clear();
        inner.manual_singleton_types.clear();
    }

    /// 统一名称视图
    pub fn names(&self) -> ComponentNames {
        let inner = self.inner.read();
        ComponentNames::new(inner.definition_names.clone(), &inner.manual_singleton_names)
    }
}
