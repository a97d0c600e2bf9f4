//! 自动装配候选解析
//!
//! 判断组件能否满足依赖描述，以及在多个候选之间选出唯一的组件。
//! 这里只读取元数据，不创建任何实例，构造过程中重入调用是安全的。

use crate::definition_store::DefinitionStore;
use crate::dependency_types::DependencyTypeRegistry;
use crate::freeze::ConfigurationFreezeController;
use di_abstractions::{AutowireCandidate, ComponentLookup, DependencyDescriptor, MergedDefinition};
use infrastructure_common::{ComponentType, DependencyError, DependencyResult, TypeInfo};
use std::sync::Arc;
use tracing::{debug, warn};

/// 自动装配候选解析器
///
/// 借用注册表内部状态，按需在每次查询时创建
pub struct AutowireCandidateResolver<'a> {
    store: &'a DefinitionStore,
    dependency_types: &'a DependencyTypeRegistry,
    metadata: &'a ConfigurationFreezeController,
    parent: Option<&'a dyn ComponentLookup>,
}

impl<'a> AutowireCandidateResolver<'a> {
    pub fn new(
        store: &'a DefinitionStore,
        dependency_types: &'a DependencyTypeRegistry,
        metadata: &'a ConfigurationFreezeController,
        parent: Option<&'a dyn ComponentLookup>,
    ) -> Self {
        Self {
            store,
            dependency_types,
            metadata,
            parent,
        }
    }

    /// 判断指定组件能否满足依赖
    ///
    /// 本地定义优先；本地没有定义也不是手动单例时，完全交给祖先注册表回答
    pub fn is_autowire_candidate(
        &self,
        name: &str,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<bool> {
        if self.store.contains(name) {
            let merged = self.merged_definition(name)?;
            return Ok(self.definition_matches(&merged, descriptor));
        }

        if let Some(component_type) = self.store.manual_singleton_type(name) {
            return Ok(self.manual_singleton_matches(name, &component_type, descriptor));
        }

        match self.parent {
            Some(parent) => {
                debug!("组件 {} 不在本地注册表, 委托祖先判断候选资格", name);
                parent.is_autowire_candidate(name, descriptor)
            }
            None => Err(DependencyError::no_such_definition(name)),
        }
    }

    /// 本地所有满足依赖的组件名称：定义在前，手动单例在后
    ///
    /// 无法合并的定义被跳过，不影响其他组件
    pub fn candidate_names(&self, descriptor: &DependencyDescriptor) -> DependencyResult<Vec<String>> {
        let mut names = Vec::new();
        for name in &self.store.names() {
            let matched = match self.store.manual_singleton_type(name) {
                Some(component_type) if !self.store.contains(name) => {
                    self.manual_singleton_matches(name, &component_type, descriptor)
                }
                _ => self
                    .listed_merged_definition(name)?
                    .is_some_and(|merged| self.definition_matches(&merged, descriptor)),
            };
            if matched {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// 查找全部候选：可解析依赖覆盖在前，其次是本地组件名称
    ///
    /// 覆盖值在这里即被解析，提供者会被调用
    pub fn find_autowire_candidates(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<Vec<AutowireCandidate>> {
        let mut candidates = Vec::new();
        for value in self.dependency_types.find_overrides(&descriptor.dependency_type) {
            candidates.push(AutowireCandidate::Resolvable(value.resolve()?));
        }
        for name in self.candidate_names(descriptor)? {
            candidates.push(AutowireCandidate::Named(name));
        }
        Ok(candidates)
    }

    /// 从候选名称中选出唯一的组件
    ///
    /// 只有一个候选时直接返回；多个候选时依次按首选标记和最高优先级裁决。
    /// 没有候选时必选依赖返回 `NoSuchDefinition`，可选依赖返回 `None`。
    pub fn determine_candidate_name(
        &self,
        descriptor: &DependencyDescriptor,
        names: &[String],
    ) -> DependencyResult<Option<String>> {
        match names {
            [] if descriptor.required => Err(DependencyError::no_such_definition(
                descriptor.dependency_type.name.clone(),
            )),
            [] => Ok(None),
            [only] => Ok(Some(only.clone())),
            _ => {
                let mut primary = Vec::new();
                let mut ranked = Vec::new();
                for name in names {
                    if let Some(merged) = self.local_merged_definition(name)? {
                        if merged.primary {
                            primary.push(name);
                        }
                        if let Some(priority) = merged.priority {
                            ranked.push((priority, name));
                        }
                    }
                }

                match primary.as_slice() {
                    [winner] => return Ok(Some((*winner).clone())),
                    [] => {}
                    several => {
                        return Err(DependencyError::NoUniqueDefinition {
                            type_name: descriptor.dependency_type.name.clone(),
                            candidates: several.iter().map(|name| (*name).clone()).collect(),
                        })
                    }
                }

                if let Some(highest) = ranked.iter().map(|(priority, _)| *priority).max() {
                    let top: Vec<&String> = ranked
                        .iter()
                        .filter(|(priority, _)| *priority == highest)
                        .map(|(_, name)| *name)
                        .collect();
                    if let [winner] = top.as_slice() {
                        return Ok(Some((*winner).clone()));
                    }
                }

                Err(DependencyError::NoUniqueDefinition {
                    type_name: descriptor.dependency_type.name.clone(),
                    candidates: names.to_vec(),
                })
            }
        }
    }

    /// 按类型列出本地组件名称，不考虑候选标记和限定符
    pub fn names_for_type(
        &self,
        requested: &TypeInfo,
        include_non_singletons: bool,
    ) -> DependencyResult<Vec<String>> {
        let mut names = Vec::new();
        for name in &self.store.names() {
            if self.store.contains(name) {
                let Some(merged) = self.listed_merged_definition(name)? else {
                    continue;
                };
                if merged.abstract_definition {
                    continue;
                }
                if !include_non_singletons && !merged.lifetime.is_singleton() {
                    continue;
                }
                if merged
                    .exposed_type()
                    .is_some_and(|exposed| exposed.is_assignable_to(requested))
                {
                    names.push(name.to_string());
                }
            } else if self
                .store
                .manual_singleton_type(name)
                .is_some_and(|component_type| component_type.is_assignable_to(requested))
            {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn merged_definition(&self, name: &str) -> DependencyResult<Arc<MergedDefinition>> {
        self.metadata.get_merged_definition(name, self.store, self.parent)
    }

    /// 遍历名称时使用：定义无法合并或已被并发移除时返回 `None`
    fn listed_merged_definition(
        &self,
        name: &str,
    ) -> DependencyResult<Option<Arc<MergedDefinition>>> {
        match self.merged_definition(name) {
            Ok(merged) => Ok(Some(merged)),
            Err(DependencyError::InvalidDefinition { name: broken, message }) => {
                warn!("跳过无法合并的组件定义 {}: {}", broken, message);
                Ok(None)
            }
            Err(err) if err.is_no_such_definition() && !self.store.contains(name) => {
                debug!("组件定义 {} 在遍历期间被移除", name);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn local_merged_definition(
        &self,
        name: &str,
    ) -> DependencyResult<Option<Arc<MergedDefinition>>> {
        if self.store.contains(name) {
            self.merged_definition(name).map(Some)
        } else {
            Ok(None)
        }
    }

    fn definition_matches(&self, merged: &MergedDefinition, descriptor: &DependencyDescriptor) -> bool {
        if !merged.autowire_candidate || merged.abstract_definition {
            return false;
        }
        let Some(exposed) = merged.exposed_type() else {
            return false;
        };
        if !self.type_matches(exposed, &descriptor.dependency_type) {
            return false;
        }
        descriptor
            .qualifier
            .as_deref()
            .map_or(true, |qualifier| merged.matches_qualifier(qualifier))
    }

    fn manual_singleton_matches(
        &self,
        name: &str,
        component_type: &ComponentType,
        descriptor: &DependencyDescriptor,
    ) -> bool {
        self.type_matches(component_type, &descriptor.dependency_type)
            && descriptor
                .qualifier
                .as_deref()
                .map_or(true, |qualifier| qualifier == name)
    }

    /// 请求类型被排除或组件具体类型被忽略时永不匹配
    fn type_matches(&self, exposed: &ComponentType, requested: &TypeInfo) -> bool {
        if self.dependency_types.is_excluded(requested)
            || self.dependency_types.is_type_ignored(&exposed.type_info)
        {
            return false;
        }
        exposed.is_assignable_to(requested)
    }
}
