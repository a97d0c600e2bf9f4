//! 配置冻结控制器
//!
//! 维护冻结标记和合并定义缓存。冻结后定义名称快照可以直接信任；
//! 任何定义变更都必须清除缓存，已创建组件的缓存条目保留。

use crate::definition_store::DefinitionStore;
use dashmap::DashMap;
use di_abstractions::{ComponentLookup, MergedDefinition};
use infrastructure_common::{DependencyError, DependencyResult};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 配置冻结控制器
#[derive(Debug, Default)]
pub struct ConfigurationFreezeController {
    frozen: AtomicBool,
    frozen_names: RwLock<Option<Arc<Vec<String>>>>,
    merged_definitions: DashMap<String, Arc<MergedDefinition>>,
    already_created: RwLock<HashSet<String>>,
}

impl ConfigurationFreezeController {
    /// 创建未冻结的控制器
    pub fn new() -> Self {
        Self::default()
    }

    /// 冻结配置并记录当前定义名称快照，可重复调用
    pub fn freeze(&self, definition_names: Arc<Vec<String>>) {
        self.clear_metadata_cache();
        *self.frozen_names.write() = Some(definition_names);
        if !self.frozen.swap(true, Ordering::SeqCst) {
            info!("组件注册表配置已冻结");
        }
    }

    /// 是否已冻结
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// 冻结时记录的定义名称快照
    pub fn frozen_names(&self) -> Option<Arc<Vec<String>>> {
        if self.is_frozen() {
            self.frozen_names.read().clone()
        } else {
            None
        }
    }

    /// 冻结后定义发生变化，名称快照失效
    pub fn invalidate_frozen_names(&self) {
        *self.frozen_names.write() = None;
    }

    /// 清除尚未创建组件的合并定义
    pub fn clear_metadata_cache(&self) {
        let created = self.already_created.read();
        let before = self.merged_definitions.len();
        self.merged_definitions
            .retain(|name, _| created.contains(name));
        debug!(
            "清除合并定义缓存: 移除 {} 条, 保留 {} 条",
            before.saturating_sub(self.merged_definitions.len()),
            self.merged_definitions.len()
        );
    }

    /// 定义被修改或移除时调用，无论组件是否已创建都移除该条目
    pub fn reset_definition(&self, name: &str) {
        self.merged_definitions.remove(name);
        self.clear_metadata_cache();
        self.invalidate_frozen_names();
    }

    /// 标记组件已创建
    pub fn mark_created(&self, name: &str) {
        self.already_created.write().insert(name.to_string());
    }

    /// 撤销已创建标记
    pub fn unmark_created(&self, name: &str) {
        self.already_created.write().remove(name);
    }

    /// 清除所有已创建标记
    pub fn clear_created(&self) {
        self.already_created.write().clear();
    }

    /// 已缓存的合并定义数量
    pub fn cached_count(&self) -> usize {
        self.merged_definitions.len()
    }

    /// 获取合并定义，未缓存时沿父定义链推导并写入缓存
    ///
    /// 父定义在本地不存在时查询 `parent` 注册表
    pub fn get_merged_definition(
        &self,
        name: &str,
        store: &DefinitionStore,
        parent: Option<&dyn ComponentLookup>,
    ) -> DependencyResult<Arc<MergedDefinition>> {
        let mut visiting = Vec::new();
        self.merge_chain(name, store, parent, &mut visiting)
    }

    fn merge_chain(
        &self,
        name: &str,
        store: &DefinitionStore,
        parent: Option<&dyn ComponentLookup>,
        visiting: &mut Vec<String>,
    ) -> DependencyResult<Arc<MergedDefinition>> {
        let cached = self
            .merged_definitions
            .get(name)
            .map(|entry| entry.value().clone());
        if let Some(merged) = cached {
            return Ok(merged);
        }

        if visiting.iter().any(|n| n == name) {
            visiting.push(name.to_string());
            return Err(DependencyError::invalid_definition(
                name,
                format!("父定义链存在循环: {}", visiting.join(" -> ")),
            ));
        }
        visiting.push(name.to_string());

        // 复制一份，避免推导父定义时持有句柄锁
        let definition = store.get(name)?.read().clone();
        let merged = match definition.parent_name.as_deref() {
            None => MergedDefinition::root(name, &definition),
            Some(parent_name) => {
                let parent_merged = if store.contains(parent_name) {
                    self.merge_chain(parent_name, store, parent, visiting)?
                } else if let Some(ancestor) = parent {
                    ancestor.get_merged_definition(parent_name)?
                } else {
                    return Err(DependencyError::invalid_definition(
                        name,
                        format!("父定义不存在: {}", parent_name),
                    ));
                };
                MergedDefinition::merge(&parent_merged, name, &definition)
            }
        };
        visiting.pop();

        debug!("推导合并定义: {}", name);
        let merged = Arc::new(merged);
        self.merged_definitions
            .insert(name.to_string(), merged.clone());
        Ok(merged)
    }
}
