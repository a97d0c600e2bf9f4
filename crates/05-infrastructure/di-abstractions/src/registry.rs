//! 组件注册表抽象接口

use crate::definition::{DefinitionHandle, MergedDefinition};
use crate::factory::ResolvableValue;
use crate::resolver::DependencyDescriptor;
use infrastructure_common::{
    downcast_instance, ComponentInstance, ComponentType, DependencyResult, TypeInfo,
};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

/// 组件查询视图
///
/// 祖先注册表委托和构造协作者重入时使用的只读接口。
/// 所有方法只读取注册表元数据或已缓存的单例，可以在构造过程中安全调用。
pub trait ComponentLookup: Send + Sync {
    /// 本地是否存在组件定义（不查询祖先）
    fn contains_definition(&self, name: &str) -> bool;

    /// 本地或祖先中是否存在该名称的定义或单例
    fn contains_component(&self, name: &str) -> bool;

    /// 获取合并后的定义，本地不存在时查询祖先
    fn get_merged_definition(&self, name: &str) -> DependencyResult<Arc<MergedDefinition>>;

    /// 判断指定组件是否可以满足依赖
    ///
    /// 名称在本地和祖先中都不存在时返回 `NoSuchDefinition`
    fn is_autowire_candidate(
        &self,
        name: &str,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<bool>;

    /// 获取组件实例，必要时创建
    fn get_component(&self, name: &str) -> DependencyResult<ComponentInstance>;

    /// 解析依赖：可解析依赖覆盖优先，其次是唯一或首选的候选组件
    ///
    /// 可选依赖没有候选时返回 `Ok(None)`
    fn resolve_dependency(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<Option<ComponentInstance>>;
}

impl dyn ComponentLookup + '_ {
    /// 获取组件实例并转换为具体类型
    pub fn get_typed<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(name, self.get_component(name)?)
    }
}

/// 可配置、可枚举的组件注册表
///
/// 依赖类型排除与覆盖、自动装配候选判断、名称视图、配置冻结和单例预实例化
pub trait ConfigurableComponentRegistry: ComponentLookup {
    /// 自动装配时忽略指定依赖类型，重复调用无副作用
    fn ignore_dependency_type(&self, dependency_type: TypeInfo);

    /// 自动装配时忽略指定能力接口，重复调用无副作用
    fn ignore_dependency_interface(&self, capability: TypeInfo);

    /// 注册可解析依赖覆盖
    ///
    /// 请求类型等于 `dependency_type` 的具体类型或其声明的能力类型时，
    /// 直接解析为 `value`，不经过组件定义
    fn register_resolvable_dependency(&self, dependency_type: ComponentType, value: ResolvableValue);

    /// 获取本地组件定义的原始句柄，从不查询祖先
    fn get_definition(&self, name: &str) -> DependencyResult<DefinitionHandle>;

    /// 所有组件名称：定义名称在前，仅手动注册的单例名称在后
    fn names(&self) -> ComponentNames;

    /// 清除尚未实例化组件的合并定义缓存
    fn clear_metadata_cache(&self);

    /// 冻结配置
    fn freeze_configuration(&self);

    /// 配置是否已冻结
    fn is_configuration_frozen(&self) -> bool;

    /// 预实例化所有非延迟单例，遇到第一个失败立即返回
    fn pre_instantiate_singletons(&self) -> DependencyResult<()>;
}

/// 注册表感知标记
///
/// 默认被排除在自动装配之外的内置能力接口，
/// 需要注册表引用的组件由构造协作者显式注入
pub trait RegistryAware: Send + Sync {}

/// 组件名称视图
///
/// 基于快照，可重复遍历，有限且不含重复名称
#[derive(Debug, Clone, Default)]
pub struct ComponentNames {
    definition_names: Arc<Vec<String>>,
    manual_names: Arc<Vec<String>>,
}

impl ComponentNames {
    /// 创建名称视图，`manual_names` 中已有定义的名称会被剔除
    pub fn new(definition_names: Arc<Vec<String>>, manual_names: &[String]) -> Self {
        let defined: HashSet<&str> = definition_names.iter().map(String::as_str).collect();
        let manual_names = manual_names
            .iter()
            .filter(|name| !defined.contains(name.as_str()))
            .cloned()
            .collect();
        Self {
            definition_names,
            manual_names: Arc::new(manual_names),
        }
    }

    /// 遍历名称
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.definition_names
            .iter()
            .chain(self.manual_names.iter())
            .map(String::as_str)
    }

    /// 名称数量
    pub fn len(&self) -> usize {
        self.definition_names.len() + self.manual_names.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 复制为列表
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a ComponentNames {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
