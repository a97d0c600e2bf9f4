//! 默认组件注册表
//!
//! 组合依赖类型注册表、定义存储、冻结控制器和单例注册表，
//! 实现 [`ConfigurableComponentRegistry`]。实际对象构造交给 [`ComponentConstructor`]。

use crate::autowire::AutowireCandidateResolver;
use crate::definition_store::DefinitionStore;
use crate::dependency_types::DependencyTypeRegistry;
use crate::freeze::ConfigurationFreezeController;
use crate::pre_instantiation::{SingletonPreInstantiator, SingletonSource};
use crate::singletons::SingletonRegistry;
use di_abstractions::{
    AutowireCandidate, ComponentConstructor, ComponentDefinition, ComponentLookup, ComponentNames,
    ConfigurableComponentRegistry, DefinitionHandle, DependencyDescriptor, MergedDefinition,
    ProductFactory, RegistryConfig, RegistryStats, ResolvableValue,
};
use infrastructure_common::{
    downcast_instance, ComponentInstance, ComponentType, ConfigResult, DependencyError,
    DependencyResult, TypeInfo,
};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 默认组件注册表
pub struct DefaultComponentRegistry {
    id: Uuid,
    config: RegistryConfig,
    dependency_types: DependencyTypeRegistry,
    store: DefinitionStore,
    metadata: ConfigurationFreezeController,
    singletons: SingletonRegistry,
    constructor: Arc<dyn ComponentConstructor>,
    parent: Option<Arc<dyn ComponentLookup>>,
}

impl DefaultComponentRegistry {
    /// 使用默认配置创建没有祖先的注册表
    pub fn new(constructor: Arc<dyn ComponentConstructor>) -> Self {
        Self::with_parts(constructor, RegistryConfig::default(), None)
    }

    /// 创建构建器
    pub fn builder(constructor: Arc<dyn ComponentConstructor>) -> DefaultComponentRegistryBuilder {
        DefaultComponentRegistryBuilder::new(constructor)
    }

    fn with_parts(
        constructor: Arc<dyn ComponentConstructor>,
        config: RegistryConfig,
        parent: Option<Arc<dyn ComponentLookup>>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(
            "创建组件注册表: {} (允许覆盖定义: {}, 最大解析深度: {}, 祖先: {})",
            id,
            config.allow_definition_overriding,
            config.max_resolution_depth,
            parent.is_some()
        );
        Self {
            id,
            config,
            dependency_types: DependencyTypeRegistry::new(),
            store: DefinitionStore::new(),
            metadata: ConfigurationFreezeController::new(),
            singletons: SingletonRegistry::new(),
            constructor,
            parent,
        }
    }

    /// 注册表标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 注册表配置
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 注册组件定义
    ///
    /// 覆盖已有定义时，旧定义创建的单例随之销毁
    pub fn register_definition(
        &self,
        name: &str,
        definition: ComponentDefinition,
    ) -> DependencyResult<()> {
        if self.is_configuration_frozen() {
            warn!("配置已冻结, 仍在注册组件定义: {}", name);
        }
        let replaced = self
            .store
            .register(name, definition, self.config.allow_definition_overriding)?;
        if replaced.is_some() {
            self.discard_instance(name);
        }
        self.metadata.reset_definition(name);
        Ok(())
    }

    /// 移除组件定义及其单例
    pub fn remove_definition(&self, name: &str) -> DependencyResult<()> {
        if self.is_configuration_frozen() {
            warn!("配置已冻结, 仍在移除组件定义: {}", name);
        }
        self.store.remove(name)?;
        self.discard_instance(name);
        self.metadata.reset_definition(name);
        Ok(())
    }

    /// 编辑组件定义
    ///
    /// 修改在副本上进行，校验通过后写回原始定义，失败时原定义不变
    pub fn edit_definition<F>(&self, name: &str, edit: F) -> DependencyResult<()>
    where
        F: FnOnce(&mut ComponentDefinition),
    {
        let handle = self.store.get(name)?;
        let mut edited = handle.read().clone();
        edit(&mut edited);
        edited.validate(name)?;
        *handle.write() = edited;

        debug!("编辑组件定义: {}", name);
        self.metadata.reset_definition(name);
        Ok(())
    }

    /// 定义数量
    pub fn definition_count(&self) -> usize {
        self.store.len()
    }

    /// 按注册顺序排列的定义名称
    pub fn definition_names(&self) -> Vec<String> {
        self.store.definition_names().to_vec()
    }

    /// 手动注册单例实例
    pub fn register_singleton(
        &self,
        name: &str,
        component_type: ComponentType,
        instance: ComponentInstance,
    ) -> DependencyResult<()> {
        self.singletons.register(name, instance)?;
        self.store.add_manual_singleton(name, component_type);
        info!("注册单例实例: {}", name);
        Ok(())
    }

    /// 是否已存在单例实例
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.contains(name)
    }

    /// 获取已存在的单例实例，不会触发创建
    pub fn get_singleton(&self, name: &str) -> Option<ComponentInstance> {
        self.singletons.get(name)
    }

    /// 单例实例数量
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    /// 获取组件并转换为具体类型
    pub fn get_typed<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(name, self.get_component(name)?)
    }

    /// 获取工厂型组件的工厂包装对象
    pub fn get_factory(&self, name: &str) -> DependencyResult<Arc<dyn ProductFactory>> {
        if let Some(factory) = self.singletons.get_factory(name) {
            return Ok(factory);
        }
        let merged = self.local_merged_definition(name)?;
        if !merged.is_factory() {
            return Err(DependencyError::invalid_definition(name, "不是工厂型组件"));
        }

        let _guard = self
            .singletons
            .begin_creation(name, self.config.max_resolution_depth)?;
        self.initialize_depends_on(&merged)?;
        self.create_factory(&merged)
    }

    /// 查找依赖的全部候选
    pub fn find_autowire_candidates(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<Vec<AutowireCandidate>> {
        self.resolver().find_autowire_candidates(descriptor)
    }

    /// 在本地候选中选出唯一的组件名称
    pub fn resolve_candidate_name(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<Option<String>> {
        let resolver = self.resolver();
        let names = resolver.candidate_names(descriptor)?;
        resolver.determine_candidate_name(descriptor, &names)
    }

    /// 按类型列出本地组件名称
    pub fn names_for_type(
        &self,
        requested: &TypeInfo,
        include_non_singletons: bool,
    ) -> DependencyResult<Vec<String>> {
        self.resolver().names_for_type(requested, include_non_singletons)
    }

    /// 销毁所有单例，回到没有任何实例的一致状态
    ///
    /// 手动注册的单例也一并移除；组件定义和冻结状态保留
    pub fn destroy_singletons(&self) {
        let count = self.singletons.len();
        self.singletons.clear();
        self.store.clear_manual_singletons();
        self.metadata.clear_created();
        self.metadata.clear_metadata_cache();
        info!("已销毁 {} 个单例", count);
    }

    /// 统计信息
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            definitions: self.store.len(),
            manual_singletons: self.store.manual_only_count(),
            active_singletons: self.singletons.len(),
            cached_merged_definitions: self.metadata.cached_count(),
            frozen: self.metadata.is_frozen(),
        }
    }

    fn resolver(&self) -> AutowireCandidateResolver<'_> {
        AutowireCandidateResolver::new(
            &self.store,
            &self.dependency_types,
            &self.metadata,
            self.parent.as_deref(),
        )
    }

    fn local_merged_definition(&self, name: &str) -> DependencyResult<Arc<MergedDefinition>> {
        self.metadata
            .get_merged_definition(name, &self.store, self.parent.as_deref())
    }

    /// 手动注册的单例不受定义变更影响
    fn discard_instance(&self, name: &str) {
        if self.store.is_manual_singleton(name) {
            return;
        }
        if self.singletons.remove(name).is_some() {
            debug!("销毁组件 {} 的单例实例", name);
        }
        self.metadata.unmark_created(name);
    }

    fn initialize_depends_on(&self, merged: &MergedDefinition) -> DependencyResult<()> {
        for dependency in &merged.depends_on {
            debug!("组件 {} 依赖 {}, 先行初始化", merged.name, dependency);
            self.get_component(dependency)?;
        }
        Ok(())
    }

    fn create_factory(&self, merged: &MergedDefinition) -> DependencyResult<Arc<dyn ProductFactory>> {
        let name = merged.name.as_str();
        if let Some(factory) = self.singletons.get_factory(name) {
            return Ok(factory);
        }

        let factory = self.constructor.construct_factory(name, merged, self)?;
        debug!("创建工厂包装对象: {}", name);
        if merged.lifetime.is_singleton() {
            self.metadata.mark_created(name);
            Ok(self.singletons.add_factory(name, factory))
        } else {
            Ok(factory)
        }
    }

    fn create_component(&self, merged: &MergedDefinition) -> DependencyResult<ComponentInstance> {
        let name = merged.name.as_str();
        let singleton = merged.lifetime.is_singleton();

        let instance = if merged.is_factory() {
            let factory = self.create_factory(merged)?;
            let product = factory.get_product()?;
            if singleton && factory.is_singleton() {
                self.singletons.add_created(name, product)
            } else {
                product
            }
        } else {
            let instance = self.constructor.construct(name, merged, self)?;
            if singleton {
                self.singletons.add_created(name, instance)
            } else {
                instance
            }
        };

        if singleton {
            self.metadata.mark_created(name);
        }
        debug!("创建组件: {}", name);
        Ok(instance)
    }
}

impl ComponentLookup for DefaultComponentRegistry {
    fn contains_definition(&self, name: &str) -> bool {
        self.store.contains(name)
    }

    fn contains_component(&self, name: &str) -> bool {
        self.store.contains(name)
            || self.singletons.contains(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.contains_component(name))
    }

    fn get_merged_definition(&self, name: &str) -> DependencyResult<Arc<MergedDefinition>> {
        if self.store.contains(name) {
            return self.local_merged_definition(name);
        }
        match &self.parent {
            Some(parent) => parent.get_merged_definition(name),
            None => Err(DependencyError::no_such_definition(name)),
        }
    }

    fn is_autowire_candidate(
        &self,
        name: &str,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<bool> {
        self.resolver().is_autowire_candidate(name, descriptor)
    }

    fn get_component(&self, name: &str) -> DependencyResult<ComponentInstance> {
        if let Some(instance) = self.singletons.get(name) {
            return Ok(instance);
        }
        if !self.store.contains(name) {
            return match &self.parent {
                Some(parent) => parent.get_component(name),
                None => Err(DependencyError::no_such_definition(name)),
            };
        }

        let merged = self.local_merged_definition(name)?;
        if merged.abstract_definition {
            return Err(DependencyError::invalid_definition(name, "抽象定义不能实例化"));
        }

        let _guard = self
            .singletons
            .begin_creation(name, self.config.max_resolution_depth)?;
        // 其他线程可能已经完成创建
        if let Some(instance) = self.singletons.get(name) {
            return Ok(instance);
        }
        self.initialize_depends_on(&merged)?;
        self.create_component(&merged)
    }

    fn resolve_dependency(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> DependencyResult<Option<ComponentInstance>> {
        if let Some(value) = self
            .dependency_types
            .find_overrides(&descriptor.dependency_type)
            .into_iter()
            .next()
        {
            debug!("依赖 {} 由可解析依赖覆盖提供", descriptor);
            return value.resolve().map(Some);
        }

        let resolver = self.resolver();
        let names = resolver.candidate_names(descriptor)?;
        if names.is_empty() {
            if let Some(parent) = &self.parent {
                debug!("本地没有依赖 {} 的候选, 委托祖先解析", descriptor);
                return parent.resolve_dependency(descriptor);
            }
        }

        match resolver.determine_candidate_name(descriptor, &names)? {
            Some(name) => self.get_component(&name).map(Some),
            None => Ok(None),
        }
    }
}

impl ConfigurableComponentRegistry for DefaultComponentRegistry {
    fn ignore_dependency_type(&self, dependency_type: TypeInfo) {
        self.dependency_types.ignore_dependency_type(dependency_type);
    }

    fn ignore_dependency_interface(&self, capability: TypeInfo) {
        self.dependency_types.ignore_dependency_interface(capability);
    }

    fn register_resolvable_dependency(&self, dependency_type: ComponentType, value: ResolvableValue) {
        self.dependency_types
            .register_resolvable_dependency(dependency_type, value);
    }

    fn get_definition(&self, name: &str) -> DependencyResult<DefinitionHandle> {
        self.store.get(name)
    }

    fn names(&self) -> ComponentNames {
        self.store.names()
    }

    fn clear_metadata_cache(&self) {
        self.metadata.clear_metadata_cache();
    }

    fn freeze_configuration(&self) {
        self.metadata.freeze(self.store.definition_names());
    }

    fn is_configuration_frozen(&self) -> bool {
        self.metadata.is_frozen()
    }

    fn pre_instantiate_singletons(&self) -> DependencyResult<()> {
        SingletonPreInstantiator::new(self).run().map(|_| ())
    }
}

impl SingletonSource for DefaultComponentRegistry {
    fn instantiation_names(&self) -> Arc<Vec<String>> {
        self.metadata
            .frozen_names()
            .unwrap_or_else(|| self.store.definition_names())
    }

    fn merged_definition(&self, name: &str) -> DependencyResult<Arc<MergedDefinition>> {
        self.local_merged_definition(name)
    }

    fn factory_instance(&self, name: &str) -> DependencyResult<Arc<dyn ProductFactory>> {
        self.get_factory(name)
    }

    fn component(&self, name: &str) -> DependencyResult<ComponentInstance> {
        self.get_component(name)
    }
}

impl std::fmt::Debug for DefaultComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultComponentRegistry")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// 默认组件注册表构建器
pub struct DefaultComponentRegistryBuilder {
    constructor: Arc<dyn ComponentConstructor>,
    config: RegistryConfig,
    parent: Option<Arc<dyn ComponentLookup>>,
}

impl DefaultComponentRegistryBuilder {
    pub fn new(constructor: Arc<dyn ComponentConstructor>) -> Self {
        Self {
            constructor,
            config: RegistryConfig::default(),
            parent: None,
        }
    }

    /// 设置注册表配置
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置祖先注册表
    pub fn with_parent(mut self, parent: Arc<dyn ComponentLookup>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 校验配置并构建注册表
    pub fn build(self) -> ConfigResult<DefaultComponentRegistry> {
        self.config.validate()?;
        Ok(DefaultComponentRegistry::with_parts(
            self.constructor,
            self.config,
            self.parent,
        ))
    }
}
