//! 组件工厂抽象接口
//!
//! 注册表调用但不实现的外部能力：组件构造、工厂型组件、延迟解析提供者

use crate::definition::MergedDefinition;
use crate::registry::ComponentLookup;
use infrastructure_common::{ComponentInstance, ComponentType, DependencyError, DependencyResult};
use std::fmt;
use std::sync::Arc;

/// 延迟解析提供者
///
/// 零参数的取值能力，每次调用 [`ObjectProvider::get_object`] 时才解析
pub trait ObjectProvider: Send + Sync {
    /// 获取值
    fn get_object(&self) -> DependencyResult<ComponentInstance>;
}

/// 闭包提供者包装器
pub struct ProviderFn<F>
where
    F: Fn() -> DependencyResult<ComponentInstance> + Send + Sync + 'static,
{
    pub provider_fn: F,
}

impl<F> ProviderFn<F>
where
    F: Fn() -> DependencyResult<ComponentInstance> + Send + Sync + 'static,
{
    pub fn new(provider_fn: F) -> Self {
        Self { provider_fn }
    }
}

impl<F> ObjectProvider for ProviderFn<F>
where
    F: Fn() -> DependencyResult<ComponentInstance> + Send + Sync + 'static,
{
    fn get_object(&self) -> DependencyResult<ComponentInstance> {
        (self.provider_fn)()
    }
}

/// 可解析依赖覆盖的值
#[derive(Clone)]
pub enum ResolvableValue {
    /// 已存在的实例
    Instance(ComponentInstance),
    /// 使用时才调用的提供者
    Provider(Arc<dyn ObjectProvider>),
}

impl ResolvableValue {
    /// 由闭包创建延迟提供者
    pub fn provider<F>(provider_fn: F) -> Self
    where
        F: Fn() -> DependencyResult<ComponentInstance> + Send + Sync + 'static,
    {
        Self::Provider(Arc::new(ProviderFn::new(provider_fn)))
    }

    /// 解析出实际值，提供者在这里才被调用
    pub fn resolve(&self) -> DependencyResult<ComponentInstance> {
        match self {
            Self::Instance(instance) => Ok(instance.clone()),
            Self::Provider(provider) => provider.get_object(),
        }
    }
}

impl fmt::Debug for ResolvableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(<instance>)"),
            Self::Provider(_) => f.write_str("Provider(<provider>)"),
        }
    }
}

/// 工厂型组件的工厂包装对象
///
/// 组件定义为 [`crate::DefinitionKind::Factory`] 时，构造协作者先构造出此对象，
/// 组件本身是它的产品
pub trait ProductFactory: Send + Sync {
    /// 获取产品
    fn get_product(&self) -> DependencyResult<ComponentInstance>;

    /// 产品类型，未知时返回 `None`
    fn product_type(&self) -> Option<ComponentType> {
        None
    }

    /// 产品是否为单例
    fn is_singleton(&self) -> bool {
        true
    }

    /// 预实例化时是否需要立即创建产品
    fn is_eager_init(&self) -> bool {
        false
    }
}

/// 组件构造协作者
///
/// 负责根据合并后的定义实际创建对象图。构造过程中可以通过 `lookup`
/// 重入注册表解析依赖；循环依赖由注册表的创建中标记检测。
pub trait ComponentConstructor: Send + Sync {
    /// 构造直接组件实例
    fn construct(
        &self,
        name: &str,
        definition: &MergedDefinition,
        lookup: &dyn ComponentLookup,
    ) -> DependencyResult<ComponentInstance>;

    /// 构造工厂型组件的工厂包装对象
    fn construct_factory(
        &self,
        name: &str,
        definition: &MergedDefinition,
        lookup: &dyn ComponentLookup,
    ) -> DependencyResult<Arc<dyn ProductFactory>> {
        let _ = (definition, lookup);
        Err(DependencyError::invalid_definition(
            name,
            "构造协作者不支持工厂型组件",
        ))
    }
}
