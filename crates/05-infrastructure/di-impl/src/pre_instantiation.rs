//! 单例预实例化
//!
//! 遍历名称快照，立即创建所有非抽象、非延迟的单例组件。
//! 任意一个组件创建失败即中止（快速失败），已创建的单例保留在注册表中，
//! 由调用方决定是否调用 `destroy_singletons` 回到一致状态。

use di_abstractions::{MergedDefinition, ProductFactory};
use infrastructure_common::{ComponentInstance, DependencyResult};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 预实例化所需的注册表能力
pub trait SingletonSource {
    /// 需要遍历的名称快照
    fn instantiation_names(&self) -> Arc<Vec<String>>;

    /// 合并后的定义
    fn merged_definition(&self, name: &str) -> DependencyResult<Arc<MergedDefinition>>;

    /// 工厂型组件的工厂包装对象
    fn factory_instance(&self, name: &str) -> DependencyResult<Arc<dyn ProductFactory>>;

    /// 获取组件，必要时创建
    fn component(&self, name: &str) -> DependencyResult<ComponentInstance>;
}

/// 预实例化结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreInstantiationSummary {
    /// 处理的单例数量
    pub singletons: usize,
    /// 其中工厂型组件数量
    pub factories: usize,
    /// 立即创建的工厂产品数量
    pub eager_products: usize,
    /// 跳过的名称数量（抽象、延迟或非单例）
    pub skipped: usize,
}

/// 单例预实例化器
pub struct SingletonPreInstantiator<'a, S: SingletonSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: SingletonSource + ?Sized> SingletonPreInstantiator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// 预实例化所有单例，返回第一个失败
    pub fn run(&self) -> DependencyResult<PreInstantiationSummary> {
        let names = self.source.instantiation_names();
        info!("开始预实例化单例, 共 {} 个定义", names.len());

        let mut summary = PreInstantiationSummary::default();
        for name in names.iter() {
            if let Err(e) = self.instantiate(name, &mut summary) {
                error!("预实例化单例 {} 失败: {}", name, e);
                return Err(e);
            }
        }

        info!(
            "单例预实例化完成: 单例 {} 个, 工厂 {} 个, 立即创建的产品 {} 个, 跳过 {} 个",
            summary.singletons, summary.factories, summary.eager_products, summary.skipped
        );
        Ok(summary)
    }

    fn instantiate(&self, name: &str, summary: &mut PreInstantiationSummary) -> DependencyResult<()> {
        let merged = self.source.merged_definition(name)?;
        if !merged.is_eager_singleton() {
            debug!("跳过非立即初始化的组件: {}", name);
            summary.skipped += 1;
            return Ok(());
        }

        summary.singletons += 1;
        if merged.is_factory() {
            summary.factories += 1;
            let factory = self.source.factory_instance(name)?;
            if factory.is_eager_init() {
                debug!("工厂 {} 要求立即创建产品", name);
                self.source.component(name)?;
                summary.eager_products += 1;
            }
        } else {
            self.source.component(name)?;
        }
        Ok(())
    }
}
