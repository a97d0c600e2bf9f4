//! # 依赖注入具体实现
//!
//! 提供可配置、可枚举的组件注册表实现：
//!
//! - [`DependencyTypeRegistry`] - 自动装配排除的依赖类型与可解析依赖覆盖
//! - [`DefinitionStore`] - 组件定义与手动注册单例名称的权威存储
//! - [`AutowireCandidateResolver`] - 自动装配候选判断与唯一候选裁决
//! - [`ConfigurationFreezeController`] - 配置冻结与合并定义缓存
//! - [`SingletonPreInstantiator`] - 单例预实例化
//! - [`DefaultComponentRegistry`] - 组合以上部件的默认注册表

pub mod autowire;
pub mod definition_store;
pub mod dependency_types;
pub mod freeze;
pub mod pre_instantiation;
pub mod registry;
pub mod singletons;

pub use autowire::AutowireCandidateResolver;
pub use definition_store::DefinitionStore;
pub use dependency_types::DependencyTypeRegistry;
pub use freeze::ConfigurationFreezeController;
pub use pre_instantiation::{PreInstantiationSummary, SingletonPreInstantiator, SingletonSource};
pub use registry::{DefaultComponentRegistry, DefaultComponentRegistryBuilder};
pub use singletons::{CreationGuard, SingletonRegistry};
