//! # Dependency Injection Abstractions
//! 
//! 依赖注入抽象层，定义组件定义、依赖描述以及注册表的核心接口。
//! 
//! ## 核心接口
//! 
//! - [`ConfigurableComponentRegistry`] - 可配置、可枚举的组件注册表
//! - [`ComponentLookup`] - 祖先注册表与构造过程使用的只读查询视图
//! - [`ComponentConstructor`] - 外部组件构造协作者
//! - [`ObjectProvider`] - 零参数的延迟解析提供者
//! - [`ProductFactory`] - 工厂型组件的工厂包装对象

pub mod definition;
pub mod resolver;
pub mod factory;
pub mod registry;
pub mod container;

pub use definition::*;
pub use resolver::*;
pub use factory::*;
pub use registry::*;
pub use container::*;
