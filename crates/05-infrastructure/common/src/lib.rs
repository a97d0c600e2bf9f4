//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 组件注册表共用的基础类型。
//!
//! ## 核心组件
//!
//! - [`DependencyError`] - 依赖注入错误类型
//! - [`TypeInfo`] / [`ComponentType`] - 类型元数据与可赋值关系
//! - [`Lifetime`] - 组件生命周期（单例 / 瞬时）
//! - [`ConfigSection`] / [`Configurable`] - 内存配置节与可配置组件
//! - [`ComponentInstance`] - 类型擦除的组件实例
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 以 `TypeId` 作为类型身份，而不是类型名称

pub mod component;
pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
