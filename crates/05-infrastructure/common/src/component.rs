//! 组件实例
//!
//! 注册表内部以类型擦除的方式持有组件实例

use crate::errors::DependencyError;
use std::any::Any;
use std::sync::Arc;

/// 类型擦除的组件实例
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// 将组件实例转换为具体类型
pub fn downcast_instance<T>(name: &str, instance: ComponentInstance) -> Result<Arc<T>, DependencyError>
where
    T: Any + Send + Sync,
{
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
}
