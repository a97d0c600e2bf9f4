//! 单例注册表
//!
//! 缓存已创建的单例和工厂包装对象，并跟踪正在创建中的组件以检测循环依赖

use di_abstractions::ProductFactory;
use infrastructure_common::{ComponentInstance, DependencyError, DependencyResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// 单例注册表
#[derive(Default)]
pub struct SingletonRegistry {
    singletons: RwLock<HashMap<String, ComponentInstance>>,
    factory_instances: RwLock<HashMap<String, Arc<dyn ProductFactory>>>,
    /// 每个线程各自的创建链
    in_creation: Mutex<HashMap<ThreadId, Vec<String>>>,
}

impl SingletonRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取单例
    pub fn get(&self, name: &str) -> Option<ComponentInstance> {
        self.singletons.read().get(name).cloned()
    }

    /// 是否存在单例
    pub fn contains(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    /// 手动注册单例，名称已被占用时返回错误
    pub fn register(&self, name: &str, instance: ComponentInstance) -> DependencyResult<()> {
        let mut singletons = self.singletons.write();
        if singletons.contains_key(name) {
            return Err(DependencyError::SingletonAlreadyRegistered {
                name: name.to_string(),
            });
        }
        singletons.insert(name.to_string(), instance);
        Ok(())
    }

    /// 缓存新创建的单例；已存在时保留先创建的实例并返回它
    pub fn add_created(&self, name: &str, instance: ComponentInstance) -> ComponentInstance {
        self.singletons
            .write()
            .entry(name.to_string())
            .or_insert(instance)
            .clone()
    }

    /// 获取工厂包装对象
    pub fn get_factory(&self, name: &str) -> Option<Arc<dyn ProductFactory>> {
        self.factory_instances.read().get(name).cloned()
    }

    /// 缓存工厂包装对象；已存在时保留先创建的对象并返回它
    pub fn add_factory(&self, name: &str, factory: Arc<dyn ProductFactory>) -> Arc<dyn ProductFactory> {
        self.factory_instances
            .write()
            .entry(name.to_string())
            .or_insert(factory)
            .clone()
    }

    /// 移除单例及其工厂包装对象
    pub fn remove(&self, name: &str) -> Option<ComponentInstance> {
        self.factory_instances.write().remove(name);
        self.singletons.write().remove(name)
    }

    /// 单例数量
    pub fn len(&self) -> usize {
        self.singletons.read().len()
    }

    /// 是否没有单例
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清除所有单例、工厂包装对象和创建中标记
    pub fn clear(&self) {
        self.singletons.write().clear();
        self.factory_instances.write().clear();
        self.in_creation.lock().clear();
    }

    /// 标记组件在当前线程开始创建
    ///
    /// 组件已在当前线程的创建链中时返回循环依赖错误；创建链长度达到 `max_depth`
    /// 时返回深度错误。返回的守卫在释放时清除标记。
    pub fn begin_creation(&self, name: &str, max_depth: usize) -> DependencyResult<CreationGuard<'_>> {
        let thread_id = thread::current().id();
        let mut in_creation = self.in_creation.lock();
        let chain = in_creation.entry(thread_id).or_default();
        if chain.iter().any(|n| n == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(DependencyError::CircularDependency {
                dependency_chain: cycle.join(" -> "),
            });
        }
        if chain.len() >= max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                name: name.to_string(),
                max_depth,
            });
        }
        chain.push(name.to_string());
        Ok(CreationGuard {
            registry: self,
            thread_id,
            name: name.to_string(),
        })
    }

    /// 组件是否正在当前线程创建中
    pub fn is_in_creation(&self, name: &str) -> bool {
        self.in_creation
            .lock()
            .get(&thread::current().id())
            .is_some_and(|chain| chain.iter().any(|n| n == name))
    }
}

impl std::fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("singletons", &self.singletons.read().keys().collect::<Vec<_>>())
            .field("factory_instances", &self.factory_instances.read().keys().collect::<Vec<_>>())
            .field("in_creation", &self.in_creation.lock().values().flatten().collect::<Vec<_>>())
            .finish()
    }
}

/// 创建中标记守卫
pub struct CreationGuard<'a> {
    registry: &'a SingletonRegistry,
    thread_id: ThreadId,
    name: String,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut in_creation = self.registry.in_creation.lock();
        if let Some(chain) = in_creation.get_mut(&self.thread_id) {
            if let Some(position) = chain.iter().rposition(|n| *n == self.name) {
                chain.remove(position);
            }
            if chain.is_empty() {
                in_creation.remove(&self.thread_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_registration_rejects_duplicates() {
        let registry = SingletonRegistry::new();
        registry.register("clock", Arc::new(1_u64)).unwrap();

        let err = registry.register("clock", Arc::new(2_u64)).unwrap_err();
        assert!(matches!(err, DependencyError::SingletonAlreadyRegistered { .. }));
    }

    #[test]
    fn test_add_created_keeps_first_instance() {
        let registry = SingletonRegistry::new();
        let first: ComponentInstance = Arc::new(1_u64);
        registry.add_created("clock", first.clone());

        let kept = registry.add_created("clock", Arc::new(2_u64));
        assert!(Arc::ptr_eq(&first, &kept));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_creation_guard_detects_cycles() {
        let registry = SingletonRegistry::new();
        let _a = registry.begin_creation("a", 10).unwrap();
        let _b = registry.begin_creation("b", 10).unwrap();

        match registry.begin_creation("a", 10) {
            Err(DependencyError::CircularDependency { dependency_chain }) => {
                assert_eq!(dependency_chain, "a -> b -> a");
            }
            other => panic!("期望循环依赖错误, 实际: {:?}", other.map(|_| ())),
        };
    }

    #[test]
    fn test_creation_guard_releases_on_drop() {
        let registry = SingletonRegistry::new();
        {
            let _guard = registry.begin_creation("a", 10).unwrap();
            assert!(registry.is_in_creation("a"));
        }
        assert!(!registry.is_in_creation("a"));
        assert!(registry.begin_creation("a", 10).is_ok());
    }

    #[test]
    fn test_creation_chains_are_per_thread() {
        let registry = Arc::new(SingletonRegistry::new());
        let _guard = registry.begin_creation("shared", 10).unwrap();

        let other = registry.clone();
        let result = std::thread::spawn(move || other.begin_creation("shared", 10).is_ok())
            .join()
            .unwrap();
        assert!(result);
    }

    #[test]
    fn test_depth_limit() {
        let registry = SingletonRegistry::new();
        let _a = registry.begin_creation("a", 1).unwrap();

        let err = registry.begin_creation("b", 1).err().unwrap();
        assert!(matches!(err, DependencyError::ResolutionDepthExceeded { max_depth: 1, .. }));
    }
}
