//! 注册表端到端场景测试：预实例化、工厂型组件、失败恢复与祖先委托

use anyhow::Result;
use di_abstractions::{
    ComponentConstructor, ComponentDefinition, ComponentLookup, ConfigurableComponentRegistry,
    DependencyDescriptor, MergedDefinition, ProductFactory,
};
use di_impl::DefaultComponentRegistry;
use infrastructure_common::{
    ComponentInstance, ComponentType, DependencyError, DependencyResult, Lifetime, TypeInfo,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Debug)]
struct Service {
    name: String,
    dependencies: Vec<ComponentInstance>,
}

#[derive(Debug)]
struct Connection {
    url: String,
}

struct ConnectionFactory {
    url: String,
    eager: bool,
    products: Mutex<usize>,
}

impl ProductFactory for ConnectionFactory {
    fn get_product(&self) -> DependencyResult<ComponentInstance> {
        *self.products.lock() += 1;
        Ok(Arc::new(Connection {
            url: self.url.clone(),
        }))
    }

    fn product_type(&self) -> Option<ComponentType> {
        Some(ComponentType::of::<Connection>())
    }

    fn is_eager_init(&self) -> bool {
        self.eager
    }
}

/// 按定义属性构造组件的协作者
///
/// - `requires`: 构造时通过 `lookup` 获取的组件名称
/// - `fail`: 构造失败
/// - `url` / `eager`: 工厂型组件的参数
#[derive(Default)]
struct ScriptedConstructor {
    events: Mutex<Vec<String>>,
}

impl ScriptedConstructor {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }
}

impl ComponentConstructor for ScriptedConstructor {
    fn construct(
        &self,
        name: &str,
        definition: &MergedDefinition,
        lookup: &dyn ComponentLookup,
    ) -> DependencyResult<ComponentInstance> {
        self.events.lock().push(format!("start:{}", name));
        if definition.property_values.get("fail") == Some(&json!(true)) {
            return Err(DependencyError::construction_failed(name, "模拟构造失败"));
        }

        let mut dependencies = Vec::new();
        if let Some(requires) = definition.property_values.get("requires").and_then(|v| v.as_array()) {
            for dependency in requires.iter().filter_map(|v| v.as_str()) {
                dependencies.push(lookup.get_component(dependency)?);
            }
        }

        self.events.lock().push(format!("done:{}", name));
        Ok(Arc::new(Service {
            name: name.to_string(),
            dependencies,
        }))
    }

    fn construct_factory(
        &self,
        name: &str,
        definition: &MergedDefinition,
        _lookup: &dyn ComponentLookup,
    ) -> DependencyResult<Arc<dyn ProductFactory>> {
        self.events.lock().push(format!("factory:{}", name));
        let url = definition
            .property_values
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or("memory://")
            .to_string();
        let eager = definition.property_values.get("eager") == Some(&json!(true));
        Ok(Arc::new(ConnectionFactory {
            url,
            eager,
            products: Mutex::new(0),
        }))
    }
}

fn setup() -> (Arc<ScriptedConstructor>, DefaultComponentRegistry) {
    init_test_logger();
    let constructor = Arc::new(ScriptedConstructor::default());
    let registry = DefaultComponentRegistry::new(constructor.clone());
    (constructor, registry)
}

fn service() -> ComponentDefinition {
    ComponentDefinition::new(ComponentType::of::<Service>())
}

fn connection_factory(url: &str, eager: bool) -> ComponentDefinition {
    ComponentDefinition::factory(
        ComponentType::of::<ConnectionFactory>(),
        ComponentType::of::<Connection>(),
    )
    .with_property("url", json!(url))
    .with_property("eager", json!(eager))
}

/// 场景 A：Y 依赖 X，两者都只构造一次，X 在 Y 完成之前构造
#[test]
fn test_dependent_singletons_are_constructed_once_in_order() -> Result<()> {
    let (constructor, registry) = setup();
    registry.register_definition("x", service())?;
    registry.register_definition("y", service().with_property("requires", json!(["x"])))?;
    registry.freeze_configuration();

    registry.pre_instantiate_singletons()?;

    assert_eq!(constructor.count("done:x"), 1);
    assert_eq!(constructor.count("done:y"), 1);
    let events = constructor.events();
    let x_done = events.iter().position(|e| e == "done:x").unwrap();
    let y_done = events.iter().position(|e| e == "done:y").unwrap();
    assert!(x_done < y_done);

    let y = registry.get_typed::<Service>("y")?;
    let x = registry.get_component("x")?;
    assert!(Arc::ptr_eq(&y.dependencies[0], &x));
    Ok(())
}

/// 场景 A 的变体：通过 depends_on 声明初始化顺序
#[test]
fn test_depends_on_initializes_first() -> Result<()> {
    let (constructor, registry) = setup();
    registry.register_definition("y", service().with_depends_on("x"))?;
    registry.register_definition("x", service().with_lazy_init(true))?;

    registry.pre_instantiate_singletons()?;
    assert_eq!(constructor.events(), vec!["start:x", "done:x", "start:y", "done:y"]);
    Ok(())
}

/// 场景 B：只构造非延迟的单例
#[test]
fn test_lazy_singletons_are_skipped() -> Result<()> {
    let (constructor, registry) = setup();
    registry.register_definition("x", service().with_lazy_init(true))?;
    registry.register_definition("z", service())?;
    registry.register_definition("t", service().with_lifetime(Lifetime::Transient))?;

    registry.pre_instantiate_singletons()?;

    assert_eq!(constructor.events(), vec!["start:z", "done:z"]);
    assert!(registry.contains_singleton("z"));
    assert!(!registry.contains_singleton("x"));
    Ok(())
}

/// 场景 C：A 构造失败即中止，排在后面的 B 不会被尝试
#[test]
fn test_first_failure_aborts_pre_instantiation() {
    let (constructor, registry) = setup();
    registry.register_definition("ok", service()).unwrap();
    registry
        .register_definition("a", service().with_property("fail", json!(true)))
        .unwrap();
    registry.register_definition("b", service()).unwrap();

    let err = registry.pre_instantiate_singletons().unwrap_err();
    match err {
        DependencyError::ConstructionFailed { name, .. } => assert_eq!(name, "a"),
        other => panic!("期望构造失败错误, 实际: {:?}", other),
    }
    assert_eq!(constructor.count("start:b"), 0);
    // 失败前已创建的单例保留在注册表中
    assert!(registry.contains_singleton("ok"));
    assert!(!registry.contains_singleton("a"));
}

/// 失败后调用方销毁单例，修正定义后可以重新预实例化
#[test]
fn test_destroy_singletons_after_failure() -> Result<()> {
    let (constructor, registry) = setup();
    registry.register_definition("ok", service())?;
    registry.register_definition("a", service().with_property("fail", json!(true)))?;
    assert!(registry.pre_instantiate_singletons().is_err());

    registry.destroy_singletons();
    assert_eq!(registry.singleton_count(), 0);

    registry.edit_definition("a", |definition| {
        definition.property_values.remove("fail");
    })?;
    registry.pre_instantiate_singletons()?;

    assert_eq!(constructor.count("done:ok"), 2);
    assert_eq!(constructor.count("done:a"), 1);
    Ok(())
}

/// 场景 D：忽略的类型即使匹配也不是候选
#[test]
fn test_ignored_dependency_type_is_not_candidate() -> Result<()> {
    let (_, registry) = setup();
    registry.register_definition("x", service())?;
    let descriptor = DependencyDescriptor::of::<Service>();
    assert!(registry.is_autowire_candidate("x", &descriptor)?);

    registry.ignore_dependency_type(TypeInfo::of::<Service>());
    assert!(!registry.is_autowire_candidate("x", &descriptor)?);
    Ok(())
}

/// 第二次预实例化不会重复构造
#[test]
fn test_pre_instantiation_is_idempotent() -> Result<()> {
    let (constructor, registry) = setup();
    registry.register_definition("x", service())?;
    registry.register_definition("y", service().with_property("requires", json!(["x"])))?;
    registry.register_definition("pool", connection_factory("db://primary", true))?;
    registry.freeze_configuration();

    registry.pre_instantiate_singletons()?;
    let events = constructor.events();
    let first = registry.get_component("x")?;

    registry.pre_instantiate_singletons()?;
    assert_eq!(constructor.events(), events);
    assert!(Arc::ptr_eq(&first, &registry.get_component("x")?));
    Ok(())
}

/// 工厂型组件：只有要求立即初始化时才创建产品
#[test]
fn test_factory_products_follow_eager_flag() -> Result<()> {
    let (constructor, registry) = setup();
    registry.register_definition("primary", connection_factory("db://primary", true))?;
    registry.register_definition("replica", connection_factory("db://replica", false))?;

    registry.pre_instantiate_singletons()?;
    assert_eq!(constructor.events(), vec!["factory:primary", "factory:replica"]);
    assert!(registry.contains_singleton("primary"));
    assert!(!registry.contains_singleton("replica"));

    // 按名称获取的是产品，且单例产品只创建一次
    let replica = registry.get_typed::<Connection>("replica")?;
    assert_eq!(replica.url, "db://replica");
    let again = registry.get_typed::<Connection>("replica")?;
    assert!(Arc::ptr_eq(&replica, &again));
    assert_eq!(constructor.count("factory:replica"), 1);

    // 工厂包装对象本身可以单独获取
    let factory = registry.get_factory("replica")?;
    assert_eq!(factory.product_type(), Some(ComponentType::of::<Connection>()));
    Ok(())
}

/// 工厂型组件按产品类型参与自动装配
#[test]
fn test_factory_matches_by_product_type() -> Result<()> {
    let (_, registry) = setup();
    registry.register_definition("primary", connection_factory("db://primary", false))?;

    assert!(registry.is_autowire_candidate("primary", &DependencyDescriptor::of::<Connection>())?);
    assert!(!registry.is_autowire_candidate(
        "primary",
        &DependencyDescriptor::of::<ConnectionFactory>()
    )?);

    let connection = registry
        .resolve_dependency(&DependencyDescriptor::of::<Connection>())?
        .unwrap()
        .downcast::<Connection>()
        .unwrap();
    assert_eq!(connection.url, "db://primary");
    Ok(())
}

/// 非工厂定义不能按工厂获取
#[test]
fn test_get_factory_rejects_direct_definition() {
    let (_, registry) = setup();
    registry.register_definition("x", service()).unwrap();

    let err = registry.get_factory("x").err().unwrap();
    assert!(matches!(err, DependencyError::InvalidDefinition { .. }));
}

/// 构造过程中的循环依赖快速失败
#[test]
fn test_circular_dependency_is_detected() {
    let (_, registry) = setup();
    registry
        .register_definition("a", service().with_property("requires", json!(["b"])))
        .unwrap();
    registry
        .register_definition("b", service().with_property("requires", json!(["a"])))
        .unwrap();

    match registry.pre_instantiate_singletons().unwrap_err() {
        DependencyError::CircularDependency { dependency_chain } => {
            assert_eq!(dependency_chain, "a -> b -> a");
        }
        other => panic!("期望循环依赖错误, 实际: {:?}", other),
    }
    assert_eq!(registry.singleton_count(), 0);

    // 创建中标记已释放，再次尝试报告相同的错误而不是死锁
    assert!(matches!(
        registry.get_component("b").unwrap_err(),
        DependencyError::CircularDependency { .. }
    ));
}

/// depends_on 形成的循环同样被检测
#[test]
fn test_depends_on_cycle_is_detected() {
    let (_, registry) = setup();
    registry.register_definition("a", service().with_depends_on("b")).unwrap();
    registry.register_definition("b", service().with_depends_on("a")).unwrap();

    assert!(matches!(
        registry.get_component("a").unwrap_err(),
        DependencyError::CircularDependency { .. }
    ));
}

/// 超过最大解析深度时报错
#[test]
fn test_resolution_depth_limit() {
    init_test_logger();
    let constructor = Arc::new(ScriptedConstructor::default());
    let registry = DefaultComponentRegistry::builder(constructor)
        .with_config(di_abstractions::RegistryConfig {
            max_resolution_depth: 2,
            ..Default::default()
        })
        .build()
        .unwrap();
    registry
        .register_definition("a", service().with_property("requires", json!(["b"])))
        .unwrap();
    registry
        .register_definition("b", service().with_property("requires", json!(["c"])))
        .unwrap();
    registry.register_definition("c", service()).unwrap();

    assert!(matches!(
        registry.get_component("a").unwrap_err(),
        DependencyError::ResolutionDepthExceeded { max_depth: 2, .. }
    ));
}

/// 祖先注册表委托：候选判断与组件获取都交给祖先
#[test]
fn test_ancestor_delegation() -> Result<()> {
    let (parent_constructor, parent) = setup();
    parent.register_definition("shared", service())?;
    let parent = Arc::new(parent);

    let child_constructor = Arc::new(ScriptedConstructor::default());
    let child = DefaultComponentRegistry::builder(child_constructor.clone())
        .with_parent(parent.clone())
        .build()?;
    child.register_definition("local", service().with_property("requires", json!(["shared"])))?;

    assert!(child.is_autowire_candidate("shared", &DependencyDescriptor::of::<Service>())?);
    assert!(child.get_definition("shared").unwrap_err().is_no_such_definition());

    child.pre_instantiate_singletons()?;
    assert_eq!(parent_constructor.count("done:shared"), 1);
    assert_eq!(child_constructor.count("done:local"), 1);
    assert!(parent.contains_singleton("shared"));
    assert!(!child.contains_singleton("shared"));

    // 本地没有候选时依赖解析委托给祖先
    let resolved = child
        .resolve_dependency(&DependencyDescriptor::of::<Service>().with_qualifier("shared"))?
        .unwrap()
        .downcast::<Service>()
        .unwrap();
    assert_eq!(resolved.name, "shared");
    Ok(())
}

/// 子定义的父定义可以来自祖先注册表
#[test]
fn test_parent_definition_from_ancestor() -> Result<()> {
    let (_, parent) = setup();
    parent.register_definition("template", service().with_abstract(true).with_lazy_init(true))?;
    let parent = Arc::new(parent);

    let child_constructor = Arc::new(ScriptedConstructor::default());
    let child = DefaultComponentRegistry::builder(child_constructor.clone())
        .with_parent(parent)
        .build()?;
    child.register_definition("concrete", ComponentDefinition::child("template"))?;

    let merged = child.get_merged_definition("concrete")?;
    assert!(merged.lazy_init);
    assert_eq!(merged.component_type, Some(ComponentType::of::<Service>()));

    child.pre_instantiate_singletons()?;
    assert!(child_constructor.events().is_empty());
    Ok(())
}
