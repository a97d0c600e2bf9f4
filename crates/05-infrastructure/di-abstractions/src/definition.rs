//! 组件定义
//!
//! 描述如何产生一个受管组件实例的声明式元数据

use infrastructure_common::{ComponentType, DependencyError, DependencyResult, Lifetime};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 组件定义句柄
///
/// 注册表返回的是内部持有的原始定义，而不是副本，
/// 后处理器通过句柄原地修改定义，所有持有者都能看到修改。
pub type DefinitionHandle = Arc<RwLock<ComponentDefinition>>;

/// 组件定义种类
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefinitionKind {
    /// 直接组件：构造出的实例就是组件本身
    #[default]
    Direct,
    /// 工厂型组件：构造出的实例是一个工厂包装对象，组件是它的产品
    Factory {
        /// 产品类型
        product_type: ComponentType,
    },
}

/// 组件定义
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    /// 实现类型（工厂型组件为工厂包装对象的类型）
    pub component_type: Option<ComponentType>,
    /// 定义种类
    pub kind: DefinitionKind,
    /// 生命周期，未设置时继承父定义或默认单例
    pub lifetime: Option<Lifetime>,
    /// 是否延迟初始化，未设置时继承父定义或默认 `false`
    pub lazy_init: Option<bool>,
    /// 是否参与自动装配
    pub autowire_candidate: bool,
    /// 是否为首选候选
    pub primary: bool,
    /// 候选优先级，数值越高优先级越高
    pub priority: Option<i32>,
    /// 是否为抽象定义（只作为父定义使用，不会被实例化）
    pub abstract_definition: bool,
    /// 父定义名称
    pub parent_name: Option<String>,
    /// 必须先于本组件初始化的组件名称
    pub depends_on: Vec<String>,
    /// 限定符
    pub qualifiers: Vec<String>,
    /// 属性值，由构造协作者解释
    pub property_values: BTreeMap<String, serde_json::Value>,
}

impl ComponentDefinition {
    /// 创建直接组件定义
    pub fn new(component_type: ComponentType) -> Self {
        Self {
            component_type: Some(component_type),
            ..Self::empty()
        }
    }

    /// 创建工厂型组件定义
    pub fn factory(factory_type: ComponentType, product_type: ComponentType) -> Self {
        Self {
            component_type: Some(factory_type),
            kind: DefinitionKind::Factory { product_type },
            ..Self::empty()
        }
    }

    /// 创建继承父定义的子定义
    pub fn child(parent_name: impl Into<String>) -> Self {
        Self {
            parent_name: Some(parent_name.into()),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            component_type: None,
            kind: DefinitionKind::Direct,
            lifetime: None,
            lazy_init: None,
            autowire_candidate: true,
            primary: false,
            priority: None,
            abstract_definition: false,
            parent_name: None,
            depends_on: Vec::new(),
            qualifiers: Vec::new(),
            property_values: BTreeMap::new(),
        }
    }

    /// 设置实现类型
    pub fn with_component_type(mut self, component_type: ComponentType) -> Self {
        self.component_type = Some(component_type);
        self
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// 设置延迟初始化
    pub fn with_lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = Some(lazy_init);
        self
    }

    /// 设置是否参与自动装配
    pub fn with_autowire_candidate(mut self, autowire_candidate: bool) -> Self {
        self.autowire_candidate = autowire_candidate;
        self
    }

    /// 设置为首选候选
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// 设置为抽象定义
    pub fn with_abstract(mut self, abstract_definition: bool) -> Self {
        self.abstract_definition = abstract_definition;
        self
    }

    /// 添加前置依赖
    pub fn with_depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// 添加限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifiers.push(qualifier.into());
        self
    }

    /// 添加属性值
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.property_values.insert(key.into(), value);
        self
    }

    /// 是否为工厂型组件
    pub fn is_factory(&self) -> bool {
        matches!(self.kind, DefinitionKind::Factory { .. })
    }

    /// 注册前校验定义
    pub fn validate(&self, name: &str) -> DependencyResult<()> {
        if name.is_empty() {
            return Err(DependencyError::invalid_definition(name, "组件名称不能为空"));
        }
        if self.parent_name.as_deref() == Some(name) {
            return Err(DependencyError::invalid_definition(name, "定义不能以自身为父定义"));
        }
        if !self.abstract_definition
            && !self.is_factory()
            && self.component_type.is_none()
            && self.parent_name.is_none()
        {
            return Err(DependencyError::invalid_definition(
                name,
                "非抽象定义必须指定实现类型或父定义",
            ));
        }
        Ok(())
    }
}

/// 合并后的组件定义
///
/// 父定义链已经解析完毕，所有可选设置都已有确定值。
/// 由冻结控制器缓存，注册表变更时失效。
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDefinition {
    /// 组件名称
    pub name: String,
    /// 实现类型
    pub component_type: Option<ComponentType>,
    /// 定义种类
    pub kind: DefinitionKind,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 是否延迟初始化
    pub lazy_init: bool,
    /// 是否参与自动装配
    pub autowire_candidate: bool,
    /// 是否为首选候选
    pub primary: bool,
    /// 候选优先级
    pub priority: Option<i32>,
    /// 是否为抽象定义
    pub abstract_definition: bool,
    /// 前置依赖
    pub depends_on: Vec<String>,
    /// 限定符
    pub qualifiers: Vec<String>,
    /// 属性值
    pub property_values: BTreeMap<String, serde_json::Value>,
}

impl MergedDefinition {
    /// 从没有父定义的定义创建
    pub fn root(name: impl Into<String>, definition: &ComponentDefinition) -> Self {
        Self {
            name: name.into(),
            component_type: definition.component_type.clone(),
            kind: definition.kind.clone(),
            lifetime: definition.lifetime.unwrap_or_default(),
            lazy_init: definition.lazy_init.unwrap_or(false),
            autowire_candidate: definition.autowire_candidate,
            primary: definition.primary,
            priority: definition.priority,
            abstract_definition: definition.abstract_definition,
            depends_on: definition.depends_on.clone(),
            qualifiers: definition.qualifiers.clone(),
            property_values: definition.property_values.clone(),
        }
    }

    /// 以父定义为基础，用子定义中显式设置的值覆盖
    pub fn merge(parent: &Self, name: impl Into<String>, child: &ComponentDefinition) -> Self {
        let kind = if child.is_factory() || child.component_type.is_some() {
            child.kind.clone()
        } else {
            parent.kind.clone()
        };

        let mut qualifiers = parent.qualifiers.clone();
        for qualifier in &child.qualifiers {
            if !qualifiers.contains(qualifier) {
                qualifiers.push(qualifier.clone());
            }
        }

        let mut property_values = parent.property_values.clone();
        property_values.extend(
            child
                .property_values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            name: name.into(),
            component_type: child
                .component_type
                .clone()
                .or_else(|| parent.component_type.clone()),
            kind,
            lifetime: child.lifetime.unwrap_or(parent.lifetime),
            lazy_init: child.lazy_init.unwrap_or(parent.lazy_init),
            autowire_candidate: child.autowire_candidate,
            primary: child.primary,
            priority: child.priority.or(parent.priority),
            abstract_definition: child.abstract_definition,
            depends_on: if child.depends_on.is_empty() {
                parent.depends_on.clone()
            } else {
                child.depends_on.clone()
            },
            qualifiers,
            property_values,
        }
    }

    /// 是否为工厂型组件
    pub fn is_factory(&self) -> bool {
        matches!(self.kind, DefinitionKind::Factory { .. })
    }

    /// 是否为需要预实例化的单例：非抽象、单例、非延迟
    pub fn is_eager_singleton(&self) -> bool {
        !self.abstract_definition && self.lifetime.is_singleton() && !self.lazy_init
    }

    /// 参与类型匹配的类型：工厂型组件暴露产品类型
    pub fn exposed_type(&self) -> Option<&ComponentType> {
        match &self.kind {
            DefinitionKind::Factory { product_type } => Some(product_type),
            DefinitionKind::Direct => self.component_type.as_ref(),
        }
    }

    /// 限定符匹配：组件名称本身也视为限定符
    pub fn matches_qualifier(&self, qualifier: &str) -> bool {
        self.name == qualifier || self.qualifiers.iter().any(|q| q == qualifier)
    }
}
