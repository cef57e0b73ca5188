//! Declarative description of a single bean.

use crate::bean_class::BeanClassPtr;
use crate::error::TypeLoadError;
use crate::scope::Scope;
use crate::type_loader::TypeLoader;
use crate::value::ConfiguredValue;
use once_cell::sync::OnceCell;
use std::sync::Arc;

pub type BeanDefinitionPtr = Arc<BeanDefinition>;

/// A named value to be set on a bean after instantiation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropertyValue {
    name: String,
    value: ConfiguredValue,
}

impl PropertyValue {
    pub fn new<T: Into<String>>(name: T, value: ConfiguredValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &ConfiguredValue {
        &self.value
    }
}

/// Definition of a bean registered in a
/// [DefinitionRegistry](crate::definition_registry::DefinitionRegistry). Definitions are immutable
/// once registered, except for the lazily resolved [BeanClass](crate::bean_class::BeanClass), which
/// is computed at most once.
#[derive(Clone, Debug)]
pub struct BeanDefinition {
    id: String,
    class_name: String,
    scope: Scope,
    constructor_arguments: Vec<ConfiguredValue>,
    property_values: Vec<PropertyValue>,
    synthetic: bool,
    lazy_init: bool,
    resolved_class: OnceCell<BeanClassPtr>,
}

impl BeanDefinition {
    /// Creates a singleton definition for the given type name, without any arguments.
    pub fn new<I: Into<String>, C: Into<String>>(id: I, class_name: C) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            scope: Scope::default(),
            constructor_arguments: vec![],
            property_values: vec![],
            synthetic: false,
            lazy_init: false,
            resolved_class: OnceCell::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_constructor_argument(mut self, value: ConfiguredValue) -> Self {
        self.constructor_arguments.push(value);
        self
    }

    pub fn with_constructor_arguments<I: IntoIterator<Item = ConfiguredValue>>(
        mut self,
        values: I,
    ) -> Self {
        self.constructor_arguments.extend(values);
        self
    }

    pub fn with_property_value<T: Into<String>>(mut self, name: T, value: ConfiguredValue) -> Self {
        self.property_values.push(PropertyValue::new(name, value));
        self
    }

    /// Marks the definition as synthetic: post-initialization processors are not applied to its
    /// beans.
    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Lazy singletons are not created by
    /// [preinstantiate_singletons](crate::factory::DefaultBeanFactory::preinstantiate_singletons).
    pub fn with_lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = lazy_init;
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    #[inline]
    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    #[inline]
    pub fn constructor_arguments(&self) -> &[ConfiguredValue] {
        &self.constructor_arguments
    }

    #[inline]
    pub fn has_constructor_arguments(&self) -> bool {
        !self.constructor_arguments.is_empty()
    }

    #[inline]
    pub fn property_values(&self) -> &[PropertyValue] {
        &self.property_values
    }

    /// Returns the class, if already resolved.
    #[inline]
    pub fn bean_class(&self) -> Option<&BeanClassPtr> {
        self.resolved_class.get()
    }

    /// Resolves the class with the given loader on first use and caches it. Later calls never reach
    /// the loader, even when made concurrently.
    pub fn resolve_bean_class(&self, loader: &dyn TypeLoader) -> Result<BeanClassPtr, TypeLoadError> {
        self.resolved_class
            .get_or_try_init(|| loader.load_type(&self.class_name))
            .cloned()
    }
}
