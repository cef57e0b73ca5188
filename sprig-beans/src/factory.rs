//! Core functionality for creating beans.
//!
//! [DefaultBeanFactory] reads [BeanDefinition]s from a [DefinitionRegistry] and turns them into
//! instances in three phases:
//!
//! 1. *Instantiation* - either through the [ConstructorResolver], when the definition has
//!    constructor arguments, or through the default constructor of the class.
//! 2. *Population* - instantiation-aware post-processors get mutable access to the new instance,
//!    then configured property values are resolved, converted and set. Properties unknown to the
//!    class are skipped.
//! 3. *Initialization* - factory-aware beans receive a reference to the factory, then the
//!    post-processor chain can replace or discard the instance. Synthetic definitions skip the
//!    chain.
//!
//! Singletons are created at most once and cached for the lifetime of the factory; see
//! [scope](crate::scope) for details.

use crate::bean_class::{BeanBox, BeanClass, BeanClassPtr, BeanPtr, DependencyDescriptor};
use crate::bean_factory::{BeanFactory, BeanFactoryRef};
use crate::constructor_resolver::ConstructorResolver;
use crate::definition::{BeanDefinition, BeanDefinitionPtr};
use crate::definition_registry::{DefaultDefinitionRegistry, DefinitionRegistry};
use crate::error::{
    BeanFactoryError, ConstructorResolutionError, DefinitionRegistryError, ErrorPtr,
    TypeLoadError,
};
use crate::post_processor::BeanPostProcessorPtr;
use crate::scope::{CreatedBean, InstanceScopes, Scope};
use crate::type_converter::{SimpleTypeConverter, TypeConverter};
use crate::type_loader::{TypeLoader, TypeRegistry};
use crate::value_resolver::BeanDefinitionValueResolver;
use itertools::Itertools;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

pub type DefinitionRegistryPtr = Box<dyn DefinitionRegistry + Send + Sync>;

pub type TypeLoaderPtr = Box<dyn TypeLoader + Send + Sync>;

pub type TypeConverterPtr = Box<dyn TypeConverter + Send + Sync>;

/// Wraps a failure raised while creating the bean for the given definition. Circular dependencies
/// are returned as they are, so the cycle path stays visible to the caller.
pub(crate) fn creation_error(definition: &BeanDefinition, source: ErrorPtr) -> BeanFactoryError {
    if let Some(BeanFactoryError::CircularDependency(path)) =
        source.downcast_ref::<BeanFactoryError>()
    {
        return BeanFactoryError::CircularDependency(path.clone());
    }

    BeanFactoryError::BeanCreation {
        bean_name: definition.id().to_string(),
        class_name: definition.class_name().to_string(),
        source,
    }
}

pub(crate) fn wrap_creation_error(
    definition: &BeanDefinition,
    error: BeanFactoryError,
) -> BeanFactoryError {
    match error {
        BeanFactoryError::CircularDependency(_) => error,
        error => creation_error(definition, Arc::new(error)),
    }
}

/// Builder for [DefaultBeanFactory] with sensible defaults, for easy construction.
pub struct DefaultBeanFactoryBuilder {
    definition_registry: DefinitionRegistryPtr,
    type_loader: TypeLoaderPtr,
    type_converter: TypeConverterPtr,
    post_processors: Vec<BeanPostProcessorPtr>,
}

impl Default for DefaultBeanFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultBeanFactoryBuilder {
    /// Creates a new builder with a default configuration: an empty registry which allows
    /// overriding, all discovered bean classes and [SimpleTypeConverter].
    pub fn new() -> Self {
        Self {
            definition_registry: Box::<DefaultDefinitionRegistry>::default(),
            type_loader: Box::new(TypeRegistry::discover()),
            type_converter: Box::new(SimpleTypeConverter),
            post_processors: vec![],
        }
    }

    /// Sets new [DefinitionRegistry].
    pub fn with_definition_registry(mut self, definition_registry: DefinitionRegistryPtr) -> Self {
        self.definition_registry = definition_registry;
        self
    }

    /// Sets new [TypeLoader].
    pub fn with_type_loader(mut self, type_loader: TypeLoaderPtr) -> Self {
        self.type_loader = type_loader;
        self
    }

    /// Sets new [TypeConverter].
    pub fn with_type_converter(mut self, type_converter: TypeConverterPtr) -> Self {
        self.type_converter = type_converter;
        self
    }

    /// Adds a post-processor after already added ones.
    pub fn with_bean_post_processor(mut self, post_processor: BeanPostProcessorPtr) -> Self {
        self.post_processors.push(post_processor);
        self
    }

    /// Builds resulting [DefaultBeanFactory].
    pub fn build(self) -> Arc<DefaultBeanFactory> {
        Arc::new_cyclic(|self_ref| DefaultBeanFactory {
            definition_registry: self.definition_registry,
            type_loader: self.type_loader,
            type_converter: self.type_converter,
            post_processors: RwLock::new(self.post_processors),
            scopes: InstanceScopes::default(),
            self_ref: self_ref.clone(),
        })
    }
}

/// Generic factory for beans. Uses definitions from the [DefinitionRegistry] to create instances,
/// and [InstanceScopes] to store singletons for reuse. The factory itself is a registry too, so
/// definitions can be added after it has been built.
///
/// The factory is always shared through an [Arc], since beans may hold weak references to it.
pub struct DefaultBeanFactory {
    definition_registry: DefinitionRegistryPtr,
    type_loader: TypeLoaderPtr,
    type_converter: TypeConverterPtr,
    post_processors: RwLock<Vec<BeanPostProcessorPtr>>,
    scopes: InstanceScopes,
    self_ref: Weak<DefaultBeanFactory>,
}

impl DefaultBeanFactory {
    /// Adds a post-processor to the end of the chain. Beans already created are not affected.
    pub fn add_bean_post_processor(&self, post_processor: BeanPostProcessorPtr) {
        self.post_processors.write().push(post_processor);
    }

    /// Returns a non-owning reference to this factory, e.g. for post-processors which need to look
    /// up other beans.
    #[inline]
    pub fn bean_factory_ref(&self) -> BeanFactoryRef {
        self.self_ref.clone()
    }

    #[inline]
    pub fn post_processor_count(&self) -> usize {
        self.post_processors.read().len()
    }

    /// Creates all singletons which are not marked as lazy, in registration order.
    pub fn preinstantiate_singletons(&self) -> Result<(), BeanFactoryError> {
        for definition in self.definition_registry.bean_definitions() {
            if definition.is_singleton() && !definition.is_lazy_init() {
                trace!(bean = definition.id(), "Pre-instantiating singleton.");
                self.bean(definition.id())?;
            }
        }

        debug!(
            singletons = self.scopes.singleton_count(),
            "Pre-instantiated singletons."
        );

        Ok(())
    }

    /// Checks if the singleton with given name has already been created.
    #[inline]
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.scopes.contains_singleton(name)
    }

    #[inline]
    pub fn singleton_count(&self) -> usize {
        self.scopes.singleton_count()
    }

    pub(crate) fn resolve_bean_class(
        &self,
        definition: &BeanDefinition,
    ) -> Result<BeanClassPtr, TypeLoadError> {
        definition.resolve_bean_class(self.type_loader.as_ref())
    }

    pub(crate) fn type_converter(&self) -> &dyn TypeConverter {
        self.type_converter.as_ref()
    }

    fn post_processors(&self) -> Vec<BeanPostProcessorPtr> {
        self.post_processors.read().clone()
    }

    fn required_definition(&self, name: &str) -> Result<BeanDefinitionPtr, BeanFactoryError> {
        self.definition_registry
            .bean_definition(name)
            .ok_or_else(|| BeanFactoryError::NoSuchBeanDefinition(name.to_string()))
    }

    fn matches_type(&self, definition: &BeanDefinition, type_id: TypeId) -> bool {
        match self.resolve_bean_class(definition) {
            Ok(class) => class.is_assignable_to(type_id),
            Err(error) => {
                warn!(
                    bean = definition.id(),
                    %error,
                    "Skipping bean definition with unloadable type."
                );
                false
            }
        }
    }

    fn create_bean(&self, definition: &BeanDefinition) -> CreatedBean {
        debug!(
            bean = definition.id(),
            class = definition.class_name(),
            "Creating bean."
        );

        let class = self
            .resolve_bean_class(definition)
            .map_err(|error| creation_error(definition, Arc::new(error)))?;

        let mut bean = self.instantiate(definition, &class)?;
        self.populate(definition, &class, bean.as_mut())?;
        self.initialize(definition, &class, bean)
    }

    fn instantiate(
        &self,
        definition: &BeanDefinition,
        class: &BeanClass,
    ) -> Result<BeanBox, BeanFactoryError> {
        if definition.has_constructor_arguments() {
            return ConstructorResolver::new(self).autowire_constructor(definition);
        }

        let constructor = class.default_constructor().ok_or_else(|| {
            creation_error(
                definition,
                Arc::new(ConstructorResolutionError::NoDefaultConstructor(
                    class.name().to_string(),
                )),
            )
        })?;

        constructor().map_err(|error| creation_error(definition, error))
    }

    fn populate(
        &self,
        definition: &BeanDefinition,
        class: &BeanClass,
        bean: &mut (dyn Any + Send + Sync),
    ) -> Result<(), BeanFactoryError> {
        for post_processor in self.post_processors() {
            if let Some(post_processor) = post_processor.instantiation_aware() {
                post_processor
                    .post_process_property_values(bean, definition.id())
                    .map_err(|error| creation_error(definition, error))?;
            }
        }

        let value_resolver = BeanDefinitionValueResolver::new(self);
        for property_value in definition.property_values() {
            let value = value_resolver
                .resolve_value_if_necessary(property_value.value(), definition.id())
                .map_err(|error| wrap_creation_error(definition, error))?;

            let Some(property) = class.property(property_value.name()) else {
                debug!(
                    bean = definition.id(),
                    property = property_value.name(),
                    "Skipping property unknown to bean class."
                );
                continue;
            };

            let value = self
                .type_converter
                .convert_if_necessary(value, property.value_type())
                .map_err(|error| creation_error(definition, Arc::new(error)))?;

            property
                .set(bean, value)
                .map_err(|error| creation_error(definition, error))?;
        }

        Ok(())
    }

    fn initialize(
        &self,
        definition: &BeanDefinition,
        class: &BeanClass,
        mut bean: BeanBox,
    ) -> CreatedBean {
        if let Some(factory_aware) = class.factory_aware() {
            factory_aware(bean.as_mut(), self.bean_factory_ref())
                .map_err(|error| creation_error(definition, error))?;
        }

        let bean = BeanPtr::from(bean);
        if definition.is_synthetic() {
            return Ok(Some(bean));
        }

        self.apply_bean_post_processors_after_initialization(definition, bean)
    }

    fn apply_bean_post_processors_after_initialization(
        &self,
        definition: &BeanDefinition,
        bean: BeanPtr,
    ) -> CreatedBean {
        let mut current = bean;
        for post_processor in self.post_processors() {
            match post_processor
                .post_process_after_initialization(current, definition.id())
                .map_err(|error| creation_error(definition, error))?
            {
                Some(bean) => current = bean,
                None => {
                    debug!(bean = definition.id(), "Bean discarded by post-processor.");
                    return Ok(None);
                }
            }
        }

        Ok(Some(current))
    }
}

impl BeanFactory for DefaultBeanFactory {
    fn bean(&self, name: &str) -> Result<Option<BeanPtr>, BeanFactoryError> {
        let definition = self.required_definition(name)?;
        match definition.scope() {
            Scope::Singleton => self
                .scopes
                .singleton_or_create(name, || self.create_bean(&definition)),
            Scope::Prototype => self
                .scopes
                .create_prototype(name, || self.create_bean(&definition)),
        }
    }

    fn beans_by_type(&self, type_id: TypeId) -> Result<Vec<BeanPtr>, BeanFactoryError> {
        self.bean_names_by_type(type_id)
            .iter()
            .map(|name| self.bean(name))
            .flatten_ok()
            .try_collect()
    }

    fn bean_names_by_type(&self, type_id: TypeId) -> Vec<String> {
        self.definition_registry
            .bean_definitions()
            .iter()
            .filter(|definition| self.matches_type(definition, type_id))
            .map(|definition| definition.id().to_string())
            .collect()
    }

    fn bean_type(&self, name: &str) -> Result<BeanClassPtr, BeanFactoryError> {
        let definition = self.required_definition(name)?;
        self.resolve_bean_class(&definition)
            .map_err(BeanFactoryError::from)
    }

    fn resolve_dependency(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> Result<Option<BeanPtr>, BeanFactoryError> {
        let candidate = self
            .definition_registry
            .bean_definitions()
            .into_iter()
            .find(|definition| self.matches_type(definition, descriptor.type_id()));

        let bean = match candidate {
            Some(definition) => {
                trace!(
                    bean = definition.id(),
                    dependency = descriptor.type_name(),
                    "Resolved dependency by type."
                );
                self.bean(definition.id())?
            }
            None => None,
        };

        if bean.is_none() && descriptor.is_required() {
            return Err(BeanFactoryError::NoSuchBeanOfType(
                descriptor.type_name().to_string(),
            ));
        }

        Ok(bean)
    }

    #[inline]
    fn contains_bean(&self, name: &str) -> bool {
        self.definition_registry.contains_bean_definition(name)
    }
}

impl DefinitionRegistry for DefaultBeanFactory {
    #[inline]
    fn register_bean_definition(
        &self,
        definition: BeanDefinition,
    ) -> Result<(), DefinitionRegistryError> {
        self.definition_registry.register_bean_definition(definition)
    }

    #[inline]
    fn bean_definition(&self, name: &str) -> Option<BeanDefinitionPtr> {
        self.definition_registry.bean_definition(name)
    }

    #[inline]
    fn contains_bean_definition(&self, name: &str) -> bool {
        self.definition_registry.contains_bean_definition(name)
    }

    #[inline]
    fn bean_definition_names(&self) -> Vec<String> {
        self.definition_registry.bean_definition_names()
    }

    #[inline]
    fn bean_definitions(&self) -> Vec<BeanDefinitionPtr> {
        self.definition_registry.bean_definitions()
    }
}
