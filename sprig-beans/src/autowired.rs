//! Injection of dependencies by type, rather than by configured references.
//!
//! Bean classes declare [InjectionPoint](crate::bean_class::InjectionPoint)s, usually by marking
//! fields with `#[bean(autowired)]`. When [AutowiredPostProcessor] is registered, each injection
//! point is resolved with
//! [BeanFactory::resolve_dependency](crate::bean_factory::BeanFactory::resolve_dependency) before
//! configured properties are set.
//! `Arc<T>` fields are required dependencies, while `Option<Arc<T>>` fields are left empty when
//! nothing matches.

use crate::bean_class::{BeanPtr, DependencyDescriptor};
use crate::bean_factory::BeanFactoryRef;
use crate::error::{AutowiringError, ConversionError, ErrorPtr};
use crate::post_processor::{BeanPostProcessor, InstantiationAwareBeanPostProcessor};
use crate::value::ValueType;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::trace;

/// Types which can be injected by type.
pub trait Autowirable: Sized {
    fn dependency_descriptor() -> DependencyDescriptor;

    fn from_dependency(dependency: Option<BeanPtr>) -> Result<Self, ConversionError>;
}

fn downcast<T: Any + Send + Sync>(bean: BeanPtr) -> Result<Arc<T>, ConversionError> {
    bean.downcast::<T>()
        .map_err(|_| ConversionError::IncompatibleBean(type_name::<T>()))
}

impl<T: Any + Send + Sync> Autowirable for Arc<T> {
    #[inline]
    fn dependency_descriptor() -> DependencyDescriptor {
        DependencyDescriptor::of::<T>(true)
    }

    fn from_dependency(dependency: Option<BeanPtr>) -> Result<Self, ConversionError> {
        dependency
            .ok_or(ConversionError::NullValue(ValueType::Bean))
            .and_then(downcast::<T>)
    }
}

impl<T: Any + Send + Sync> Autowirable for Option<Arc<T>> {
    #[inline]
    fn dependency_descriptor() -> DependencyDescriptor {
        DependencyDescriptor::of::<T>(false)
    }

    fn from_dependency(dependency: Option<BeanPtr>) -> Result<Self, ConversionError> {
        dependency.map(downcast::<T>).transpose()
    }
}

/// Post-processor injecting dependencies into declared injection points.
pub struct AutowiredPostProcessor {
    bean_factory: BeanFactoryRef,
}

impl AutowiredPostProcessor {
    pub fn new(bean_factory: BeanFactoryRef) -> Self {
        Self { bean_factory }
    }
}

impl BeanPostProcessor for AutowiredPostProcessor {
    fn instantiation_aware(&self) -> Option<&dyn InstantiationAwareBeanPostProcessor> {
        Some(self)
    }
}

impl InstantiationAwareBeanPostProcessor for AutowiredPostProcessor {
    fn post_process_property_values(
        &self,
        bean: &mut (dyn Any + Send + Sync),
        bean_name: &str,
    ) -> Result<(), ErrorPtr> {
        let bean_factory = self
            .bean_factory
            .upgrade()
            .ok_or_else(|| Arc::new(AutowiringError::FactoryUnavailable) as ErrorPtr)?;

        let class = bean_factory
            .bean_type(bean_name)
            .map_err(|error| Arc::new(error) as ErrorPtr)?;

        for injection_point in class.injection_points() {
            trace!(
                bean = bean_name,
                field = injection_point.field_name(),
                dependency = injection_point.dependency().type_name(),
                "Autowiring dependency."
            );

            let dependency = bean_factory
                .resolve_dependency(injection_point.dependency())
                .map_err(|error| Arc::new(error) as ErrorPtr)?;

            injection_point.inject(bean, dependency)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::autowired::{Autowirable, AutowiredPostProcessor};
    use crate::bean_class::internal::inject_dependency;
    use crate::bean_class::{BeanClass, BeanPtr};
    use crate::bean_factory::{BeanFactory, BeanFactoryRef, TypedBeanFactory};
    use crate::definition::BeanDefinition;
    use crate::definition_registry::DefinitionRegistry;
    use crate::error::{AutowiringError, BeanFactoryError, ConversionError};
    use crate::post_processor::InstantiationAwareBeanPostProcessor;
    use crate::factory::{DefaultBeanFactory, DefaultBeanFactoryBuilder};
    use crate::type_loader::TypeRegistry;
    use std::sync::Arc;

    #[derive(Default, Debug)]
    struct Repository;

    #[derive(Default)]
    struct Cache;

    #[derive(Default)]
    struct Service {
        repository: Option<Arc<Repository>>,
        cache: Option<Arc<Cache>>,
    }

    #[derive(Default)]
    struct StrictService {
        cache: Option<Arc<Cache>>,
    }

    fn create_factory(definitions: Vec<BeanDefinition>) -> Arc<DefaultBeanFactory> {
        let factory = DefaultBeanFactoryBuilder::new()
            .with_type_loader(Box::new(
                TypeRegistry::new()
                    .with_class(
                        BeanClass::of::<Repository>("test::Repository")
                            .with_default_constructor(|| Ok(Box::<Repository>::default())),
                    )
                    .with_class(
                        BeanClass::of::<Cache>("test::Cache")
                            .with_default_constructor(|| Ok(Box::<Cache>::default())),
                    )
                    .with_class(
                        BeanClass::of::<Service>("test::Service")
                            .with_default_constructor(|| Ok(Box::<Service>::default()))
                            .with_injection_point(
                                "repository",
                                <Arc<Repository>>::dependency_descriptor(),
                                |bean, dependency| {
                                    inject_dependency::<Service, Arc<Repository>>(
                                        bean,
                                        dependency,
                                        |service, repository| {
                                            service.repository = Some(repository)
                                        },
                                    )
                                },
                            )
                            .with_injection_point(
                                "cache",
                                <Option<Arc<Cache>>>::dependency_descriptor(),
                                |bean, dependency| {
                                    inject_dependency::<Service, Option<Arc<Cache>>>(
                                        bean,
                                        dependency,
                                        |service, cache| service.cache = cache,
                                    )
                                },
                            ),
                    )
                    .with_class(
                        BeanClass::of::<StrictService>("test::StrictService")
                            .with_default_constructor(|| Ok(Box::<StrictService>::default()))
                            .with_injection_point(
                                "cache",
                                <Arc<Cache>>::dependency_descriptor(),
                                |bean, dependency| {
                                    inject_dependency::<StrictService, Arc<Cache>>(
                                        bean,
                                        dependency,
                                        |service, cache| service.cache = Some(cache),
                                    )
                                },
                            ),
                    ),
            ))
            .build();

        factory.add_bean_post_processor(Arc::new(AutowiredPostProcessor::new(
            factory.bean_factory_ref(),
        )));

        for definition in definitions {
            factory.register_bean_definition(definition).unwrap();
        }

        factory
    }

    #[test]
    fn should_convert_dependencies() {
        let bean = Arc::new(Repository) as BeanPtr;

        assert!(<Arc<Repository>>::from_dependency(Some(bean.clone())).is_ok());
        assert_eq!(
            <Arc<Repository>>::from_dependency(None).unwrap_err(),
            ConversionError::NullValue(crate::value::ValueType::Bean)
        );
        assert!(<Option<Arc<Repository>>>::from_dependency(None)
            .unwrap()
            .is_none());
        assert!(<Option<Arc<Cache>>>::from_dependency(Some(bean)).is_err());
        assert!(<Arc<Cache>>::dependency_descriptor().is_required());
        assert!(!<Option<Arc<Cache>>>::dependency_descriptor().is_required());
    }

    #[test]
    fn should_inject_dependencies_by_type() {
        let factory = create_factory(vec![
            BeanDefinition::new("service", "test::Service"),
            BeanDefinition::new("repository", "test::Repository"),
        ]);

        let service = factory.bean_typed::<Service>("service").unwrap().unwrap();
        let repository = factory
            .bean_typed::<Repository>("repository")
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(service.repository.as_ref().unwrap(), &repository));
        assert!(service.cache.is_none());
    }

    #[test]
    fn should_fail_on_missing_required_dependency() {
        let factory = create_factory(vec![BeanDefinition::new("service", "test::StrictService")]);

        assert!(matches!(
            factory.bean("service").unwrap_err(),
            BeanFactoryError::BeanCreation { bean_name, source, .. }
                if bean_name == "service"
                    && matches!(
                        source.downcast_ref::<BeanFactoryError>(),
                        Some(BeanFactoryError::NoSuchBeanOfType(_))
                    )
        ));
    }

    #[test]
    fn should_fail_when_factory_is_gone() {
        let bean_factory: BeanFactoryRef = create_factory(vec![]).bean_factory_ref();
        let post_processor = AutowiredPostProcessor::new(bean_factory);
        let mut service = Service::default();

        let error = post_processor
            .post_process_property_values(&mut service, "service")
            .unwrap_err();

        assert_eq!(
            error.downcast_ref::<AutowiringError>(),
            Some(&AutowiringError::FactoryUnavailable)
        );
    }
}
