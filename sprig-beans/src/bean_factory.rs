//! Retrieval interface of the container.

use crate::bean_class::{BeanClassPtr, BeanPtr, DependencyDescriptor};
use crate::error::BeanFactoryError;
use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, Weak};

/// Non-owning reference to a bean factory, as given to beans which want to know their container.
pub type BeanFactoryRef = Weak<dyn BeanFactory>;

/// Generic provider of beans.
pub trait BeanFactory: Send + Sync {
    /// Returns the bean with the given name, creating it if needed. `Ok(None)` means a
    /// post-processor discarded the bean.
    fn bean(&self, name: &str) -> Result<Option<BeanPtr>, BeanFactoryError>;

    /// Returns all beans assignable to the given type. Definitions whose type cannot be loaded are
    /// skipped.
    fn beans_by_type(&self, type_id: TypeId) -> Result<Vec<BeanPtr>, BeanFactoryError>;

    /// Returns names of all definitions assignable to the given type, in registration order.
    fn bean_names_by_type(&self, type_id: TypeId) -> Vec<String>;

    /// Returns the class of the bean with the given name.
    fn bean_type(&self, name: &str) -> Result<BeanClassPtr, BeanFactoryError>;

    /// Returns the first bean assignable to the type described by the descriptor, in registration
    /// order. Returns `Ok(None)` when nothing matches, unless the dependency is required.
    fn resolve_dependency(
        &self,
        descriptor: &DependencyDescriptor,
    ) -> Result<Option<BeanPtr>, BeanFactoryError>;

    /// Checks if there's a definition with given name.
    fn contains_bean(&self, name: &str) -> bool;
}

/// Implemented by beans which want a reference to the factory which created them.
pub trait BeanFactoryAware {
    fn set_bean_factory(&mut self, bean_factory: BeanFactoryRef);
}

/// Helper trait for [BeanFactory] providing strongly-typed access.
pub trait TypedBeanFactory {
    /// Typesafe version of [BeanFactory::bean] for concrete types.
    fn bean_typed<T: Any + Send + Sync>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, BeanFactoryError>;

    /// Typesafe version of [BeanFactory::beans_by_type]. `T` can be a concrete type or an alias
    /// declared by bean classes, e.g. a `dyn Trait`.
    fn beans_by_type_typed<T: ?Sized + 'static>(&self) -> Result<Vec<Arc<T>>, BeanFactoryError>;
}

impl<F: BeanFactory + ?Sized> TypedBeanFactory for F {
    fn bean_typed<T: Any + Send + Sync>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, BeanFactoryError> {
        self.bean(name)?
            .map(|bean| {
                bean.downcast::<T>()
                    .map_err(|_| BeanFactoryError::IncompatibleBean {
                        bean_name: name.to_string(),
                        type_name: type_name::<T>(),
                    })
            })
            .transpose()
    }

    fn beans_by_type_typed<T: ?Sized + 'static>(&self) -> Result<Vec<Arc<T>>, BeanFactoryError> {
        let mut result = vec![];
        for name in self.bean_names_by_type(TypeId::of::<T>()) {
            if let Some(bean) = self.bean(&name)? {
                let bean = self.bean_type(&name)?.cast::<T>(bean).map_err(|_| {
                    BeanFactoryError::IncompatibleBean {
                        bean_name: name.clone(),
                        type_name: type_name::<T>(),
                    }
                })?;
                result.push(bean);
            }
        }

        Ok(result)
    }
}
