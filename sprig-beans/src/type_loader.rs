//! Turning type names from bean definitions into [BeanClass]es.

use crate::bean_class::{BeanClass, BeanClassPtr, BeanType};
use crate::error::TypeLoadError;
use fxhash::FxHashMap;
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use tracing::{debug, trace};

/// Loads classes by name.
#[cfg_attr(test, automock)]
pub trait TypeLoader {
    /// Returns the class registered under the given name, or [TypeLoadError::TypeNotFound].
    fn load_type(&self, name: &str) -> Result<BeanClassPtr, TypeLoadError>;
}

/// [TypeLoader] backed by a map of known classes. Classes can be registered explicitly or
/// discovered from types deriving `Bean`.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    classes: FxHashMap<String, BeanClassPtr>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry containing all statically registered classes.
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for registerer in inventory::iter::<internal::BeanClassRegisterer> {
            registry.register_class((registerer.register)());
        }

        debug!(
            classes = ?registry.classes.keys().sorted().collect_vec(),
            "Discovered bean classes."
        );

        registry
    }

    /// Registers a class under its name, replacing any previous class with the same name.
    pub fn register_class(&mut self, class: BeanClass) {
        trace!(
            class = class.name(),
            types = ?class.assignable_type_names().collect_vec(),
            "Registering bean class."
        );
        self.classes
            .insert(class.name().to_string(), Arc::new(class));
    }

    /// Registers the generated class of the given type.
    pub fn register<T: BeanType>(&mut self) {
        self.register_class(T::bean_class());
    }

    pub fn with_class(mut self, class: BeanClass) -> Self {
        self.register_class(class);
        self
    }

    pub fn with_type<T: BeanType>(mut self) -> Self {
        self.register::<T>();
        self
    }

    #[inline]
    pub fn contains_type(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}

impl TypeLoader for TypeRegistry {
    fn load_type(&self, name: &str) -> Result<BeanClassPtr, TypeLoadError> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| TypeLoadError::TypeNotFound(name.to_string()))
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::bean_class::BeanClass;
    use inventory::collect;
    pub use inventory::submit;

    pub struct BeanClassRegisterer {
        pub register: fn() -> BeanClass,
    }

    collect!(BeanClassRegisterer);
}

#[cfg(test)]
mod tests {
    use crate::bean_class::{BeanClass, BeanType};
    use crate::error::TypeLoadError;
    use crate::type_loader::{TypeLoader, TypeRegistry};

    struct TestBean;

    impl BeanType for TestBean {
        fn bean_class() -> BeanClass {
            BeanClass::of::<TestBean>("test::TestBean")
        }
    }

    #[test]
    fn should_load_registered_types() {
        let registry = TypeRegistry::new().with_type::<TestBean>();

        assert!(registry.contains_type("test::TestBean"));
        assert_eq!(
            registry.load_type("test::TestBean").unwrap().bean_type_id(),
            std::any::TypeId::of::<TestBean>()
        );
    }

    #[test]
    fn should_report_missing_types() {
        let registry = TypeRegistry::new();

        assert_eq!(
            registry.load_type("test::Missing").unwrap_err(),
            TypeLoadError::TypeNotFound("test::Missing".to_string())
        );
    }

    #[test]
    fn should_replace_classes_with_same_name() {
        let registry = TypeRegistry::new()
            .with_class(BeanClass::of::<u8>("test::Number"))
            .with_class(BeanClass::of::<u16>("test::Number"));

        assert_eq!(
            registry.load_type("test::Number").unwrap().bean_type_id(),
            std::any::TypeId::of::<u16>()
        );
    }
}
