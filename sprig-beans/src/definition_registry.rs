//! Functionality related to registering bean definitions. Definitions are usually produced by an
//! external loader, e.g. from a configuration file, and read by the
//! [DefaultBeanFactory](crate::factory::DefaultBeanFactory) whenever a bean is requested.

use crate::definition::{BeanDefinition, BeanDefinitionPtr};
use crate::definition_registry::registry::NamedDefinitionMap;
use crate::error::DefinitionRegistryError;
#[cfg(test)]
use mockall::automock;
use parking_lot::RwLock;

/// A registry of bean definitions. Registries are shared between threads, so registration takes
/// `&self` and implementations take care of synchronization.
#[cfg_attr(test, automock)]
pub trait DefinitionRegistry {
    /// Adds a new definition. Handling of duplicate names is registry-dependent.
    fn register_bean_definition(
        &self,
        definition: BeanDefinition,
    ) -> Result<(), DefinitionRegistryError>;

    /// Returns a definition with given name.
    fn bean_definition(&self, name: &str) -> Option<BeanDefinitionPtr>;

    /// Checks if there's a definition with given name.
    fn contains_bean_definition(&self, name: &str) -> bool;

    /// Returns all definition names in registration order.
    fn bean_definition_names(&self) -> Vec<String>;

    /// Returns all definitions in registration order.
    fn bean_definitions(&self) -> Vec<BeanDefinitionPtr>;
}

/// Default thread-safe registry. Iteration follows registration order, and overriding a
/// definition keeps the position of the original one.
#[derive(Debug)]
pub struct DefaultDefinitionRegistry {
    definition_map: RwLock<NamedDefinitionMap>,
    allow_definition_overriding: bool,
}

impl Default for DefaultDefinitionRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DefaultDefinitionRegistry {
    pub fn new(allow_definition_overriding: bool) -> Self {
        Self {
            definition_map: Default::default(),
            allow_definition_overriding,
        }
    }
}

impl DefinitionRegistry for DefaultDefinitionRegistry {
    #[inline]
    fn register_bean_definition(
        &self,
        definition: BeanDefinition,
    ) -> Result<(), DefinitionRegistryError> {
        self.definition_map
            .write()
            .try_register_definition(definition, self.allow_definition_overriding)
    }

    #[inline]
    fn bean_definition(&self, name: &str) -> Option<BeanDefinitionPtr> {
        self.definition_map.read().definition_by_name(name)
    }

    #[inline]
    fn contains_bean_definition(&self, name: &str) -> bool {
        self.definition_map.read().is_name_registered(name)
    }

    #[inline]
    fn bean_definition_names(&self) -> Vec<String> {
        self.definition_map.read().names()
    }

    #[inline]
    fn bean_definitions(&self) -> Vec<BeanDefinitionPtr> {
        self.definition_map.read().all_definitions()
    }
}

mod registry {
    use crate::definition::{BeanDefinition, BeanDefinitionPtr};
    use crate::error::DefinitionRegistryError;
    use fxhash::FxHashMap;
    use std::sync::Arc;
    use tracing::debug;

    #[derive(Default, Clone, Debug)]
    pub(super) struct NamedDefinitionMap {
        definitions: Vec<BeanDefinitionPtr>,
        names: FxHashMap<String, usize>,
    }

    impl NamedDefinitionMap {
        pub(super) fn definition_by_name(&self, name: &str) -> Option<BeanDefinitionPtr> {
            self.names
                .get(name)
                .and_then(|index| self.definitions.get(*index))
                .cloned()
        }

        pub(super) fn try_register_definition(
            &mut self,
            definition: BeanDefinition,
            allow_definition_overriding: bool,
        ) -> Result<(), DefinitionRegistryError> {
            if let Some(index) = self.names.get(definition.id()).copied() {
                if !allow_definition_overriding {
                    return Err(DefinitionRegistryError::DuplicateBeanName(
                        definition.id().to_string(),
                    ));
                }

                debug!(bean = definition.id(), "Overriding bean definition.");

                self.definitions[index] = Arc::new(definition);
            } else {
                self.names
                    .insert(definition.id().to_string(), self.definitions.len());
                self.definitions.push(Arc::new(definition));
            }

            Ok(())
        }

        #[inline]
        pub(super) fn is_name_registered(&self, name: &str) -> bool {
            self.names.contains_key(name)
        }

        pub(super) fn names(&self) -> Vec<String> {
            self.definitions
                .iter()
                .map(|definition| definition.id().to_string())
                .collect()
        }

        #[inline]
        pub(super) fn all_definitions(&self) -> Vec<BeanDefinitionPtr> {
            self.definitions.clone()
        }
    }

}

#[cfg(test)]
mod tests {
    use crate::definition::BeanDefinition;
    use crate::definition_registry::{DefaultDefinitionRegistry, DefinitionRegistry};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn should_override_by_default() {
        let registry = DefaultDefinitionRegistry::default();
        registry
            .register_bean_definition(BeanDefinition::new("a", "test::A"))
            .unwrap();
        registry
            .register_bean_definition(BeanDefinition::new("a", "test::B"))
            .unwrap();

        assert_eq!(
            registry.bean_definition("a").unwrap().class_name(),
            "test::B"
        );
        assert_eq!(registry.bean_definitions().len(), 1);
    }

    #[test]
    fn should_reject_duplicates_when_configured() {
        let registry = DefaultDefinitionRegistry::new(false);
        registry
            .register_bean_definition(BeanDefinition::new("a", "test::A"))
            .unwrap();

        assert!(registry
            .register_bean_definition(BeanDefinition::new("a", "test::B"))
            .is_err());
    }

    #[test]
    fn should_register_concurrently() {
        let registry = Arc::new(DefaultDefinitionRegistry::default());

        let handles: Vec<_> = (0..4)
            .map(|thread_index| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for index in 0..50 {
                        registry
                            .register_bean_definition(BeanDefinition::new(
                                format!("bean_{thread_index}_{index}"),
                                "test::A",
                            ))
                            .unwrap();
                        assert!(registry.bean_definitions().len() > index);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.bean_definition_names().len(), 200);
        assert!(registry.contains_bean_definition("bean_3_49"));
    }
}
