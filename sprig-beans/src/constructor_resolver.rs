//! Constructor-based instantiation.
//!
//! The number of configured arguments selects candidate constructors of the same arity. Arguments
//! are resolved once, then each candidate, in declaration order, gets a chance to convert them to
//! its parameter types. The first candidate accepting all arguments is invoked. There is no scoring
//! between multiple candidates which would all accept the arguments - declaration order decides.

use crate::bean_class::BeanBox;
use crate::definition::BeanDefinition;
use crate::error::{BeanFactoryError, ConstructorResolutionError, ConversionError};
use crate::factory::{creation_error, wrap_creation_error, DefaultBeanFactory};
use crate::value::Value;
use crate::value_resolver::BeanDefinitionValueResolver;
use itertools::Itertools;
use std::sync::Arc;
use tracing::debug;

pub struct ConstructorResolver<'a> {
    bean_factory: &'a DefaultBeanFactory,
}

impl<'a> ConstructorResolver<'a> {
    pub fn new(bean_factory: &'a DefaultBeanFactory) -> Self {
        Self { bean_factory }
    }

    /// Creates an instance for the definition using its constructor arguments.
    pub fn autowire_constructor(
        &self,
        definition: &BeanDefinition,
    ) -> Result<BeanBox, BeanFactoryError> {
        let class = self
            .bean_factory
            .resolve_bean_class(definition)
            .map_err(|error| creation_error(definition, Arc::new(error)))?;

        let value_resolver = BeanDefinitionValueResolver::new(self.bean_factory);
        let arguments: Vec<Value> = definition
            .constructor_arguments()
            .iter()
            .map(|argument| value_resolver.resolve_value_if_necessary(argument, definition.id()))
            .try_collect()
            .map_err(|error| wrap_creation_error(definition, error))?;

        let type_converter = self.bean_factory.type_converter();
        for constructor in class
            .constructors()
            .iter()
            .filter(|constructor| constructor.arity() == arguments.len())
        {
            let converted: Result<Vec<Value>, ConversionError> = arguments
                .iter()
                .cloned()
                .zip(constructor.parameter_types())
                .map(|(argument, parameter_type)| {
                    type_converter.convert_if_necessary(argument, parameter_type)
                })
                .collect();

            match converted {
                Ok(converted) => {
                    return constructor
                        .construct(converted)
                        .map_err(|error| creation_error(definition, error));
                }
                Err(error) => {
                    debug!(
                        bean = definition.id(),
                        parameters = ?constructor.parameter_types(),
                        %error,
                        "Skipping constructor not accepting configured arguments."
                    );
                }
            }
        }

        Err(creation_error(
            definition,
            Arc::new(ConstructorResolutionError::NoMatchingConstructor {
                class_name: class.name().to_string(),
                arity: arguments.len(),
            }),
        ))
    }
}
