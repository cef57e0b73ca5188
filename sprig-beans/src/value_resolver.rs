//! Resolution of [ConfiguredValue]s. This is where references between definitions turn into an
//! object graph: resolving a reference asks the factory for the referenced bean, which in turn may
//! create it.

use crate::bean_factory::BeanFactory;
use crate::error::BeanFactoryError;
use crate::value::{ConfiguredValue, Value};
use itertools::Itertools;
use tracing::trace;

pub struct BeanDefinitionValueResolver<'a> {
    bean_factory: &'a dyn BeanFactory,
}

impl<'a> BeanDefinitionValueResolver<'a> {
    pub fn new(bean_factory: &'a dyn BeanFactory) -> Self {
        Self { bean_factory }
    }

    /// Resolves the value for the bean with the given name. Literals are returned unchanged as text
    /// and references to discarded beans resolve to [Value::Null].
    pub fn resolve_value_if_necessary(
        &self,
        value: &ConfiguredValue,
        bean_name: &str,
    ) -> Result<Value, BeanFactoryError> {
        match value {
            ConfiguredValue::Literal(text) => Ok(Value::Text(text.clone())),
            ConfiguredValue::Reference(target) => {
                trace!(bean = bean_name, reference = %target, "Resolving bean reference.");

                Ok(self
                    .bean_factory
                    .bean(target)?
                    .map(Value::Bean)
                    .unwrap_or(Value::Null))
            }
            ConfiguredValue::Collection(values) => values
                .iter()
                .map(|value| self.resolve_value_if_necessary(value, bean_name))
                .try_collect()
                .map(Value::List),
        }
    }
}
