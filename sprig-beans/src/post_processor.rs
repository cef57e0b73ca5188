//! Extension points of the bean creation process.
//!
//! Post-processors are invoked in the order they were added to the
//! [DefaultBeanFactory](crate::factory::DefaultBeanFactory), for every bean it creates. A
//! post-processor can additionally take part in property population by exposing
//! [InstantiationAwareBeanPostProcessor] through [BeanPostProcessor::instantiation_aware].

use crate::bean_class::BeanPtr;
use crate::error::ErrorPtr;
use std::any::Any;
use std::sync::Arc;

pub type BeanPostProcessorPtr = Arc<dyn BeanPostProcessor + Send + Sync>;

/// Hook called for each bean after it has been constructed and populated.
pub trait BeanPostProcessor {
    /// Returns the instantiation-aware view of this post-processor, if it has one.
    fn instantiation_aware(&self) -> Option<&dyn InstantiationAwareBeanPostProcessor> {
        None
    }

    /// Processes a fully populated bean. The returned bean is passed to the next post-processor
    /// and eventually returned by the factory, so it may be a replacement of the original.
    /// Returning `None` discards the bean and stops the chain.
    fn post_process_after_initialization(
        &self,
        bean: BeanPtr,
        _bean_name: &str,
    ) -> Result<Option<BeanPtr>, ErrorPtr> {
        Ok(Some(bean))
    }
}

/// Hook called after instantiation, before configured property values are applied.
pub trait InstantiationAwareBeanPostProcessor {
    fn post_process_property_values(
        &self,
        bean: &mut (dyn Any + Send + Sync),
        bean_name: &str,
    ) -> Result<(), ErrorPtr>;
}
