//! A minimal bean container.
//!
//! Beans are described declaratively by [BeanDefinition](definition::BeanDefinition)s: a type
//! name, a [scope](scope::Scope), constructor arguments and property values, where values can be
//! literals, references to other beans or collections of those. The
//! [DefaultBeanFactory](factory::DefaultBeanFactory) turns definitions into instances on request,
//! wiring referenced beans recursively, applying [post-processors](post_processor) and caching
//! singletons.
//!
//! Rust has no runtime reflection, so every type the container can instantiate is described by a
//! [BeanClass](bean_class::BeanClass), which knows how to construct the type, set its properties
//! and view it as other types. Classes are usually generated with `#[derive(Bean)]` and discovered
//! automatically by [TypeRegistry](type_loader::TypeRegistry).
//!
//! ```
//! use sprig_beans::bean_factory::TypedBeanFactory;
//! use sprig_beans::definition::BeanDefinition;
//! use sprig_beans::definition_registry::DefinitionRegistry;
//! use sprig_beans::factory::DefaultBeanFactoryBuilder;
//! use sprig_beans::value::ConfiguredValue;
//! use sprig_beans::Bean;
//! use std::sync::Arc;
//!
//! #[derive(Bean, Default)]
//! #[bean(default, name = "doc::Greeting")]
//! struct Greeting {
//!     #[bean(property)]
//!     text: String,
//! }
//!
//! #[derive(Bean)]
//! #[bean(constructor, name = "doc::Greeter")]
//! struct Greeter {
//!     greeting: Arc<Greeting>,
//!     repeat: u32,
//! }
//!
//! let factory = DefaultBeanFactoryBuilder::new().build();
//! factory
//!     .register_bean_definition(
//!         BeanDefinition::new("greeting", "doc::Greeting")
//!             .with_property_value("text", ConfiguredValue::literal("hello")),
//!     )
//!     .unwrap();
//! factory
//!     .register_bean_definition(
//!         BeanDefinition::new("greeter", "doc::Greeter").with_constructor_arguments([
//!             ConfiguredValue::reference("greeting"),
//!             ConfiguredValue::literal(2),
//!         ]),
//!     )
//!     .unwrap();
//!
//! let greeter = factory.bean_typed::<Greeter>("greeter").unwrap().unwrap();
//! assert_eq!(greeter.greeting.text, "hello");
//! assert_eq!(greeter.repeat, 2);
//! ```

pub mod autowired;
pub mod bean_class;
pub mod bean_factory;
pub mod constructor_resolver;
pub mod definition;
pub mod definition_registry;
pub mod error;
pub mod factory;
pub mod post_processor;
pub mod scope;
pub mod type_converter;
pub mod type_loader;
pub mod value;
pub mod value_resolver;

#[cfg(feature = "derive")]
pub use sprig_beans_derive::Bean;
