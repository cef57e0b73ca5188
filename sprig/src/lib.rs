//! Application bootstrapping for [sprig_beans] bean containers.
//!
//! A bean factory on its own only knows the definitions explicitly registered in it. Applications
//! usually want more: definitions read from files, autowiring enabled, logging configured and all
//! eager singletons created up front, so that wiring errors surface at startup rather than on
//! first use. [ApplicationContextBuilder](application::ApplicationContextBuilder) does exactly
//! that, using [ApplicationConfig](config::ApplicationConfig) loaded from the environment.
//!
//! ```no_run
//! use sprig::application::ApplicationContextBuilder;
//! use sprig_beans::bean_factory::TypedBeanFactory;
//! use sprig_beans::Bean;
//!
//! #[derive(Bean, Default)]
//! #[bean(default, name = "app::Greeting")]
//! struct Greeting {
//!     #[bean(property)]
//!     text: String,
//! }
//!
//! let context = ApplicationContextBuilder::new()
//!     .with_definition_document(
//!         r#"{ "beans": [{ "id": "greeting", "class": "app::Greeting", "properties": { "text": "Hi" } }] }"#,
//!         config::FileFormat::Json,
//!     )
//!     .build()
//!     .expect("error creating context");
//!
//! let greeting = context
//!     .bean_factory()
//!     .bean_typed::<Greeting>("greeting")
//!     .expect("error creating greeting")
//!     .expect("greeting discarded");
//! assert_eq!(greeting.text, "Hi");
//! ```

pub mod application;
pub mod config;
pub mod definition_reader;
