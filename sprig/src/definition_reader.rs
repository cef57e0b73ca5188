//! Loading bean definitions from configuration documents.
//!
//! Documents can be in any format supported by the `config` crate. In JSON, a document looks like:
//!
//! ```json
//! {
//!     "beans": [
//!         {
//!             "id": "repository",
//!             "class": "app::Repository",
//!             "properties": { "url": "db://local", "pool": 5 }
//!         },
//!         {
//!             "id": "service",
//!             "class": "app::Service",
//!             "scope": "prototype",
//!             "lazy_init": true,
//!             "constructor_args": [{ "ref": "repository" }, { "list": ["a", "b"] }]
//!         }
//!     ]
//! }
//! ```
//!
//! Scalar values become literals, `{ "ref": name }` references another bean and
//! `{ "list": [...] }` declares a collection. Property names are kept exactly as written.

use config::{Config, ConfigError, File, FileFormat};
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer};
use sprig_beans::definition::BeanDefinition;
use sprig_beans::definition_registry::DefinitionRegistry;
use sprig_beans::error::DefinitionRegistryError;
use sprig_beans::scope::{Scope, UnrecognizedScope};
use sprig_beans::value::ConfiguredValue;
use std::collections::BTreeMap;
use std::fmt::Formatter;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Error reading definitions: {0}")]
    Read(#[from] ConfigError),
    #[error("Invalid scope of bean '{bean_name}': {source}")]
    InvalidScope {
        bean_name: String,
        source: UnrecognizedScope,
    },
    #[error("Error registering definition: {0}")]
    Registration(#[from] DefinitionRegistryError),
}

// scalar literal, kept as text
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                formatter.write_str("a string, number or boolean")
            }

            fn visit_bool<E: DeError>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: DeError>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: DeError>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: DeError>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_str<E: DeError>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: DeError>(self, v: String) -> Result<Self::Value, E> {
                Ok(Scalar(v))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueEntry {
    Reference {
        #[serde(rename = "ref")]
        reference: String,
    },
    List {
        list: Vec<ValueEntry>,
    },
    Scalar(Scalar),
}

impl From<ValueEntry> for ConfiguredValue {
    fn from(value: ValueEntry) -> Self {
        match value {
            ValueEntry::Reference { reference } => ConfiguredValue::Reference(reference),
            ValueEntry::List { list } => ConfiguredValue::collection(list.into_iter().map(Into::into)),
            ValueEntry::Scalar(Scalar(text)) => ConfiguredValue::Literal(text),
        }
    }
}

#[derive(Deserialize)]
struct BeanEntry {
    id: String,
    class: String,
    scope: Option<String>,
    lazy_init: Option<bool>,
    synthetic: Option<bool>,
    #[serde(default)]
    constructor_args: Vec<ValueEntry>,
    #[serde(default)]
    properties: BTreeMap<String, ValueEntry>,
}

impl TryFrom<BeanEntry> for BeanDefinition {
    type Error = ReaderError;

    fn try_from(entry: BeanEntry) -> Result<Self, Self::Error> {
        let scope = entry
            .scope
            .as_deref()
            .map(str::parse::<Scope>)
            .transpose()
            .map_err(|source| ReaderError::InvalidScope {
                bean_name: entry.id.clone(),
                source,
            })?
            .unwrap_or_default();

        let definition = BeanDefinition::new(entry.id, entry.class)
            .with_scope(scope)
            .with_lazy_init(entry.lazy_init.unwrap_or_default())
            .with_synthetic(entry.synthetic.unwrap_or_default())
            .with_constructor_arguments(entry.constructor_args.into_iter().map(Into::into));

        Ok(entry
            .properties
            .into_iter()
            .fold(definition, |definition, (name, value)| {
                definition.with_property_value(name, value.into())
            }))
    }
}

#[derive(Deserialize)]
struct DefinitionDocument {
    #[serde(default)]
    beans: Vec<BeanEntry>,
}

/// Reads definition documents and registers their definitions in a [DefinitionRegistry].
pub struct DefinitionReader<'a> {
    registry: &'a dyn DefinitionRegistry,
}

impl<'a> DefinitionReader<'a> {
    pub fn new(registry: &'a dyn DefinitionRegistry) -> Self {
        Self { registry }
    }

    /// Parses definitions from given file, with format deduced from the extension.
    pub fn parse_file(path: &str) -> Result<Vec<BeanDefinition>, ReaderError> {
        Self::parse(Config::builder().add_source(File::with_name(path)).build()?)
    }

    /// Parses definitions from an in-memory document.
    pub fn parse_str(content: &str, format: FileFormat) -> Result<Vec<BeanDefinition>, ReaderError> {
        Self::parse(
            Config::builder()
                .add_source(File::from_str(content, format))
                .build()?,
        )
    }

    fn parse(config: Config) -> Result<Vec<BeanDefinition>, ReaderError> {
        config
            .try_deserialize::<DefinitionDocument>()?
            .beans
            .into_iter()
            .map(BeanDefinition::try_from)
            .collect()
    }

    /// Registers all definitions from given file. Returns the number of registered definitions.
    pub fn load_file(&self, path: &str) -> Result<usize, ReaderError> {
        debug!(path, "Loading bean definitions.");
        self.register(Self::parse_file(path)?)
    }

    /// Registers all definitions from an in-memory document. Returns the number of registered
    /// definitions.
    pub fn load_str(&self, content: &str, format: FileFormat) -> Result<usize, ReaderError> {
        self.register(Self::parse_str(content, format)?)
    }

    fn register(&self, definitions: Vec<BeanDefinition>) -> Result<usize, ReaderError> {
        let count = definitions.len();
        for definition in definitions {
            self.registry.register_bean_definition(definition)?;
        }

        Ok(count)
    }
}
