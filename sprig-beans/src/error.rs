use crate::value::ValueType;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Shared pointer to a failure raised by user code, e.g. a constructor, a setter or a
/// post-processor.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Errors related to retrieving and creating beans.
#[derive(Error, Clone, Debug)]
pub enum BeanFactoryError {
    #[error("No bean definition named '{0}' is registered.")]
    NoSuchBeanDefinition(String),
    #[error("Error creating bean '{bean_name}' of type {class_name}: {source}")]
    BeanCreation {
        bean_name: String,
        class_name: String,
        source: ErrorPtr,
    },
    #[error("Cannot resolve bean type: {0}")]
    TypeResolution(#[from] TypeLoadError),
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
    #[error("No bean assignable to type {0} is registered.")]
    NoSuchBeanOfType(String),
    #[error("Bean '{bean_name}' is not compatible with requested type {type_name}.")]
    IncompatibleBean {
        bean_name: String,
        type_name: &'static str,
    },
}

/// Error related to bean definition registries.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum DefinitionRegistryError {
    #[error("Attempted to register a duplicated bean definition with name: {0}")]
    DuplicateBeanName(String),
}

/// Failure to turn a type name into a [BeanClass](crate::bean_class::BeanClass).
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TypeLoadError {
    #[error("Type not found: {0}")]
    TypeNotFound(String),
}

/// Failure to adapt a value to a declared member type.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ConversionError {
    #[error("Cannot convert {kind} value to {target}.")]
    Incompatible {
        kind: &'static str,
        target: ValueType,
    },
    #[error("Cannot convert text '{text}' to {target}.")]
    InvalidText { text: String, target: ValueType },
    #[error("Value {value} is out of range for {target}.")]
    OutOfRange { value: i64, target: &'static str },
    #[error("Null value given for non-optional {0}.")]
    NullValue(ValueType),
    #[error("Bean is not an instance of {0}.")]
    IncompatibleBean(&'static str),
    #[error("Missing constructor argument at position {0}.")]
    MissingArgument(usize),
}

/// Failure to select or invoke a constructor.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ConstructorResolutionError {
    #[error("Type {0} has no default constructor.")]
    NoDefaultConstructor(String),
    #[error("Type {class_name} has no constructor accepting {arity} matching argument(s).")]
    NoMatchingConstructor { class_name: String, arity: usize },
}

/// Failure to inject dependencies by type.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum AutowiringError {
    #[error("Bean factory is no longer available.")]
    FactoryUnavailable,
}
