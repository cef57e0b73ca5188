//! Values flowing through bean creation. A [ConfiguredValue] is what a definition declares, a
//! [Value] is what it resolves to, and a [ValueType] is what a constructor parameter or a property
//! declares it accepts. Adapting one to the other is the job of a
//! [TypeConverter](crate::type_converter::TypeConverter), while [FromValue] turns an already
//! adapted value into a concrete Rust type.

use crate::bean_class::BeanPtr;
use crate::error::ConversionError;
use std::any::{type_name, Any};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A value as declared in a bean definition, before any resolution.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConfiguredValue {
    /// Raw literal, usually text coming from configuration.
    Literal(String),
    /// Name of another bean.
    Reference(String),
    /// Ordered sequence of nested values.
    Collection(Vec<ConfiguredValue>),
}

impl ConfiguredValue {
    pub fn literal<T: ToString>(value: T) -> Self {
        Self::Literal(value.to_string())
    }

    pub fn reference<T: Into<String>>(name: T) -> Self {
        Self::Reference(name.into())
    }

    pub fn collection<I: IntoIterator<Item = ConfiguredValue>>(values: I) -> Self {
        Self::Collection(values.into_iter().collect())
    }
}

/// A resolved value, ready to be converted and passed to a constructor or setter.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Bean(BeanPtr),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bean(_) => "bean",
            Value::List(_) => "list",
        }
    }
}

/// Declared type of a constructor parameter or a property.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    /// Accepts anything without conversion.
    Any,
    Text,
    Bool,
    Integer,
    Float,
    Bean,
    List(Box<ValueType>),
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Text => write!(f, "text"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Bean => write!(f, "bean"),
            ValueType::List(element) => write!(f, "list of {element}"),
        }
    }
}

fn incompatible(value: &Value, target: ValueType) -> ConversionError {
    ConversionError::Incompatible {
        kind: value.kind(),
        target,
    }
}

/// Conversion from an adapted [Value] into a concrete member type. The declared [ValueType] tells
/// the converter what to adapt raw values to before calling [FromValue::from_value].
pub trait FromValue: Sized {
    fn value_type() -> ValueType;

    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    #[inline]
    fn value_type() -> ValueType {
        ValueType::Any
    }

    #[inline]
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn value_type() -> ValueType {
        ValueType::Text
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Null => Err(ConversionError::NullValue(ValueType::Text)),
            other => Err(incompatible(&other, ValueType::Text)),
        }
    }
}

impl FromValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(value) => Ok(value),
            Value::Null => Err(ConversionError::NullValue(ValueType::Bool)),
            other => Err(incompatible(&other, ValueType::Bool)),
        }
    }
}

macro_rules! integer_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn value_type() -> ValueType {
                    ValueType::Integer
                }

                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Integer(value) => <$t>::try_from(value).map_err(|_| {
                            ConversionError::OutOfRange {
                                value,
                                target: type_name::<$t>(),
                            }
                        }),
                        Value::Null => Err(ConversionError::NullValue(ValueType::Integer)),
                        other => Err(incompatible(&other, ValueType::Integer)),
                    }
                }
            }
        )*
    };
}

integer_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(value) => Ok(value),
            Value::Null => Err(ConversionError::NullValue(ValueType::Float)),
            other => Err(incompatible(&other, ValueType::Float)),
        }
    }
}

impl FromValue for f32 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|value| value as f32)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    #[inline]
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::List(Box::new(T::value_type()))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::List(values) => values.into_iter().map(T::from_value).collect(),
            Value::Null => Err(ConversionError::NullValue(Self::value_type())),
            other => Err(incompatible(&other, Self::value_type())),
        }
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn value_type() -> ValueType {
        ValueType::Bean
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bean(bean) => bean
                .downcast::<T>()
                .map_err(|_| ConversionError::IncompatibleBean(type_name::<T>())),
            Value::Null => Err(ConversionError::NullValue(ValueType::Bean)),
            other => Err(incompatible(&other, ValueType::Bean)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bean_class::BeanPtr;
    use crate::error::ConversionError;
    use crate::value::{ConfiguredValue, FromValue, Value, ValueType};
    use std::sync::Arc;

    #[test]
    fn should_build_configured_values() {
        assert_eq!(
            ConfiguredValue::literal(42),
            ConfiguredValue::Literal("42".to_string())
        );
        assert_eq!(
            ConfiguredValue::collection([ConfiguredValue::reference("a")]),
            ConfiguredValue::Collection(vec![ConfiguredValue::Reference("a".to_string())])
        );
    }

    #[test]
    fn should_reject_out_of_range_integers() {
        assert_eq!(
            u8::from_value(Value::Integer(300)).unwrap_err(),
            ConversionError::OutOfRange {
                value: 300,
                target: "u8"
            }
        );
        assert_eq!(i32::from_value(Value::Integer(-5)).unwrap(), -5);
    }

    #[test]
    fn should_map_null_to_none() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            String::from_value(Value::Null).unwrap_err(),
            ConversionError::NullValue(ValueType::Text)
        );
    }

    #[test]
    fn should_downcast_beans() {
        let bean = Arc::new(7u16) as BeanPtr;
        assert_eq!(*Arc::<u16>::from_value(Value::Bean(bean.clone())).unwrap(), 7);
        assert_eq!(
            Arc::<String>::from_value(Value::Bean(bean)).unwrap_err(),
            ConversionError::IncompatibleBean("alloc::string::String")
        );
    }

    #[test]
    fn should_convert_lists() {
        assert_eq!(
            Vec::<i64>::value_type(),
            ValueType::List(Box::new(ValueType::Integer))
        );
        assert_eq!(
            Vec::<i64>::from_value(Value::List(vec![Value::Integer(1), Value::Integer(2)]))
                .unwrap(),
            vec![1, 2]
        );
    }
}
