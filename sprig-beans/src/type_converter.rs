//! Adapting resolved values to declared member types.

use crate::error::ConversionError;
use crate::value::{Value, ValueType};
#[cfg(test)]
use mockall::automock;

/// Converts resolved values to the [ValueType] declared by a constructor parameter or a property.
#[cfg_attr(test, automock)]
pub trait TypeConverter {
    fn convert_if_necessary(&self, value: Value, target: &ValueType)
        -> Result<Value, ConversionError>;
}

/// Converter for the common cases: parsing text into scalars, widening integers to floats and
/// converting lists element by element. Null values are passed through, so optional members can
/// decide what to do with them.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub struct SimpleTypeConverter;

impl SimpleTypeConverter {
    fn parse_bool(text: &str) -> Option<bool> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

fn invalid_text(text: String, target: &ValueType) -> ConversionError {
    ConversionError::InvalidText {
        text,
        target: target.clone(),
    }
}

impl TypeConverter for SimpleTypeConverter {
    fn convert_if_necessary(
        &self,
        value: Value,
        target: &ValueType,
    ) -> Result<Value, ConversionError> {
        match (value, target) {
            (value, ValueType::Any) => Ok(value),
            (Value::Null, _) => Ok(Value::Null),
            (Value::Text(text), ValueType::Text) => Ok(Value::Text(text)),
            (Value::Text(text), ValueType::Bool) => Self::parse_bool(&text)
                .map(Value::Bool)
                .ok_or_else(|| invalid_text(text, target)),
            (Value::Text(text), ValueType::Integer) => text
                .trim()
                .parse()
                .map(Value::Integer)
                .map_err(|_| invalid_text(text, target)),
            (Value::Text(text), ValueType::Float) => text
                .trim()
                .parse()
                .map(Value::Float)
                .map_err(|_| invalid_text(text, target)),
            (Value::Bool(value), ValueType::Bool) => Ok(Value::Bool(value)),
            (Value::Bool(value), ValueType::Text) => Ok(Value::Text(value.to_string())),
            (Value::Integer(value), ValueType::Integer) => Ok(Value::Integer(value)),
            (Value::Integer(value), ValueType::Float) => Ok(Value::Float(value as f64)),
            (Value::Integer(value), ValueType::Text) => Ok(Value::Text(value.to_string())),
            (Value::Float(value), ValueType::Float) => Ok(Value::Float(value)),
            (Value::Float(value), ValueType::Text) => Ok(Value::Text(value.to_string())),
            (Value::Bean(bean), ValueType::Bean) => Ok(Value::Bean(bean)),
            (Value::List(values), ValueType::List(element)) => values
                .into_iter()
                .map(|value| self.convert_if_necessary(value, element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (value, target) => Err(ConversionError::Incompatible {
                kind: value.kind(),
                target: target.clone(),
            }),
        }
    }
}
