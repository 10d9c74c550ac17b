//! Typed values held by component variables.

use serde::Deserialize;
use std::fmt;

/// Declared type of a component variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
        }
    }
}

/// A variable value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    /// The type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
        }
    }

    /// Numeric view of the value (`true` is 1, `false` is 0).
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => i as f64,
            Value::Float(x) => x,
        }
    }

    /// Convert to the declared type, if the conversion is lossless.
    ///
    /// Integers widen to floats; nothing else converts.
    pub fn coerce(self, ty: ValueType) -> Option<Value> {
        match (self, ty) {
            (Value::Bool(_), ValueType::Bool)
            | (Value::Int(_), ValueType::Int)
            | (Value::Float(_), ValueType::Float) => Some(self),
            (Value::Int(i), ValueType::Float) => Some(Value::Float(i as f64)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::Bool(true).as_f64(), 1.0);
        assert_eq!(Value::Bool(false).as_f64(), 0.0);
        assert_eq!(Value::Int(-3).as_f64(), -3.0);
        assert_eq!(Value::Float(0.25).as_f64(), 0.25);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(
            Value::Int(2).coerce(ValueType::Float),
            Some(Value::Float(2.0))
        );
        assert_eq!(Value::Float(2.0).coerce(ValueType::Int), None);
        assert_eq!(Value::Bool(true).coerce(ValueType::Int), None);
    }
}
