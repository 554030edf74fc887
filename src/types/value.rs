//! Dynamically typed cell value of a dataset row

use std::fmt;

/// A single cell of a [Table](crate::table::Table).
///
/// Integer columns of any width are widened to [i64], floating point and decimal columns to
/// [f64]. Strings, dictionaries and temporal columns are carried as [String].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number, possibly NaN
    Float(f64),
    /// String
    Str(String),
}

impl Value {
    /// Returns true for null values and for NaN floats.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(float) => float.is_nan(),
            _ => false,
        }
    }

    /// Returns the string slice of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(string) => Some(string),
            _ => None,
        }
    }

    /// Returns an integer, accepting floats that hold an integral value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(int) => Some(*int),
            Value::Float(float) if float.is_finite() && float.fract() == 0.0 => Some(*float as i64),
            _ => None,
        }
    }

    /// Returns a float, accepting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(boolean) => write!(f, "{}", boolean),
            Value::Int(int) => write!(f, "{}", int),
            Value::Float(float) => write!(f, "{}", float),
            Value::Str(string) => write!(f, "{}", string),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
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

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Attempt to convert from a [Value] to a concrete Rust type.
// We can't implement TryFrom<&Value> for String and the numeric types without losing the name of
// the expected type in error messages, hence this trait.
pub trait TryFromValue: Sized {
    /// Name of the type, used in error messages.
    const TYPE_NAME: &'static str;

    /// Try to convert from a non-null [Value].
    fn try_from_value(value: &Value) -> Option<Self>;
}

impl TryFromValue for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn try_from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl TryFromValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn try_from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl TryFromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn try_from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}
