//! Dynamically typed SQL values.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A SQL value as bound to a statement or read back from a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit integer
    TinyInt(i8),
    /// 16-bit integer
    SmallInt(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    BigInt(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Arbitrary precision decimal, kept as text
    Decimal(String),
    /// Text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Microseconds since the Unix epoch
    Timestamp(i64),
    /// JSON document
    Json(serde_json::Value),
}

impl Value {
    /// Check whether this is SQL NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check whether this value is the zero value of its type.
    ///
    /// Numbers equal to zero, `false`, empty text and bytes, and NULL are
    /// blank. Timestamps are only blank when NULL: an epoch timestamp is a
    /// real point in time.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::TinyInt(i) => *i == 0,
            Value::SmallInt(i) => *i == 0,
            Value::Int(i) => *i == 0,
            Value::BigInt(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Double(f) => *f == 0.0,
            Value::Decimal(s) | Value::Text(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Timestamp(_) => false,
            Value::Json(j) => j.is_null(),
        }
    }

    /// Name of the variant, for error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOL",
            Value::TinyInt(_) => "TINYINT",
            Value::SmallInt(_) => "SMALLINT",
            Value::Int(_) => "INT",
            Value::BigInt(_) => "BIGINT",
            Value::Float(_) => "FLOAT",
            Value::Double(_) => "DOUBLE",
            Value::Decimal(_) => "DECIMAL",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BYTES",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Json(_) => "JSON",
        }
    }

    /// Widen any integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(i) => Some(i64::from(*i)),
            Value::SmallInt(i) => Some(i64::from(*i)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow the text content, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Decimal(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion from a [`Value`] into a Rust field type.
///
/// Used by record implementations when the pipeline writes a generated key
/// or a reloaded default back into a field.
pub trait FromValue: Sized {
    /// Convert, failing when the variant does not fit.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Custom(format!(
        "cannot convert {} value into {}",
        value.type_name(),
        expected
    ))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            ref other => other.as_i64().map(|i| i != 0).ok_or_else(|| mismatch("bool", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("i64", &value))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = value.as_i64().ok_or_else(|| mismatch("i32", &value))?;
        i32::try_from(wide).map_err(|_| Error::Custom(format!("{wide} does not fit in i32")))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Double(f) => Ok(f),
            Value::Float(f) => Ok(f64::from(f)),
            ref other => other
                .as_i64()
                .map(|i| i as f64)
                .ok_or_else(|| mismatch("f64", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) | Value::Decimal(s) => Ok(s),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("Vec<u8>", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::Int(0).is_blank());
        assert!(Value::Text(String::new()).is_blank());
        assert!(Value::Bool(false).is_blank());
        assert!(!Value::BigInt(7).is_blank());
        assert!(!Value::Text("x".into()).is_blank());
        assert!(!Value::Timestamp(0).is_blank());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::BigInt(3));
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(i64::from_value(Value::Int(5)).unwrap(), 5);
        assert_eq!(i32::from_value(Value::BigInt(9)).unwrap(), 9);
        assert!(i32::from_value(Value::BigInt(i64::MAX)).is_err());
        assert!(i64::from_value(Value::Text("1".into())).is_err());
    }

    #[test]
    fn test_option_from_null() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::Text("a".into())).unwrap(),
            Some("a".to_string())
        );
    }
}
