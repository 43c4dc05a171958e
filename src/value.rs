//! # PLC Value Types
//!
//! Typed values exchanged with the CLICK memory map. A boolean is never an
//! integer here: `PlcValue::Bool(true)` is rejected wherever an `Int` or
//! `Float` is expected, even though a coil is physically a 0/1.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{PlcError, PlcResult};

/// Declared value type of a memory category.
///
/// | Type | Categories | Tag table name |
/// |------|------------|----------------|
/// | Bool | X, Y, C | `bool` |
/// | Float | DF | `float` |
/// | Int | DS | `int16` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Float,
    Int,
}

impl ValueType {
    /// Short name used in type error messages (`Expected ds1 as a int.`).
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Float => "float",
            ValueType::Int => "int",
        }
    }

    /// Name reported by the tag table (`get_tags`).
    pub fn table_name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Float => "float",
            ValueType::Int => "int16",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.table_name())
    }
}

/// A single value read from or written to the PLC.
///
/// # Example
///
/// ```rust
/// use clickplc::{PlcValue, ValueType};
///
/// let level = PlcValue::Float(42.5);
/// assert_eq!(level.value_type(), ValueType::Float);
/// assert_eq!(level.as_f32(), Some(42.5));
/// assert_eq!(PlcValue::from(true).as_i16(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlcValue {
    /// Discrete point (X, Y, C)
    Bool(bool),
    /// Signed 16-bit register (DS)
    Int(i16),
    /// 32-bit float register pair (DF)
    Float(f32),
}

impl PlcValue {
    /// Runtime type of this value.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        match self {
            PlcValue::Bool(_) => ValueType::Bool,
            PlcValue::Int(_) => ValueType::Int,
            PlcValue::Float(_) => ValueType::Float,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlcValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i16(&self) -> Option<i16> {
        match self {
            PlcValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            PlcValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcValue::Bool(v) => write!(f, "{}", v),
            PlcValue::Int(v) => write!(f, "{}", v),
            PlcValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for PlcValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlcValue::Bool(v) => serializer.serialize_bool(*v),
            PlcValue::Int(v) => serializer.serialize_i16(*v),
            PlcValue::Float(v) => serializer.serialize_f32(*v),
        }
    }
}

impl From<bool> for PlcValue {
    fn from(v: bool) -> Self {
        PlcValue::Bool(v)
    }
}

impl From<i16> for PlcValue {
    fn from(v: i16) -> Self {
        PlcValue::Int(v)
    }
}

impl From<f32> for PlcValue {
    fn from(v: f32) -> Self {
        PlcValue::Float(v)
    }
}

// ============================================================================
// Write payloads
// ============================================================================

/// Data handed to [`ClickPlc::set`](crate::ClickPlc::set): one value, or an
/// ordered list written to consecutive addresses.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteData {
    Single(PlcValue),
    List(Vec<PlcValue>),
}

impl WriteData {
    /// Values in write order.
    pub fn values(&self) -> &[PlcValue] {
        match self {
            WriteData::Single(v) => std::slice::from_ref(v),
            WriteData::List(v) => v,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, WriteData::List(_))
    }

    /// Parse command-line text as `value_type`. A comma-separated list
    /// becomes [`WriteData::List`].
    ///
    /// ```rust
    /// use clickplc::{PlcValue, ValueType, WriteData};
    ///
    /// let data = WriteData::parse(ValueType::Bool, "true,false").unwrap();
    /// assert_eq!(data.values(), [PlcValue::Bool(true), PlcValue::Bool(false)]);
    /// assert!(WriteData::parse(ValueType::Int, "1.5").is_err());
    /// ```
    pub fn parse(value_type: ValueType, text: &str) -> PlcResult<Self> {
        let mut values = text
            .split(',')
            .map(|token| parse_value(value_type, token.trim()))
            .collect::<PlcResult<Vec<_>>>()?;
        if text.contains(',') {
            Ok(WriteData::List(values))
        } else {
            values
                .pop()
                .map(WriteData::Single)
                .ok_or_else(|| PlcError::value("Data list must not be empty."))
        }
    }
}

fn parse_value(value_type: ValueType, token: &str) -> PlcResult<PlcValue> {
    let parsed = match value_type {
        ValueType::Bool => match token.to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Some(PlcValue::Bool(true)),
            "false" | "off" | "0" => Some(PlcValue::Bool(false)),
            _ => None,
        },
        ValueType::Int => token.parse::<i16>().ok().map(PlcValue::Int),
        ValueType::Float => token.parse::<f32>().ok().map(PlcValue::Float),
    };
    parsed.ok_or_else(|| PlcError::value(format!("'{}' is not a valid {}.", token, value_type)))
}

impl From<PlcValue> for WriteData {
    fn from(v: PlcValue) -> Self {
        WriteData::Single(v)
    }
}

impl From<Vec<PlcValue>> for WriteData {
    fn from(v: Vec<PlcValue>) -> Self {
        WriteData::List(v)
    }
}

impl From<&[PlcValue]> for WriteData {
    fn from(v: &[PlcValue]) -> Self {
        WriteData::List(v.to_vec())
    }
}

macro_rules! impl_write_data {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for WriteData {
                fn from(v: $ty) -> Self {
                    WriteData::Single(PlcValue::from(v))
                }
            }

            impl From<Vec<$ty>> for WriteData {
                fn from(v: Vec<$ty>) -> Self {
                    WriteData::List(v.into_iter().map(PlcValue::from).collect())
                }
            }

            impl<const N: usize> From<[$ty; N]> for WriteData {
                fn from(v: [$ty; N]) -> Self {
                    WriteData::List(v.into_iter().map(PlcValue::from).collect())
                }
            }
        )*
    };
}

impl_write_data!(bool, i16, f32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type() {
        assert_eq!(PlcValue::Bool(true).value_type(), ValueType::Bool);
        assert_eq!(PlcValue::Int(-3).value_type(), ValueType::Int);
        assert_eq!(PlcValue::Float(1.5).value_type(), ValueType::Float);
    }

    #[test]
    fn test_bool_is_not_int() {
        assert_eq!(PlcValue::Bool(true).as_i16(), None);
        assert_eq!(PlcValue::Int(1).as_bool(), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ValueType::Int.name(), "int");
        assert_eq!(ValueType::Int.table_name(), "int16");
        assert_eq!(ValueType::Float.to_string(), "float");
    }

    #[test]
    fn test_write_data_from() {
        assert_eq!(WriteData::from(true), WriteData::Single(PlcValue::Bool(true)));
        assert_eq!(
            WriteData::from([false, true]),
            WriteData::List(vec![PlcValue::Bool(false), PlcValue::Bool(true)])
        );
        assert_eq!(WriteData::from(vec![3i16, 4]).values().len(), 2);
        assert!(!WriteData::from(2.0f32).is_list());
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            WriteData::parse(ValueType::Float, "2.5").unwrap(),
            WriteData::Single(PlcValue::Float(2.5))
        );
        assert_eq!(
            WriteData::parse(ValueType::Int, "3, -4").unwrap(),
            WriteData::List(vec![PlcValue::Int(3), PlcValue::Int(-4)])
        );
        assert_eq!(
            WriteData::parse(ValueType::Bool, "ON").unwrap(),
            WriteData::Single(PlcValue::Bool(true))
        );
        let err = WriteData::parse(ValueType::Int, "40000").unwrap_err();
        assert_eq!(err.to_string(), "'40000' is not a valid int.");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&[
            PlcValue::Bool(true),
            PlcValue::Int(-2),
            PlcValue::Float(0.5),
        ])
        .unwrap();
        assert_eq!(json, "[true,-2,0.5]");
    }
}
