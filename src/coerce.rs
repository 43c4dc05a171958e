//! Type checking of write payloads
//!
//! Every element must carry the category's declared type. Booleans are never
//! accepted as numbers and numbers are never accepted as booleans. The only
//! conversion performed is widening an `Int` to a `Float` for DF.

use crate::category::Category;
use crate::error::{PlcError, PlcResult};
use crate::value::{PlcValue, ValueType, WriteData};

/// Check `data` against `category` and return the values to write.
///
/// `label` names the target in error messages and `available` is the number
/// of addresses the write may cover.
pub fn coerce(
    category: Category,
    label: &str,
    data: &WriteData,
    available: usize,
) -> PlcResult<Vec<PlcValue>> {
    let expected = category.value_type();
    let values = data
        .values()
        .iter()
        .map(|value| coerce_value(expected, value).ok_or_else(|| type_error(label, expected)))
        .collect::<PlcResult<Vec<_>>>()?;

    if values.is_empty() {
        return Err(PlcError::value("Data list must not be empty."));
    }
    if values.len() > available {
        return Err(PlcError::value("Data list longer than available addresses."));
    }
    Ok(values)
}

fn coerce_value(expected: ValueType, value: &PlcValue) -> Option<PlcValue> {
    match (expected, value) {
        (ValueType::Bool, PlcValue::Bool(_))
        | (ValueType::Int, PlcValue::Int(_))
        | (ValueType::Float, PlcValue::Float(_)) => Some(*value),
        (ValueType::Float, PlcValue::Int(v)) => Some(PlcValue::Float(f32::from(*v))),
        _ => None,
    }
}

fn type_error(label: &str, expected: ValueType) -> PlcError {
    PlcError::value(format!("Expected {} as a {}.", label, expected))
}
