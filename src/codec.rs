//! # Register Codec
//!
//! Conversion between raw Modbus data and [`PlcValue`]s for a given
//! [`AddressRange`].
//!
//! | Category | Modbus data | Encoding |
//! |----------|-------------|----------|
//! | X, Y, C | coils | one bit per address; X/Y gap coils ignored on read, written `false` |
//! | DS | 1 register | int16, two's complement |
//! | DF | 2 registers | IEEE 754 float32, low word first (CDAB) |

use crate::category::{Category, ModbusSpace};
use crate::error::{PlcError, PlcResult};
use crate::range::AddressRange;
use crate::value::PlcValue;

// ============================================================================
// Float helpers
// ============================================================================

/// Combine two DF registers, low word first (CDAB), into an `f32`.
///
/// ```rust
/// use clickplc::codec::regs_to_f32;
///
/// // 25.0 = 0x41C8_0000
/// assert_eq!(regs_to_f32([0x0000, 0x41C8]), 25.0);
/// ```
#[inline]
pub fn regs_to_f32(regs: [u16; 2]) -> f32 {
    f32::from_bits((u32::from(regs[1]) << 16) | u32::from(regs[0]))
}

/// Split an `f32` into two DF registers, low word first.
#[inline]
pub fn f32_to_regs(value: f32) -> [u16; 2] {
    let bits = value.to_bits();
    [bits as u16, (bits >> 16) as u16]
}

// ============================================================================
// Decoding
// ============================================================================

/// Pick the values of `range` out of a coil read that started at
/// `range.modbus_offset()`.
pub fn decode_bits(range: &AddressRange, bits: &[bool]) -> PlcResult<Vec<PlcValue>> {
    let base = range.modbus_offset();
    range
        .indices()
        .map(|index| {
            let at = usize::from(range.category().modbus_offset(index) - base);
            bits.get(at).copied().map(PlcValue::Bool).ok_or_else(|| {
                PlcError::protocol(format!(
                    "Coil response too short for {}: {} bits",
                    range,
                    bits.len()
                ))
            })
        })
        .collect()
}

/// Decode registers read from `range.modbus_offset()`.
pub fn decode_registers(range: &AddressRange, registers: &[u16]) -> PlcResult<Vec<PlcValue>> {
    let step = usize::from(range.category().address_step());
    let needed = range.len() * step;
    if registers.len() < needed {
        return Err(PlcError::protocol(format!(
            "Register response too short for {}: expected {}, got {}",
            range,
            needed,
            registers.len()
        )));
    }

    let values = match range.category() {
        Category::DF => registers[..needed]
            .chunks_exact(2)
            .map(|pair| PlcValue::Float(regs_to_f32([pair[0], pair[1]])))
            .collect(),
        Category::DS => registers[..needed]
            .iter()
            .map(|&reg| PlcValue::Int(reg as i16))
            .collect(),
        other => {
            return Err(PlcError::invalid_data(format!(
                "{} is not a register category",
                other
            )))
        }
    };
    Ok(values)
}

// ============================================================================
// Encoding
// ============================================================================

/// Build the coil payload for writing `values` from the start of `range`.
///
/// The payload covers every coil from the first to the last written address;
/// X/Y gap coils in between are sent as `false`.
pub fn encode_bits(range: &AddressRange, values: &[PlcValue]) -> PlcResult<Vec<bool>> {
    let target = range.truncated(values.len());
    let base = target.modbus_offset();
    let mut payload = vec![false; usize::from(target.modbus_count())];

    for (index, value) in target.indices().zip(values) {
        let bit = value.as_bool().ok_or_else(|| {
            PlcError::invalid_data(format!("Cannot encode {} into a coil", value))
        })?;
        payload[usize::from(target.category().modbus_offset(index) - base)] = bit;
    }
    Ok(payload)
}

/// Build the register payload for `values` in `category`.
pub fn encode_registers(category: Category, values: &[PlcValue]) -> PlcResult<Vec<u16>> {
    if category.space() != ModbusSpace::HoldingRegister {
        return Err(PlcError::invalid_data(format!(
            "{} is not a register category",
            category
        )));
    }

    let mut registers = Vec::with_capacity(values.len() * usize::from(category.address_step()));
    for value in values {
        match (category, value) {
            (Category::DS, PlcValue::Int(v)) => registers.push(*v as u16),
            (Category::DF, PlcValue::Float(v)) => {
                registers.extend_from_slice(&f32_to_regs(*v))
            }
            _ => {
                return Err(PlcError::invalid_data(format!(
                    "Cannot encode {} into {}",
                    value, category
                )))
            }
        }
    }
    Ok(registers)
}

// ============================================================================
// Tests
// ============================================================================
