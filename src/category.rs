//! # CLICK Memory Categories
//!
//! The CLICK Modbus map is fixed. Each category owns a slice of either the coil
//! space or the holding-register space:
//!
//! | Category | Prefix | Index range | Type | Step | Space | Base |
//! |----------|--------|-------------|------|------|-------|------|
//! | X  | `x`  | 001–816 | bool  | 1 | coil     | 0     |
//! | Y  | `y`  | 001–816 | bool  | 1 | coil     | 8192  |
//! | C  | `c`  | 1–2000  | bool  | 1 | coil     | 16384 |
//! | DS | `ds` | 1–4500  | int16 | 1 | register | 0     |
//! | DF | `df` | 1–500   | float | 2 | register | 28672 |
//!
//! ## X/Y block addressing
//!
//! X and Y are written `BSS`: block `B` (0 = CPU, 1–8 = expansion slots) and
//! slot `SS` (01–16). Each block reserves 32 coils in the Modbus map but only
//! the first 16 are populated, so `x016` is coil 15 and `x101` is coil 32.
//! Internally an X/Y address also has a dense linear position
//! (`x001` → 1, `x016` → 16, `x101` → 17, ..., `x816` → 144).

use std::fmt;

use crate::error::{PlcError, PlcResult};
use crate::value::ValueType;

/// Points per X/Y block that exist on the PLC.
pub const SLOTS_PER_BLOCK: u16 = 16;

/// Coils the Modbus map reserves per X/Y block.
pub const COILS_PER_BLOCK: u16 = 32;

/// Modbus holding registers are printed 4xxxxx by the CLICK software.
const HOLDING_REGISTER_DISPLAY_BASE: u32 = 400_001;

/// Modbus table a category lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModbusSpace {
    /// Read with FC01, written with FC05/FC15.
    Coil,
    /// Read with FC03, written with FC06/FC16.
    HoldingRegister,
}

/// A CLICK memory category.
///
/// Variants are declared in Modbus address order so that sorting categories
/// sorts requests by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Discrete inputs
    X,
    /// Discrete outputs
    Y,
    /// Internal control relays
    C,
    /// Signed 16-bit data registers
    DS,
    /// Floating point data registers
    DF,
}

impl Category {
    /// Every supported category, in Modbus address order.
    pub const ALL: [Category; 5] = [
        Category::X,
        Category::Y,
        Category::C,
        Category::DS,
        Category::DF,
    ];

    /// Look up a category by its address prefix (case-insensitive).
    ///
    /// ```rust
    /// use clickplc::Category;
    ///
    /// assert_eq!(Category::from_prefix("DF").unwrap(), Category::DF);
    /// assert_eq!(
    ///     Category::from_prefix("foo").unwrap_err().to_string(),
    ///     "foo currently unsupported."
    /// );
    /// ```
    pub fn from_prefix(prefix: &str) -> PlcResult<Self> {
        let lowered = prefix.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.prefix() == lowered)
            .ok_or_else(|| PlcError::address(format!("{} currently unsupported.", lowered)))
    }

    /// Lowercase address prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::X => "x",
            Category::Y => "y",
            Category::C => "c",
            Category::DS => "ds",
            Category::DF => "df",
        }
    }

    /// Uppercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Category::X => "X",
            Category::Y => "Y",
            Category::C => "C",
            Category::DS => "DS",
            Category::DF => "DF",
        }
    }

    #[inline]
    pub fn min_index(&self) -> u16 {
        1
    }

    #[inline]
    pub fn max_index(&self) -> u16 {
        match self {
            Category::X | Category::Y => 816,
            Category::C => 2000,
            Category::DS => 4500,
            Category::DF => 500,
        }
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        match self {
            Category::X | Category::Y | Category::C => ValueType::Bool,
            Category::DS => ValueType::Int,
            Category::DF => ValueType::Float,
        }
    }

    /// Modbus units (coils or registers) one value occupies.
    #[inline]
    pub fn address_step(&self) -> u16 {
        match self {
            Category::DF => 2,
            _ => 1,
        }
    }

    #[inline]
    pub fn space(&self) -> ModbusSpace {
        match self {
            Category::X | Category::Y | Category::C => ModbusSpace::Coil,
            Category::DS | Category::DF => ModbusSpace::HoldingRegister,
        }
    }

    /// Zero-based Modbus offset of index 1 (or `x001`/`y001`).
    #[inline]
    pub fn modbus_base(&self) -> u16 {
        match self {
            Category::X => 0,
            Category::Y => 8192,
            Category::C => 16384,
            Category::DS => 0,
            Category::DF => 28672,
        }
    }

    /// True for X and Y, whose indices are `BSS` display addresses.
    #[inline]
    pub fn is_block_addressed(&self) -> bool {
        matches!(self, Category::X | Category::Y)
    }

    /// Whether `index` names an existing point: inside the bounds and, for X/Y,
    /// on slot 01-16.
    pub fn contains(&self, index: u32) -> bool {
        if index < u32::from(self.min_index()) || index > u32::from(self.max_index()) {
            return false;
        }
        if self.is_block_addressed() {
            let slot = index % 100;
            return (1..=u32::from(SLOTS_PER_BLOCK)).contains(&slot);
        }
        true
    }

    /// Dense 1-based position of a valid index within the category.
    #[inline]
    pub fn position(&self, index: u16) -> u16 {
        if self.is_block_addressed() {
            let (block, slot) = (index / 100, index % 100);
            block * SLOTS_PER_BLOCK + slot
        } else {
            index
        }
    }

    /// Inverse of [`Category::position`].
    #[inline]
    pub fn index_at(&self, position: u16) -> u16 {
        if self.is_block_addressed() {
            let zero_based = position - 1;
            (zero_based / SLOTS_PER_BLOCK) * 100 + zero_based % SLOTS_PER_BLOCK + 1
        } else {
            position
        }
    }

    /// Zero-based Modbus offset of the first unit holding `index`.
    #[inline]
    pub fn modbus_offset(&self, index: u16) -> u16 {
        if self.is_block_addressed() {
            let (block, slot) = (index / 100, index % 100);
            self.modbus_base() + block * COILS_PER_BLOCK + slot - 1
        } else {
            self.modbus_base() + (index - 1) * self.address_step()
        }
    }

    /// One-based Modbus address as printed by the CLICK software
    /// (`C13` → 16397, `DS100` → 400100).
    pub fn modbus_address(&self, index: u16) -> u32 {
        let offset = u32::from(self.modbus_offset(index));
        match self.space() {
            ModbusSpace::Coil => offset + 1,
            ModbusSpace::HoldingRegister => HOLDING_REGISTER_DISPLAY_BASE + offset,
        }
    }

    /// Address label used as a key in read results (`x001`, `c12`, `df3`).
    pub fn label(&self, index: u16) -> String {
        if self.is_block_addressed() {
            format!("{}{:03}", self.prefix(), index)
        } else {
            format!("{}{}", self.prefix(), index)
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_prefix_case_insensitive() {
        assert_eq!(Category::from_prefix("x").unwrap(), Category::X);
        assert_eq!(Category::from_prefix("Y").unwrap(), Category::Y);
        assert_eq!(Category::from_prefix("Df").unwrap(), Category::DF);
        assert_eq!(Category::from_prefix("ds").unwrap(), Category::DS);
    }

    #[test]
    fn test_unsupported_prefix() {
        let err = Category::from_prefix("DD").unwrap_err();
        assert_eq!(err.to_string(), "dd currently unsupported.");
        assert!(err.is_validation());
    }

    #[test]
    fn test_modbus_addresses_match_click_software() {
        assert_eq!(Category::C.modbus_address(13), 16397);
        assert_eq!(Category::C.modbus_address(1), 16385);
        assert_eq!(Category::Y.modbus_address(301), 8289);
        assert_eq!(Category::Y.modbus_address(302), 8290);
        assert_eq!(Category::DF.modbus_address(1), 428673);
        assert_eq!(Category::DF.modbus_address(6), 428683);
        assert_eq!(Category::DS.modbus_address(100), 400100);
    }

    #[test]
    fn test_xy_offsets_skip_unpopulated_coils() {
        assert_eq!(Category::X.modbus_offset(1), 0);
        assert_eq!(Category::X.modbus_offset(16), 15);
        assert_eq!(Category::X.modbus_offset(101), 32);
        assert_eq!(Category::X.modbus_offset(816), 8 * 32 + 15);
        assert_eq!(Category::Y.modbus_offset(1), 8192);
    }

    #[test]
    fn test_positions() {
        assert_eq!(Category::X.position(1), 1);
        assert_eq!(Category::X.position(16), 16);
        assert_eq!(Category::X.position(101), 17);
        assert_eq!(Category::X.position(816), 144);
        assert_eq!(Category::X.index_at(17), 101);
        assert_eq!(Category::C.position(42), 42);
    }

    #[test]
    fn test_contains() {
        assert!(Category::X.contains(816));
        assert!(!Category::X.contains(17));
        assert!(!Category::X.contains(100));
        assert!(!Category::X.contains(1001));
        assert!(Category::C.contains(2000));
        assert!(!Category::C.contains(0));
        assert!(!Category::DF.contains(501));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Category::X.label(1), "x001");
        assert_eq!(Category::Y.label(816), "y816");
        assert_eq!(Category::C.label(5), "c5");
        assert_eq!(Category::DF.label(12), "df12");
    }

    #[test]
    fn test_categories_sorted_by_address() {
        let mut shuffled = [Category::DF, Category::C, Category::X, Category::DS, Category::Y];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL);
    }
}
