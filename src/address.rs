//! # Address Spec Parser
//!
//! Grammar accepted by [`parse_spec`]:
//!
//! ```text
//! spec     := address | address "-" address
//! address  := prefix digits
//! prefix   := "x" | "y" | "c" | "df" | "ds"     (case-insensitive)
//! ```
//!
//! Parsing happens in two steps. [`scan`] splits a token into its letter
//! prefix and decimal number without interpreting either. [`parse_spec`] then
//! resolves the prefix against the category registry and hands the numbers to
//! [`AddressRange::new`] for bounds checking.
//!
//! ```rust
//! use clickplc::{parse_spec, Category};
//!
//! let range = parse_spec("c1-c5").unwrap();
//! assert_eq!(range.category(), Category::C);
//! assert_eq!(range.len(), 5);
//!
//! let err = parse_spec("c1-x3").unwrap_err();
//! assert_eq!(err.to_string(), "Inter-category ranges are unsupported.");
//! ```

use crate::category::Category;
use crate::error::{PlcError, PlcResult};
use crate::range::AddressRange;

/// A lexically valid address token, not yet checked against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Leading letters, as written.
    pub prefix: &'a str,
    /// Trailing decimal number.
    pub number: u32,
}

/// Split `letters digits` into its parts.
pub fn scan(token: &str) -> PlcResult<Token<'_>> {
    let token = token.trim();
    let split = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (prefix, digits) = token.split_at(split);

    if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(token));
    }
    let number = digits.parse::<u32>().map_err(|_| invalid(token))?;

    Ok(Token { prefix, number })
}

/// Parse a bare address or a hyphenated range into a validated range.
pub fn parse_spec(spec: &str) -> PlcResult<AddressRange> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(PlcError::address("An address must be supplied."));
    }

    let (first, second) = match spec.split_once('-') {
        Some((first, second)) => (first, Some(second)),
        None => (spec, None),
    };

    let start = scan(first)?;
    let category = Category::from_prefix(start.prefix)?;

    let end = match second {
        Some(second) => {
            let end = scan(second)?;
            if !end.prefix.eq_ignore_ascii_case(start.prefix) {
                return Err(PlcError::address("Inter-category ranges are unsupported."));
            }
            Some(end.number)
        }
        None => None,
    };

    AddressRange::new(category, start.number, end)
}

/// True when `spec` contains an explicit `start-end` range.
pub fn is_range_spec(spec: &str) -> bool {
    spec.contains('-')
}

fn invalid(token: &str) -> PlcError {
    PlcError::address(format!("'{}' is not a valid address.", token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scan() {
        assert_eq!(
            scan("DF12").unwrap(),
            Token {
                prefix: "DF",
                number: 12
            }
        );
        assert_eq!(scan("x001").unwrap().number, 1);
        assert!(scan("12").is_err());
        assert!(scan("c").is_err());
        assert!(scan("c1a").is_err());
        assert!(scan("c+1").is_err());
        assert!(scan("c99999999999").is_err());
    }

    #[test]
    fn test_bare_token_is_single_address() {
        let range = parse_spec("df3").unwrap();
        assert_eq!(range.category(), Category::DF);
        assert_eq!((range.start(), range.end()), (3, 3));
    }

    #[test]
    fn test_case_insensitive() {
        let range = parse_spec("DS1-ds10").unwrap();
        assert_eq!(range.category(), Category::DS);
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn test_xy_display_addresses() {
        let range = parse_spec("x1-x5").unwrap();
        assert_eq!(range.labels().collect::<Vec<_>>(), ["x001", "x002", "x003", "x004", "x005"]);

        let range = parse_spec("y001-y816").unwrap();
        assert_eq!(range.len(), 144);
    }

    #[test]
    fn test_errors() {
        let msg = |spec: &str| parse_spec(spec).unwrap_err().to_string();

        assert_eq!(msg(""), "An address must be supplied.");
        assert_eq!(msg("c3-c1"), "End address must be greater than start address.");
        assert_eq!(msg("foo1"), "foo currently unsupported.");
        assert_eq!(msg("c1-x3"), "Inter-category ranges are unsupported.");
        assert_eq!(msg("c2001"), "C start address must be 1-2000.");
        assert_eq!(msg("x17"), "X start address must be *01-*16.");
        assert_eq!(msg("y1001"), "Y start address must be in [001, 816].");
        assert_eq!(msg("x1-x17"), "X end address must be *01-*16.");
        assert_eq!(msg("c1-"), "'' is not a valid address.");
        assert_eq!(msg("c1-c2-c3"), "'c2-c3' is not a valid address.");
    }

    proptest! {
        #[test]
        fn prop_xy_tokens_round_trip(block in 0u16..=8, slot in 1u16..=16) {
            let index = block * 100 + slot;
            let range = parse_spec(&format!("x{:03}", index)).unwrap();
            prop_assert_eq!(range.start(), index);
            prop_assert_eq!(Category::X.index_at(Category::X.position(index)), index);
            prop_assert_eq!(Category::X.modbus_offset(index), block * 32 + slot - 1);
        }

        #[test]
        fn prop_parse_never_panics(spec in "\\PC{0,12}") {
            let _ = parse_spec(&spec);
        }
    }
}
