//! Validated address ranges
//!
//! An [`AddressRange`] is only ever built through [`AddressRange::new`], which
//! runs the per-category bounds checks. Every range that reaches the Modbus
//! layer is therefore inside its category.

use std::fmt;

use crate::category::{Category, SLOTS_PER_BLOCK};
use crate::error::{PlcError, PlcResult};

/// Which end of a range is being checked; bounds messages differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl Bound {
    fn name(&self) -> &'static str {
        match self {
            Bound::Start => "start",
            Bound::End => "end",
        }
    }
}

/// A contiguous, same-category span of addresses.
///
/// `start` and `end` use the category's own index notation, so for X/Y they
/// are `BSS` display addresses (`101` is `x101`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    category: Category,
    start: u16,
    end: u16,
}

impl AddressRange {
    /// Validate and build a range. `end = None` means a single address.
    pub fn new(category: Category, start: u32, end: Option<u32>) -> PlcResult<Self> {
        check_bound(category, start, Bound::Start)?;
        let end = match end {
            Some(end) => {
                check_bound(category, end, Bound::End)?;
                if end < start {
                    return Err(PlcError::address(
                        "End address must be greater than start address.",
                    ));
                }
                end
            }
            None => start,
        };

        // Both ends passed the bounds check, so they fit in u16.
        Ok(Self {
            category,
            start: start as u16,
            end: end as u16,
        })
    }

    /// Range of length 1.
    pub fn single(category: Category, index: u32) -> PlcResult<Self> {
        Self::new(category, index, None)
    }

    #[inline]
    pub fn category(&self) -> Category {
        self.category
    }

    #[inline]
    pub fn start(&self) -> u16 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of addresses in the range. X/Y block gaps are not counted.
    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.category.position(self.end) - self.category.position(self.start)) + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Indices in address order.
    pub fn indices(&self) -> impl Iterator<Item = u16> + '_ {
        let category = self.category;
        (category.position(self.start)..=category.position(self.end))
            .map(move |position| category.index_at(position))
    }

    /// Address labels in address order (`c1`, `c2`, ...).
    pub fn labels(&self) -> impl Iterator<Item = String> + '_ {
        self.indices().map(move |index| self.category.label(index))
    }

    pub fn contains(&self, category: Category, index: u16) -> bool {
        category == self.category
            && category.contains(u32::from(index))
            && (self.start..=self.end).contains(&index)
    }

    /// The range from `start` to the last address of the category.
    pub fn to_category_end(&self) -> Self {
        Self {
            end: self.category.max_index(),
            ..*self
        }
    }

    /// The first `len` addresses of this range. `len` is clamped to `1..=self.len()`.
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.clamp(1, self.len()) as u16;
        let end = self
            .category
            .index_at(self.category.position(self.start) + len - 1);
        Self { end, ..*self }
    }

    /// Zero-based Modbus offset of the first unit.
    #[inline]
    pub fn modbus_offset(&self) -> u16 {
        self.category.modbus_offset(self.start)
    }

    /// Modbus units (coils or registers) covered from the first to the last
    /// address, including X/Y gap coils in between.
    #[inline]
    pub fn modbus_count(&self) -> u16 {
        self.category.modbus_offset(self.end) + self.category.address_step() - self.modbus_offset()
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            f.write_str(&self.category.label(self.start))
        } else {
            write!(
                f,
                "{}-{}",
                self.category.label(self.start),
                self.category.label(self.end)
            )
        }
    }
}

/// Per-category bounds check with the CLICK driver's error wording.
pub fn check_bound(category: Category, index: u32, bound: Bound) -> PlcResult<()> {
    let min = u32::from(category.min_index());
    let max = u32::from(category.max_index());

    match category {
        Category::X | Category::Y => {
            let slot = index % 100;
            if slot == 0 || slot > u32::from(SLOTS_PER_BLOCK) {
                return Err(PlcError::address(format!(
                    "{} {} address must be *01-*16.",
                    category,
                    bound.name()
                )));
            }
            if index < min || index > max {
                return Err(PlcError::address(format!(
                    "{} {} address must be in [001, {}].",
                    category,
                    bound.name(),
                    max
                )));
            }
        }
        Category::C => {
            if index < min || index > max {
                let message = match bound {
                    Bound::Start => format!("C start address must be {}-{}.", min, max),
                    Bound::End => format!("C end address must be >start and <{}.", max),
                };
                return Err(PlcError::address(message));
            }
        }
        Category::DS | Category::DF => {
            if index < min || index > max {
                let message = match bound {
                    Bound::Start => format!("{} must be in [{}, {}]", category, min, max),
                    Bound::End => format!("{} end must be in [{}, {}]", category, min, max),
                };
                return Err(PlcError::address(message));
            }
        }
    }
    Ok(())
}
