//! Provides `FieldMask`, the set of column indices that make up a record's
//! key. Bit `i` selects column `i`. Masks are attached to every node of the
//! parsed expression; the default mask selects every column.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// The largest number of columns a record can have. The largest column index
/// a mask can name is `MAX_FIELDS - 1`.
pub const MAX_FIELDS: usize = 32;

/// A compact set of column indices: bit `i` set means column `i` belongs to
/// the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMask(u32);

impl FieldMask {
    /// The mask selecting every column.
    pub const ALL: FieldMask = FieldMask(u32::MAX);
    /// The mask selecting no column.
    pub const EMPTY: FieldMask = FieldMask(0);

    /// The mask selecting just column `index` (or nothing, if `index` is out
    /// of range).
    #[must_use]
    pub fn single(index: usize) -> FieldMask {
        FieldMask::span(index, index)
    }

    /// The mask selecting columns `lo` through `hi`, inclusive. An inverted
    /// pair or a `lo` past the last column selects nothing; a `hi` past the
    /// last column is clamped to it.
    #[must_use]
    pub fn span(lo: usize, hi: usize) -> FieldMask {
        if lo > hi || lo >= MAX_FIELDS {
            return FieldMask::EMPTY;
        }
        FieldMask(low_bits(hi.saturating_add(1)) & !low_bits(lo))
    }

    /// Does the mask select column `index`? Always false for `index` of
    /// `MAX_FIELDS` or more.
    #[must_use]
    pub fn contains(self, index: usize) -> bool {
        index < MAX_FIELDS && self.0 & (1 << index) != 0
    }

    /// The mask restricted to the columns a record with `field_count`
    /// columns actually has.
    #[must_use]
    pub fn below(self, field_count: usize) -> FieldMask {
        FieldMask(self.0 & low_bits(field_count))
    }

    /// Does the mask select any column at or past `field_count`?
    #[must_use]
    pub fn reaches(self, field_count: usize) -> bool {
        self.0 & !low_bits(field_count) != 0
    }

    /// True if a record with `field_count` columns has no key at all under
    /// this mask. Such records are dropped by normalization.
    #[must_use]
    pub fn selects_none_of(self, field_count: usize) -> bool {
        self.below(field_count).is_empty()
    }

    /// Does the mask select nothing?
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The selected column indices, in ascending order.
    #[must_use]
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..MAX_FIELDS).filter(move |index| self.contains(*index))
    }
}

/// The `u32` with every bit below `n` set. Saturates at all-ones for `n` of
/// `MAX_FIELDS` or more.
fn low_bits(n: usize) -> u32 {
    if n >= MAX_FIELDS {
        u32::MAX
    } else {
        (1 << n) - 1
    }
}

impl BitOr for FieldMask {
    type Output = FieldMask;
    fn bitor(self, other: FieldMask) -> FieldMask {
        FieldMask(self.0 | other.0)
    }
}

impl BitOrAssign for FieldMask {
    fn bitor_assign(&mut self, other: FieldMask) {
        self.0 |= other.0;
    }
}

impl Default for FieldMask {
    fn default() -> FieldMask {
        FieldMask::ALL
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
