use std::fmt::Debug;
use std::hash::Hash;

use num::{Bounded, FromPrimitive, Unsigned};

/// Integer type used to store table coordinates in predecessor entries.
///
/// Smaller widths keep the predecessor tables compact when the sequence
/// lengths permit; the public alignment result always uses `usize`.
pub trait OffsetType: FromPrimitive + Unsigned + PartialEq + Eq +
    PartialOrd + Ord + Default + Copy + Hash + Debug + Bounded
{
    fn new(value: usize) -> Self;
    fn as_usize(&self) -> usize;
}

impl OffsetType for u16 {
    #[inline(always)]
    fn new(value: usize) -> Self {
        value as Self
    }

    #[inline(always)]
    fn as_usize(&self) -> usize {
        *self as usize
    }
}

impl OffsetType for u32 {
    #[inline(always)]
    fn new(value: usize) -> Self {
        value as Self
    }

    #[inline(always)]
    fn as_usize(&self) -> usize {
        *self as usize
    }
}

impl OffsetType for u64 {
    #[inline(always)]
    fn new(value: usize) -> Self {
        value as Self
    }

    #[inline(always)]
    fn as_usize(&self) -> usize {
        *self as usize
    }
}

impl OffsetType for usize {
    #[inline(always)]
    fn new(value: usize) -> Self {
        value
    }

    #[inline(always)]
    fn as_usize(&self) -> usize {
        *self
    }
}
