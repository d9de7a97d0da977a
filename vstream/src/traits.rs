//! Traits

use num_traits::{PrimInt, Unsigned};
use std::fmt::Debug;

/// An unsigned integer type that can hold a fixed-width bitstream field.
///
/// Fields are moved through a `u64` accumulator, so any primitive unsigned
/// integer up to 64 bits wide qualifies.
pub trait BitField: PrimInt + Unsigned + Debug {
    /// Width of the type in bits.
    fn bit_width() -> u32 {
        Self::zero().count_zeros()
    }
}

impl<T> BitField for T where T: PrimInt + Unsigned + Debug {}
