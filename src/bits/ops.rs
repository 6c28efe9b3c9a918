//! Bitwise operations trait.
//!
//! Shared by single bits and fixed-width words so the ALU can apply the
//! same per-bit logic at either granularity.

use crate::bits::{Bit, BitWord};

/// Types that support per-bit logic.
pub trait BitOps {
    /// The output type for operations that return a value of the same width.
    type Output;

    /// Complement every bit.
    fn bit_not(&self) -> Self::Output;

    /// Bitwise AND.
    fn bit_and(&self, other: &Self) -> Self::Output;

    /// Bitwise OR.
    fn bit_or(&self, other: &Self) -> Self::Output;
}

impl BitOps for Bit {
    type Output = Bit;

    #[inline]
    fn bit_not(&self) -> Bit {
        self.not()
    }

    #[inline]
    fn bit_and(&self, other: &Self) -> Bit {
        self.and(*other)
    }

    #[inline]
    fn bit_or(&self, other: &Self) -> Bit {
        self.or(*other)
    }
}

impl<const N: usize> BitOps for BitWord<N> {
    type Output = Self;

    fn bit_not(&self) -> Self {
        let mut result = *self;
        for i in 0..N {
            result.set(i, self.get(i).not());
        }
        result
    }

    fn bit_and(&self, other: &Self) -> Self {
        let mut result = *self;
        for i in 0..N {
            result.set(i, self.get(i).and(other.get(i)));
        }
        result
    }

    fn bit_or(&self, other: &Self) -> Self {
        let mut result = *self;
        for i in 0..N {
            result.set(i, self.get(i).or(other.get(i)));
        }
        result
    }
}
