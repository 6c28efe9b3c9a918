//! Single binary digit.
//!
//! Every register, the clock and every instruction word in the machine is an
//! ordered sequence of these. Arithmetic is performed bit-serially through
//! [`Bit::full_add`] and [`Bit::full_sub`], the same way a ripple adder chains
//! its cells.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single binary digit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Bit {
    /// Logic low (0)
    #[default]
    Zero = 0,
    /// Logic high (1)
    One = 1,
}

impl Bit {
    /// Both bit values in ascending order.
    pub const ALL: [Bit; 2] = [Bit::Zero, Bit::One];

    /// Create a bit from a boolean.
    #[inline]
    pub const fn from_bool(value: bool) -> Self {
        if value { Bit::One } else { Bit::Zero }
    }

    /// Create a bit from the lowest bit of a byte.
    #[inline]
    pub const fn from_lsb(value: u8) -> Self {
        Self::from_bool(value & 1 == 1)
    }

    /// Convert to 0 or 1.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self, Bit::Zero)
    }

    #[inline]
    pub const fn is_one(self) -> bool {
        matches!(self, Bit::One)
    }

    /// Logical complement (`1 - bit`).
    #[inline]
    pub const fn not(self) -> Self {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
        }
    }

    #[inline]
    pub const fn and(self, other: Self) -> Self {
        Self::from_bool(self.is_one() && other.is_one())
    }

    #[inline]
    pub const fn or(self, other: Self) -> Self {
        Self::from_bool(self.is_one() || other.is_one())
    }

    #[inline]
    pub const fn xor(self, other: Self) -> Self {
        Self::from_bool(self.is_one() != other.is_one())
    }

    /// Full adder: returns `(sum, carry_out)` for `self + other + carry_in`.
    #[inline]
    pub const fn full_add(self, other: Self, carry: Self) -> (Self, Self) {
        let total = self.to_u8() + other.to_u8() + carry.to_u8();
        (Self::from_lsb(total), Self::from_bool(total >= 2))
    }

    /// Full subtractor: returns `(difference, borrow_out)` for
    /// `self - other - borrow_in`.
    ///
    /// A negative column difference borrows 2 from the next column up.
    #[inline]
    pub const fn full_sub(self, other: Self, borrow: Self) -> (Self, Self) {
        let diff = self.to_u8() as i8 - other.to_u8() as i8 - borrow.to_u8() as i8;
        if diff < 0 {
            (Self::from_lsb((diff + 2) as u8), Bit::One)
        } else {
            (Self::from_lsb(diff as u8), Bit::Zero)
        }
    }

    /// Parse a bit from its character form.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Bit::Zero),
            '1' => Some(Bit::One),
            _ => None,
        }
    }

    /// Character form: `'0'` or `'1'`.
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        Bit::from_bool(value)
    }
}

impl fmt::Debug for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}
