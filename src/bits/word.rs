//! Fixed-width binary words.
//!
//! All words store their bits most-significant first, matching how the
//! operator enters them (`0101` is five). The machine uses three widths:
//! - [`Nibble`]: 4-bit register, clock and operand values
//! - [`OpcodeBits`]: the 3-bit opcode field
//! - [`InstructionWord`]: the 11-bit program store word

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use crate::bits::Bit;

/// Largest width accepted by [`to_bits`].
pub const MAX_WIDTH: u32 = 32;

/// Convert an unsigned value to `width` bits, most significant first.
///
/// Fails if `width` is outside `1..=32` or `value` does not fit.
pub fn to_bits(value: u32, width: u32) -> Result<Vec<Bit>, BitError> {
    if width == 0 || width > MAX_WIDTH {
        return Err(BitError::WidthOutOfRange(width));
    }
    if width < MAX_WIDTH && value >> width != 0 {
        return Err(BitError::RangeError { value, width });
    }

    Ok((0..width)
        .rev()
        .map(|shift| Bit::from_bool((value >> shift) & 1 == 1))
        .collect())
}

/// Convert bits (most significant first) back to an unsigned value.
///
/// Never fails; sequences longer than 32 bits keep only their low 32.
pub fn from_bits(bits: &[Bit]) -> u32 {
    bits.iter()
        .fold(0u32, |acc, bit| (acc << 1) | bit.to_u8() as u32)
}

/// A word of exactly `N` bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitWord<const N: usize> {
    /// Bits stored from most significant (index 0) to least significant (index N-1)
    bits: [Bit; N],
}

/// 4-bit value held by a register, the clock or an operand field.
pub type Nibble = BitWord<4>;

/// 3-bit opcode field.
pub type OpcodeBits = BitWord<3>;

/// 11-bit instruction word: `opcode(3) ++ operand1(4) ++ operand2(4)`.
pub type InstructionWord = BitWord<11>;

impl<const N: usize> BitWord<N> {
    /// Number of bits in this word.
    pub const WIDTH: usize = N;

    /// Largest value this word can hold.
    pub const MAX: u32 = ((1u64 << N) - 1) as u32;

    /// All-zero word.
    #[inline]
    pub const fn zero() -> Self {
        Self { bits: [Bit::Zero; N] }
    }

    /// Create from an array of bits (MSB first).
    #[inline]
    pub const fn from_bits(bits: [Bit; N]) -> Self {
        Self { bits }
    }

    /// Get the underlying bit array (MSB first).
    #[inline]
    pub const fn bits(&self) -> &[Bit; N] {
        &self.bits
    }

    /// Get a single bit by index (0 = MSB).
    #[inline]
    pub const fn get(&self, index: usize) -> Bit {
        self.bits[index]
    }

    /// Set a single bit by index (0 = MSB).
    #[inline]
    pub fn set(&mut self, index: usize, bit: Bit) {
        self.bits[index] = bit;
    }

    /// Create from an unsigned value, failing if it does not fit.
    pub fn from_u32(value: u32) -> Result<Self, BitError> {
        if value > Self::MAX {
            return Err(BitError::RangeError { value, width: N as u32 });
        }
        Ok(Self::wrapping_from(value))
    }

    /// Create from the low `N` bits of `value`, discarding the rest.
    pub fn wrapping_from(value: u32) -> Self {
        let mut bits = [Bit::Zero; N];
        for (i, bit) in bits.iter_mut().enumerate() {
            let shift = N - 1 - i;
            *bit = Bit::from_bool(shift < 32 && (value >> shift) & 1 == 1);
        }
        Self { bits }
    }

    /// Convert to an unsigned value.
    pub fn to_u32(&self) -> u32 {
        from_bits(&self.bits)
    }

    /// Convert to a byte. Only meaningful for words of 8 bits or fewer.
    pub fn to_u8(&self) -> u8 {
        self.to_u32() as u8
    }

    /// Check if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|b| b.is_zero())
    }

    /// Take `M` bits starting at `start` (MSB-relative) as a narrower word.
    ///
    /// # Panics
    /// Panics if `start + M > N`.
    pub fn slice<const M: usize>(&self, start: usize) -> BitWord<M> {
        assert!(start + M <= N, "slice {}..{} out of range for {}-bit word", start, start + M, N);
        let mut bits = [Bit::Zero; M];
        bits.copy_from_slice(&self.bits[start..start + M]);
        BitWord { bits }
    }

    /// Parse from a string of exactly `N` `'0'`/`'1'` characters.
    ///
    /// An optional `0b` prefix and `_` separators are accepted.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        let s = s.strip_prefix("0b").unwrap_or(s);
        let digits: Vec<char> = s.chars().filter(|&c| c != '_').collect();

        if digits.len() != N {
            return Err(ParseError::WrongLength { expected: N, got: digits.len() });
        }

        let mut bits = [Bit::Zero; N];
        for (bit, &c) in bits.iter_mut().zip(digits.iter()) {
            *bit = Bit::from_char(c).ok_or(ParseError::InvalidChar(c))?;
        }
        Ok(Self { bits })
    }
}

impl<const N: usize> Default for BitWord<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> fmt::Debug for BitWord<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{} ({})", self, self.to_u32())
    }
}

impl<const N: usize> fmt::Display for BitWord<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

impl<const N: usize> FromStr for BitWord<N> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Words serialize as their bit string ("0101") so snapshots read the way the
// display layer renders them.
impl<const N: usize> Serialize for BitWord<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, const N: usize> Deserialize<'de> for BitWord<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors converting integers to bits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    #[error("value {value} does not fit in {width} bits")]
    RangeError { value: u32, width: u32 },

    #[error("bit width {0} outside 1..=32")]
    WidthOutOfRange(u32),
}

/// Errors parsing a bit string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} bits, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("invalid bit character: '{0}'")]
    InvalidChar(char),
}
