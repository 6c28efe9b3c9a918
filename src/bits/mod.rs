//! Binary number primitives.
//!
//! This module provides the core types for the machine's fixed-width data:
//! - [`Bit`] - A single binary digit
//! - [`BitWord`] - An N-bit word, most significant bit first
//! - [`to_bits`] / [`from_bits`] - conversion between integers and bit sequences

mod bit;
mod word;
mod ops;
pub mod arith;

pub use bit::Bit;
pub use word::{
    from_bits, to_bits, BitError, BitWord, InstructionWord, Nibble, OpcodeBits, ParseError,
    MAX_WIDTH,
};
pub use ops::BitOps;
pub use arith::{add, increment, subtract};
