//! Register file and clock.
//!
//! The machine has:
//! - R0..R14: fifteen 4-bit general registers (R0 receives ADD/SUB/AND/OR results)
//! - CLK: a 4-bit program counter addressing the program store

use crate::bits::{arith, Nibble};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of addressable registers.
pub const REGISTER_COUNT: usize = 15;

/// Register that receives ADD, SUB, AND and OR results.
pub const ACCUMULATOR: u8 = 0;

/// The general register file.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: [Nibble; REGISTER_COUNT],
}

impl RegisterFile {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self {
            regs: [Nibble::zero(); REGISTER_COUNT],
        }
    }

    /// Read a register.
    pub fn read(&self, addr: u8) -> Result<Nibble, RegisterError> {
        self.regs
            .get(addr as usize)
            .copied()
            .ok_or(RegisterError::AddressOutOfRange(addr))
    }

    /// Overwrite a register.
    pub fn write(&mut self, addr: u8, value: Nibble) -> Result<(), RegisterError> {
        let slot = self.regs
            .get_mut(addr as usize)
            .ok_or(RegisterError::AddressOutOfRange(addr))?;
        *slot = value;
        Ok(())
    }

    /// Check that `addr` names a register without reading it.
    pub fn check(addr: u8) -> Result<(), RegisterError> {
        if (addr as usize) < REGISTER_COUNT {
            Ok(())
        } else {
            Err(RegisterError::AddressOutOfRange(addr))
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.regs = [Nibble::zero(); REGISTER_COUNT];
    }

    /// All register values, R0 first.
    pub fn values(&self) -> &[Nibble; REGISTER_COUNT] {
        &self.regs
    }
}

/// The 4-bit clock register, used as the program counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clock {
    value: Nibble,
}

impl Clock {
    pub fn new() -> Self {
        Self { value: Nibble::zero() }
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> Nibble {
        self.value
    }

    /// Current value as a program store address.
    #[inline]
    pub fn address(&self) -> usize {
        self.value.to_u32() as usize
    }

    /// Ripple-increment by one; carry out of bit 3 is dropped (15 wraps to 0).
    pub fn advance(&mut self) {
        let (next, _carry) = arith::increment(&self.value);
        self.value = next;
    }

    /// Overwrite unconditionally.
    pub fn set(&mut self, value: Nibble) {
        self.value = value;
    }

    pub fn reset(&mut self) {
        self.value = Nibble::zero();
    }
}

/// Errors from register addressing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register address {0} out of range (0-14)")]
    AddressOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut regs = RegisterFile::new();
        let value = Nibble::from_u32(9).unwrap();

        regs.write(14, value).unwrap();
        assert_eq!(regs.read(14).unwrap(), value);
        assert!(regs.read(0).unwrap().is_zero());
    }

    #[test]
    fn test_out_of_range() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.read(15), Err(RegisterError::AddressOutOfRange(15)));
        assert_eq!(
            regs.write(16, Nibble::zero()),
            Err(RegisterError::AddressOutOfRange(16))
        );
        assert!(RegisterFile::check(14).is_ok());
        assert!(RegisterFile::check(15).is_err());
    }

    #[test]
    fn test_reset() {
        let mut regs = RegisterFile::new();
        regs.write(3, Nibble::from_u32(7).unwrap()).unwrap();
        regs.reset();
        assert_eq!(regs, RegisterFile::new());
    }

    #[test]
    fn test_clock_advance() {
        let mut clk = Clock::new();
        clk.advance();
        assert_eq!(clk.value().to_u32(), 1);
        assert_eq!(clk.address(), 1);
    }

    #[test]
    fn test_clock_wraps() {
        let mut clk = Clock::new();
        clk.set(Nibble::from_u32(15).unwrap());
        clk.advance();
        assert!(clk.value().is_zero());
    }

    #[test]
    fn test_clock_full_cycle() {
        let mut clk = Clock::new();
        for expected in 1..=16u32 {
            clk.advance();
            assert_eq!(clk.value().to_u32(), expected % 16);
        }
    }
}
