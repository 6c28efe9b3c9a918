//! Program store.
//!
//! Sixteen 11-bit instruction words, addressed by the clock. Words are only
//! written while loading; execution never modifies them.

use crate::bits::InstructionWord;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of words in the program store.
pub const PROGRAM_SIZE: usize = 16;

/// Program store: 16 eleven-bit words.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramStore {
    words: [InstructionWord; PROGRAM_SIZE],
}

impl ProgramStore {
    /// Create a program store with all words zeroed.
    pub fn new() -> Self {
        Self {
            words: [InstructionWord::zero(); PROGRAM_SIZE],
        }
    }

    /// Read a word by address (0-15).
    pub fn read(&self, addr: usize) -> Result<InstructionWord, MemoryError> {
        self.words
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Write a word by address (0-15).
    pub fn write(&mut self, addr: usize, word: InstructionWord) -> Result<(), MemoryError> {
        let slot = self.words
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange(addr))?;
        *slot = word;
        Ok(())
    }

    /// Clear all words to zero.
    pub fn clear(&mut self) {
        self.words = [InstructionWord::zero(); PROGRAM_SIZE];
    }

    /// All words, address 0 first.
    pub fn words(&self) -> &[InstructionWord; PROGRAM_SIZE] {
        &self.words
    }

    /// Non-zero words with their addresses.
    pub fn dump(&self) -> Vec<(usize, InstructionWord)> {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.is_zero())
            .map(|(i, w)| (i, *w))
            .collect()
    }
}

impl std::fmt::Debug for ProgramStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramStore")
            .field("non_zero_words", &self.dump().len())
            .field("total_words", &PROGRAM_SIZE)
            .finish()
    }
}

/// Errors that can occur during program store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program address {0} out of range (0-15)")]
    AddressOutOfRange(usize),

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut store = ProgramStore::new();
        let word = InstructionWord::parse("01100010101").unwrap();

        store.write(15, word).unwrap();
        assert_eq!(store.read(15).unwrap(), word);
        assert!(store.read(0).unwrap().is_zero());
    }

    #[test]
    fn test_bounds() {
        let mut store = ProgramStore::new();
        assert_eq!(store.read(16), Err(MemoryError::AddressOutOfRange(16)));
        assert!(store.write(16, InstructionWord::zero()).is_err());
    }

    #[test]
    fn test_clear_and_dump() {
        let mut store = ProgramStore::new();
        store.write(2, InstructionWord::from_u32(7).unwrap()).unwrap();
        assert_eq!(store.dump().len(), 1);

        store.clear();
        assert!(store.dump().is_empty());
    }
}
