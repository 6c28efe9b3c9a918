//! Program loading sessions.
//!
//! A [`Loader`] writes instructions into consecutive program store words
//! starting at address 0. It keeps its own write cursor, so loading never
//! disturbs the clock. Dropping or finishing the loader early leaves the
//! remaining words untouched.

use crate::cpu::decode::{encode, Instruction};
use crate::cpu::memory::{MemoryError, ProgramStore, PROGRAM_SIZE};
use crate::cpu::CpuError;
use tracing::debug;

/// An open loading session on a program store.
#[derive(Debug)]
pub struct Loader<'a> {
    store: &'a mut ProgramStore,
    cursor: usize,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(store: &'a mut ProgramStore) -> Self {
        Self { store, cursor: 0 }
    }

    /// Write the next instruction, returning the address it was stored at.
    pub fn push(&mut self, instr: Instruction) -> Result<usize, CpuError> {
        instr.validate()?;
        if self.cursor >= PROGRAM_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: self.cursor + 1,
                available: PROGRAM_SIZE,
            }
            .into());
        }

        let addr = self.cursor;
        self.store.write(addr, encode(&instr))?;
        self.cursor += 1;
        Ok(addr)
    }

    /// Address the next instruction will be written to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether all 16 words have been written.
    pub fn is_full(&self) -> bool {
        self.cursor >= PROGRAM_SIZE
    }

    /// End the session, returning the number of words written.
    pub fn finish(self) -> usize {
        debug!(words = self.cursor, "program loaded");
        self.cursor
    }
}
