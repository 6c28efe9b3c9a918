//! Machine execution engine.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::bits::{arith, BitOps, InstructionWord, Nibble};
use crate::cpu::{ProgramStore, RegisterFile, Clock};
use crate::cpu::decode::{self, Instruction, Opcode, DecodeError};
use crate::cpu::loader::Loader;
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{RegisterError, ACCUMULATOR, REGISTER_COUNT};
use crate::cpu::memory::PROGRAM_SIZE;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// The complete machine state: registers, clock, program store and the
/// diagnostic cycle counter.
///
/// State changes only through [`Machine::load`]/[`Machine::loader`],
/// [`Machine::execute`] (and the cycle methods built on it) and
/// [`Machine::reset`].
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Machine {
    regs: RegisterFile,
    clock: Clock,
    program: ProgramStore,
    /// Executed cycles; no effect on semantics.
    cycles: u64,
    /// Last executed instruction (for display).
    last_instr: Option<Instruction>,
}

/// Report of a single machine cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Clock value the instruction was taken from (direct input reports the
    /// clock value at the time it was entered).
    pub address: u8,
    pub instruction: Instruction,
    /// A successful JMP_IF_ZERO; the automatic clock advance was skipped.
    pub jumped: bool,
    /// Error reported by the instruction. The instruction was a no-op.
    #[serde(serialize_with = "serialize_fault")]
    pub fault: Option<CpuError>,
}

fn serialize_fault<S: serde::Serializer>(fault: &Option<CpuError>, s: S) -> Result<S::Ok, S::Error> {
    match fault {
        Some(e) => s.collect_str(e),
        None => s.serialize_none(),
    }
}

/// A read-only copy of the machine state for display layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: [Nibble; REGISTER_COUNT],
    pub clock: Nibble,
    pub program: [InstructionWord; PROGRAM_SIZE],
    pub cycles: u64,
    pub last_instruction: Option<Instruction>,
}

impl Machine {
    /// Create a machine with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            clock: Clock::new(),
            program: ProgramStore::new(),
            cycles: 0,
            last_instr: None,
        }
    }

    /// Zero every register, program word, the clock and the cycle counter.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.clock.reset();
        self.program.clear();
        self.cycles = 0;
        self.last_instr = None;
        debug!("machine reset");
    }

    /// Start a loading session. Its write cursor starts at address 0.
    pub fn loader(&mut self) -> Loader<'_> {
        Loader::new(&mut self.program)
    }

    /// Load a program into addresses `0..program.len()`.
    ///
    /// Words past the end of the program keep their previous contents
    /// (zero after a reset). The clock is not touched.
    pub fn load(&mut self, program: &[Instruction]) -> Result<usize, CpuError> {
        if program.len() > PROGRAM_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: PROGRAM_SIZE,
            }
            .into());
        }
        for instr in program {
            instr.validate()?;
        }

        let mut loader = self.loader();
        for instr in program {
            loader.push(*instr)?;
        }
        Ok(loader.finish())
    }

    /// Execute one instruction against the registers and clock.
    ///
    /// Returns `true` iff a JMP_IF_ZERO took its jump, in which case the
    /// caller must not advance the clock this cycle. On error nothing is
    /// modified.
    pub fn execute(&mut self, instr: Instruction) -> Result<bool, CpuError> {
        instr.validate()?;
        let Instruction { opcode, operand1: a, operand2: b } = instr;

        trace!(%opcode, operand1 = a, operand2 = b, "execute");

        match opcode {
            Opcode::Add => {
                let (sum, _carry) = arith::add(&self.regs.read(a)?, &self.regs.read(b)?);
                self.regs.write(ACCUMULATOR, sum)?;
            }

            Opcode::Sub => {
                let (diff, _borrow) = arith::subtract(&self.regs.read(a)?, &self.regs.read(b)?);
                self.regs.write(ACCUMULATOR, diff)?;
            }

            Opcode::Mov => {
                let value = self.regs.read(a)?;
                self.regs.write(b, value)?;
            }

            Opcode::Immd => {
                // operand 2 is data, not an address
                self.regs.write(a, Nibble::wrapping_from(b as u32))?;
            }

            Opcode::JumpIfZero => {
                // operand 1 is the target clock value, not a register
                if self.regs.read(b)?.is_zero() {
                    self.clock.set(Nibble::wrapping_from(a as u32));
                    debug!(target = a, condition = b, "jump taken");
                    return Ok(true);
                }
            }

            Opcode::And => {
                let result = self.regs.read(a)?.bit_and(&self.regs.read(b)?);
                self.regs.write(ACCUMULATOR, result)?;
            }

            Opcode::Or => {
                let result = self.regs.read(a)?.bit_or(&self.regs.read(b)?);
                self.regs.write(ACCUMULATOR, result)?;
            }

            Opcode::Not => {
                let value = self.regs.read(a)?;
                self.regs.write(b, value.bit_not())?;
            }
        }

        Ok(false)
    }

    /// Validate raw field values and execute them.
    pub fn execute_raw(&mut self, opcode: u8, operand1: u8, operand2: u8) -> Result<bool, CpuError> {
        let instr = Instruction::new(opcode, operand1, operand2)?;
        self.execute(instr)
    }

    /// Run one cycle from the program store: fetch the word at the clock,
    /// decode, execute, then advance the clock unless a jump was taken.
    pub fn step(&mut self) -> Cycle {
        let address = self.clock.address();
        // The clock is 4 bits and the store has 16 words, so this cannot miss.
        let word = self.program.words()[address];
        self.cycle(decode::decode(word))
    }

    /// Run one cycle from operator input, bypassing the program store.
    ///
    /// Registers and clock change exactly as if the instruction had been
    /// fetched from the store.
    pub fn step_direct(&mut self, instr: Instruction) -> Cycle {
        self.cycle(instr)
    }

    fn cycle(&mut self, instr: Instruction) -> Cycle {
        let address = self.clock.value().to_u8();
        let (jumped, fault) = match self.execute(instr) {
            Ok(jumped) => (jumped, None),
            Err(e) => {
                warn!(address, ?instr, error = %e, "instruction reported an error");
                (false, Some(e))
            }
        };

        if !jumped {
            self.clock.advance();
        }
        self.cycles += 1;
        self.last_instr = Some(instr);

        Cycle { address, instruction: instr, jumped, fault }
    }

    /// Set the clock back to 0 before a run.
    pub(crate) fn rewind(&mut self) {
        self.clock.reset();
    }

    /// Copy the full state for display.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: *self.regs.values(),
            clock: self.clock.value(),
            program: *self.program.words(),
            cycles: self.cycles,
            last_instruction: self.last_instr,
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn program(&self) -> &ProgramStore {
        &self.program
    }

    /// Number of cycles executed since the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("clock", &self.clock.value())
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors reported by the engine. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("{0}")]
    AddressOutOfRange(#[from] RegisterError),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),
}
