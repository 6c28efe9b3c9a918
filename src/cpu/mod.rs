//! Machine emulation.
//!
//! This module implements the complete 4-bit machine:
//! - 15 four-bit registers, R0 receiving ALU results
//! - a 4-bit clock used as the program counter
//! - 16 eleven-bit program words
//! - an 8-instruction set: ADD, SUB, MOV, IMMD, JMP_IF_ZERO, AND, OR, NOT

pub mod memory;
pub mod registers;
pub mod decode;
pub mod loader;
pub mod execute;

pub use memory::{ProgramStore, MemoryError, PROGRAM_SIZE};
pub use registers::{RegisterFile, Clock, RegisterError, REGISTER_COUNT};
pub use decode::{Instruction, Opcode, DecodeError};
pub use loader::Loader;
pub use execute::{Machine, Cycle, Snapshot, CpuError};
