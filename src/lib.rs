//! # Nibble Emulator
//!
//! An emulator of a minimal 4-bit accumulator-style processor.
//!
//! The machine has fifteen 4-bit registers, a 4-bit clock that doubles as
//! the program counter, and sixteen 11-bit program words. Its eight
//! instructions (ADD, SUB, MOV, IMMD, JMP_IF_ZERO, AND, OR, NOT) are
//! executed with bit-serial ripple arithmetic, exactly as the hardware
//! would.

pub mod bits;
pub mod cpu;
pub mod asm;
pub mod run;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bits::{Bit, BitWord, Nibble, InstructionWord, to_bits, from_bits};
pub use cpu::{Machine, Cycle, Snapshot, CpuError, Instruction, Opcode};
pub use asm::{assemble, disassemble, parse_triple, AssemblerError, ProgramFile, load_program_file, save_program_file};
pub use run::{Runner, RunConfig, RunSummary, StopReason};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
