//! Operator-facing program tools.
//!
//! This module provides:
//! - Binary-token parsing of operator input (`"011 0001 0101"`)
//! - A two-pass assembler with mnemonics and labels
//! - A disassembler (program words → readable text)
//! - The plain-text program file format

pub mod assembler;
pub mod disasm;
pub mod program;

pub use assembler::{assemble, parse_triple, AssemblerError};
pub use disasm::disassemble;
pub use program::{ProgramFile, ProgramFileError, load_program_file, save_program_file};
