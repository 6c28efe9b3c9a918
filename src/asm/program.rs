//! Program file format.
//!
//! A program file is plain text:
//! - One instruction per line, as an 11-bit word or a `"011 0001 0101"` triple
//! - Lines starting with `;` are comments, as is anything after a `;`
//! - Blank lines are ignored
//!
//! At most 16 instructions, matching the program store.

use crate::asm::disasm::{format_instruction, split_fields};
use crate::bits::InstructionWord;
use crate::cpu::decode::{decode, encode, Instruction};
use crate::cpu::memory::PROGRAM_SIZE;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// A loaded program file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramFile {
    /// The program instructions.
    pub instructions: Vec<Instruction>,
    /// Original source lines (for debugging).
    pub source_lines: Vec<String>,
}

impl ProgramFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from instructions, using their assembly text as the source lines.
    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        Self {
            instructions: instructions.to_vec(),
            source_lines: instructions.iter().map(format_instruction).collect(),
        }
    }

    /// Add an instruction.
    pub fn push(&mut self, instr: Instruction, source: &str) {
        self.instructions.push(instr);
        self.source_lines.push(source.to_string());
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Parse program file text.
    pub fn parse(text: &str) -> Result<Self, ProgramFileError> {
        let mut program = ProgramFile::new();

        for (line_num, line) in text.lines().enumerate() {
            let code = line.split(';').next().unwrap_or_default();
            let bits: String = code.chars().filter(|c| !c.is_whitespace()).collect();
            if bits.is_empty() {
                continue;
            }

            let word = InstructionWord::parse(&bits).map_err(|e| ProgramFileError::Parse {
                line: line_num + 1,
                message: e.to_string(),
            })?;

            if program.len() == PROGRAM_SIZE {
                return Err(ProgramFileError::TooLarge);
            }
            program.push(decode(word), line.trim());
        }

        Ok(program)
    }

    /// Render as program file text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("; 4-bit machine program\n");
        out.push_str(&format!("; {} instructions\n\n", self.len()));
        for (i, instr) in self.instructions.iter().enumerate() {
            out.push_str(&format!(
                "{} ; {:02} {}\n",
                split_fields(&encode(instr)),
                i,
                format_instruction(instr)
            ));
        }
        out
    }
}

/// Load a program file from disk.
pub fn load_program_file<P: AsRef<Path>>(path: P) -> Result<ProgramFile, ProgramFileError> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut text = String::new();
    for line in BufReader::new(file).lines() {
        text.push_str(&line?);
        text.push('\n');
    }
    ProgramFile::parse(&text)
}

/// Save a program file to disk.
pub fn save_program_file<P: AsRef<Path>>(path: P, program: &ProgramFile) -> Result<(), ProgramFileError> {
    let mut file = std::fs::File::create(path.as_ref())?;
    file.write_all(program.render().as_bytes())?;
    Ok(())
}

/// Errors that can occur reading or writing program files.
#[derive(Debug, Error)]
pub enum ProgramFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("program has more than 16 instructions")]
    TooLarge,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Opcode;

    #[test]
    fn test_parse_both_forms() {
        let text = "; demo\n011 0001 0101\n\n01100100011 ; IMMD R2, 3\n";
        let program = ProgramFile::parse(text).unwrap();

        assert_eq!(program.len(), 2);
        assert_eq!(program.instructions[0], Instruction::with(Opcode::Immd, 1, 5).unwrap());
        assert_eq!(program.instructions[1], Instruction::with(Opcode::Immd, 2, 3).unwrap());
        assert_eq!(program.source_lines[0], "011 0001 0101");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ProgramFile::parse("011 0001 010"),
            Err(ProgramFileError::Parse { line: 1, .. })
        ));
        let too_long = "000 0000 0000\n".repeat(17);
        assert!(matches!(ProgramFile::parse(&too_long), Err(ProgramFileError::TooLarge)));
    }

    #[test]
    fn test_render_parses_back() {
        let program = ProgramFile::from_instructions(&[
            Instruction::with(Opcode::Immd, 1, 5).unwrap(),
            Instruction::with(Opcode::JumpIfZero, 0, 4).unwrap(),
        ]);
        let parsed = ProgramFile::parse(&program.render()).unwrap();
        assert_eq!(parsed.instructions, program.instructions);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("nibble-{}.nib", std::process::id()));
        let program = ProgramFile::from_instructions(&[Instruction::with(Opcode::Or, 3, 4).unwrap()]);

        save_program_file(&path, &program).unwrap();
        let loaded = load_program_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.instructions, program.instructions);
    }
}
