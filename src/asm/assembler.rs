//! Assembler for 4-bit machine programs.
//!
//! Each statement is one of:
//! ```text
//! ; Comment
//! 011 0001 0101       ; binary triple: opcode, operand1, operand2
//! 01100010101         ; single 11-bit word
//! LOOP:               ; label (a jump target)
//!     IMMD R1, 5      ; mnemonic form
//!     ADD R1, R2
//!     JZ LOOP, R0     ; JMP_IF_ZERO target, condition register
//! ```
//!
//! Register operands are written `R<n>` or as a bare number; literals and
//! jump targets accept decimal, `0b` binary and `0x` hex.

use crate::bits::{Nibble, OpcodeBits};
use crate::cpu::decode::{Instruction, Opcode, OPERAND_MAX};
use crate::cpu::memory::PROGRAM_SIZE;
use crate::cpu::registers::RegisterFile;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a list of instructions.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Parse one operator-entered binary triple such as `"011 0001 0101"`.
pub fn parse_triple(text: &str) -> Result<Instruction, AssemblerError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    parse_triple_parts(&parts, 1)
}

fn parse_triple_parts(parts: &[&str], line: usize) -> Result<Instruction, AssemblerError> {
    let [op, a, b] = parts else {
        return Err(AssemblerError::SyntaxError {
            line,
            message: "expected OPCODE (3-bit) INPUT1 (4-bit) INPUT2 (4-bit)".into(),
        });
    };

    let syntax = |e: crate::bits::ParseError| AssemblerError::SyntaxError {
        line,
        message: e.to_string(),
    };
    let opcode = OpcodeBits::parse(op).map_err(syntax)?;
    let operand1 = Nibble::parse(a).map_err(syntax)?;
    let operand2 = Nibble::parse(b).map_err(syntax)?;

    Instruction::new(opcode.to_u8(), operand1.to_u8(), operand2.to_u8())
        .map_err(|e| AssemblerError::SyntaxError { line, message: e.to_string() })
}

fn is_binary(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c == '0' || c == '1')
}

/// A statement whose jump target may still be a label.
enum Statement {
    Ready(Instruction),
    JumpToLabel { label: String, condition: u8, line: usize },
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Statements in address order.
    statements: Vec<Statement>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            statements: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<Instruction>, AssemblerError> {
        // Pass 1: collect labels and parse statements
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        if self.statements.len() > PROGRAM_SIZE {
            return Err(AssemblerError::ProgramTooLarge { size: self.statements.len() });
        }

        // Pass 2: resolve jump targets
        self.statements
            .iter()
            .map(|stmt| match stmt {
                Statement::Ready(instr) => Ok(*instr),
                Statement::JumpToLabel { label, condition, line } => {
                    let target = *self.symbols.get(label).ok_or_else(|| {
                        AssemblerError::UndefinedLabel { line: *line, label: label.clone() }
                    })?;
                    Instruction::with(Opcode::JumpIfZero, target, *condition).map_err(|e| {
                        AssemblerError::SyntaxError { line: *line, message: e.to_string() }
                    })
                }
            })
            .collect()
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        // Label definition
        if let Some((label, rest)) = line.split_once(':') {
            let label = label.trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", label),
                });
            }
            let addr = self.statements.len();
            if addr >= PROGRAM_SIZE {
                return Err(AssemblerError::ProgramTooLarge { size: addr + 1 });
            }
            self.symbols.insert(label, addr as u8);

            let rest = rest.trim();
            if !rest.is_empty() {
                self.process_statement(rest, line_num)?;
            }
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();

        let stmt = match parts.as_slice() {
            [word] if is_binary(word) => {
                let word = crate::bits::InstructionWord::parse(word).map_err(|e| {
                    AssemblerError::SyntaxError { line: line_num, message: e.to_string() }
                })?;
                Statement::Ready(crate::cpu::decode::decode(word))
            }
            [op, ..] if is_binary(op) => {
                Statement::Ready(parse_triple_parts(&parts, line_num)?)
            }
            [mnemonic, operands @ ..] => self.parse_mnemonic(mnemonic, operands, line_num)?,
            [] => return Ok(()),
        };

        self.statements.push(stmt);
        Ok(())
    }

    fn parse_mnemonic(&self, mnemonic: &str, operands: &[&str], line_num: usize)
        -> Result<Statement, AssemblerError>
    {
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
            AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.to_uppercase() }
        })?;

        let [first, second] = operands else {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("{} takes exactly 2 operands, got {}", opcode, operands.len()),
            });
        };

        let stmt = match opcode {
            Opcode::Immd => {
                let dst = parse_register(first, line_num)?;
                let value = parse_value(second, line_num)?;
                Statement::Ready(Instruction { opcode, operand1: dst, operand2: value })
            }
            Opcode::JumpIfZero => {
                let condition = parse_register(second, line_num)?;
                match parse_number(first) {
                    Some(_) => {
                        let target = parse_value(first, line_num)?;
                        Statement::Ready(Instruction { opcode, operand1: target, operand2: condition })
                    }
                    None => Statement::JumpToLabel {
                        label: first.to_uppercase(),
                        condition,
                        line: line_num,
                    },
                }
            }
            _ => {
                let a = parse_register(first, line_num)?;
                let b = parse_register(second, line_num)?;
                Statement::Ready(Instruction { opcode, operand1: a, operand2: b })
            }
        };

        Ok(stmt)
    }
}

fn parse_number(token: &str) -> Option<u32> {
    let token = token.trim();
    if let Some(bin) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2).ok()
    } else if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        token.parse().ok()
    }
}

/// Parse a 4-bit literal or jump target.
fn parse_value(token: &str, line: usize) -> Result<u8, AssemblerError> {
    let value = parse_number(token).ok_or_else(|| AssemblerError::SyntaxError {
        line,
        message: format!("invalid number '{}'", token),
    })?;
    if value > OPERAND_MAX as u32 {
        return Err(AssemblerError::ValueOutOfRange { line, value });
    }
    Ok(value as u8)
}

/// Parse a register operand (`R3` or `3`).
fn parse_register(token: &str, line: usize) -> Result<u8, AssemblerError> {
    let digits = token
        .strip_prefix('R')
        .or_else(|| token.strip_prefix('r'))
        .unwrap_or(token);
    let value = parse_value(digits, line)?;
    RegisterFile::check(value).map_err(|e| AssemblerError::SyntaxError {
        line,
        message: e.to_string(),
    })?;
    Ok(value)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program has {size} words, the program store holds 16")]
    ProgramTooLarge { size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(opcode: Opcode, a: u8, b: u8) -> Instruction {
        Instruction::with(opcode, a, b).unwrap()
    }

    #[test]
    fn test_parse_triple() {
        assert_eq!(parse_triple("011 0001 0101").unwrap(), ins(Opcode::Immd, 1, 5));
        assert_eq!(parse_triple("  100 0110   0011 ").unwrap(), ins(Opcode::JumpIfZero, 6, 3));
    }

    #[test]
    fn test_parse_triple_rejects_bad_input() {
        assert!(parse_triple("011 0001").is_err());
        assert!(parse_triple("0110 0001 0101").is_err());
        assert!(parse_triple("011 0001 01012").is_err());
        assert!(parse_triple("011 0001 0101 0000").is_err());
    }

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; add two numbers
            IMMD R1, 5
            IMMD R2 3
            ADD R1, R2
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![
            ins(Opcode::Immd, 1, 5),
            ins(Opcode::Immd, 2, 3),
            ins(Opcode::Add, 1, 2),
        ]);
    }

    #[test]
    fn test_assemble_binary_forms() {
        let source = "011 0001 0101\n00000010010 ; ADD R1, R2\n";
        let result = assemble(source).unwrap();
        assert_eq!(result, vec![ins(Opcode::Immd, 1, 5), ins(Opcode::Add, 1, 2)]);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            IMMD R1, 0
            JZ END, R1
            NOT R1, R1
        END: OR R1, R1
            JMP_IF_ZERO START, R0
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result[1], ins(Opcode::JumpIfZero, 3, 1));
        assert_eq!(result[3], ins(Opcode::Or, 1, 1));
        assert_eq!(result[4], ins(Opcode::JumpIfZero, 0, 0));
    }

    #[test]
    fn test_numeric_literals() {
        let result = assemble("IMMD R3, 0b1010\nIMMD R4, 0xF\nJZ 0b0110, 3").unwrap();
        assert_eq!(result[0].operand2, 10);
        assert_eq!(result[1].operand2, 15);
        assert_eq!(result[2], ins(Opcode::JumpIfZero, 6, 3));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            assemble("HLT R0, R0"),
            Err(AssemblerError::UnknownMnemonic { line: 1, .. })
        ));
        assert!(matches!(
            assemble("IMMD R1, 16"),
            Err(AssemblerError::ValueOutOfRange { line: 1, value: 16 })
        ));
        assert!(matches!(
            assemble("\nADD R15, R1"),
            Err(AssemblerError::SyntaxError { line: 2, .. })
        ));
        assert!(matches!(
            assemble("JZ NOWHERE, R0"),
            Err(AssemblerError::UndefinedLabel { line: 1, .. })
        ));
        assert!(matches!(
            assemble("MOV R1"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
    }

    #[test]
    fn test_program_too_large() {
        let source = "ADD R0, R0\n".repeat(17);
        assert_eq!(assemble(&source), Err(AssemblerError::ProgramTooLarge { size: 17 }));
        assert_eq!(assemble(&"ADD R0, R0\n".repeat(16)).unwrap().len(), 16);
    }
}
