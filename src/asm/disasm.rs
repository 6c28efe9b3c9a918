//! Disassembler for 4-bit machine programs.
//!
//! Converts 11-bit program words back to readable assembly that
//! [`assemble`](crate::asm::assemble) accepts.

use std::fmt;
use crate::bits::InstructionWord;
use crate::cpu::decode::{decode, Instruction, Opcode};

/// Disassemble a single instruction word to text.
pub fn disassemble_instruction(word: InstructionWord) -> String {
    format_instruction(&decode(word))
}

/// Disassemble a program listing, one line per word.
pub fn disassemble(words: &[InstructionWord]) -> String {
    let mut output = String::new();
    output.push_str("; 4-bit machine disassembly\n");
    output.push_str("; -------------------------\n\n");

    for (addr, word) in words.iter().enumerate() {
        output.push_str(&format!(
            "{:02}: {:<18} ; {}\n",
            addr,
            disassemble_instruction(*word),
            split_fields(word)
        ));
    }

    output
}

/// Format a word as its three binary fields: `"011 0001 0101"`.
pub fn split_fields(word: &InstructionWord) -> String {
    let bits = word.to_string();
    format!("{} {} {}", &bits[0..3], &bits[3..7], &bits[7..11])
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    let Instruction { opcode, operand1: a, operand2: b } = *instr;
    match opcode {
        Opcode::Immd => format!("IMMD R{}, {}", a, b),
        Opcode::JumpIfZero => format!("JMP_IF_ZERO {}, R{}", a, b),
        _ => format!("{} R{}, R{}", opcode.mnemonic(), a, b),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_instruction(self))
    }
}
