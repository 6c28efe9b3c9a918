//! Instruction decoder.
//!
//! Each program store word is 11 bits, most significant first:
//! - Bits 0-2: opcode
//! - Bits 3-6: operand 1
//! - Bits 7-10: operand 2
//!
//! What an operand means depends on the opcode: usually a register address,
//! but IMMD's operand 2 is a literal and JMP_IF_ZERO's operand 1 is a clock
//! value.

use std::fmt;
use crate::bits::{BitWord, InstructionWord, Nibble, OpcodeBits};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Largest opcode field value (3 bits).
pub const OPCODE_MAX: u8 = 7;

/// Largest operand field value (4 bits).
pub const OPERAND_MAX: u8 = 15;

/// The eight operations of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// R0 := A + B (mod 16)
    Add = 0,
    /// R0 := A - B (mod 16)
    Sub = 1,
    /// dst := src
    Mov = 2,
    /// dst := literal
    Immd = 3,
    /// if cond == 0 then CLK := target
    JumpIfZero = 4,
    /// R0 := A & B
    And = 5,
    /// R0 := A | B
    Or = 6,
    /// dst := !src
    Not = 7,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mov,
        Opcode::Immd,
        Opcode::JumpIfZero,
        Opcode::And,
        Opcode::Or,
        Opcode::Not,
    ];

    /// Look up an opcode by its numeric value.
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::InvalidOpcode(value))
    }

    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mov => "MOV",
            Opcode::Immd => "IMMD",
            Opcode::JumpIfZero => "JMP_IF_ZERO",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
        }
    }

    /// Parse a mnemonic (case-insensitive). `JZ` and `JMP` are accepted for
    /// JMP_IF_ZERO.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        let op = match s.to_ascii_uppercase().as_str() {
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "MOV" => Opcode::Mov,
            "IMMD" | "IMM" => Opcode::Immd,
            "JMP_IF_ZERO" | "JZ" | "JMP" => Opcode::JumpIfZero,
            "AND" => Opcode::And,
            "OR" => Opcode::Or,
            "NOT" => Opcode::Not,
            _ => return None,
        };
        Some(op)
    }

    /// Whether operand 1 names a register.
    pub const fn operand1_is_register(self) -> bool {
        !matches!(self, Opcode::JumpIfZero)
    }

    /// Whether operand 2 names a register.
    pub const fn operand2_is_register(self) -> bool {
        !matches!(self, Opcode::Immd)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::from_u8(value)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction: opcode plus two raw 4-bit operand fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand1: u8,
    pub operand2: u8,
}

impl Instruction {
    /// Build an instruction from raw field values, rejecting any field wider
    /// than its encoding.
    pub fn new(opcode: u8, operand1: u8, operand2: u8) -> Result<Self, DecodeError> {
        check_field(Field::Opcode, opcode, OPCODE_MAX)?;
        let opcode = Opcode::from_u8(opcode)?;
        let instr = Self { opcode, operand1, operand2 };
        instr.validate()?;
        Ok(instr)
    }

    /// Build an instruction from an already-typed opcode.
    pub fn with(opcode: Opcode, operand1: u8, operand2: u8) -> Result<Self, DecodeError> {
        let instr = Self { opcode, operand1, operand2 };
        instr.validate()?;
        Ok(instr)
    }

    /// Check that both operand fields fit in 4 bits.
    pub fn validate(&self) -> Result<(), DecodeError> {
        check_field(Field::Operand1, self.operand1, OPERAND_MAX)?;
        check_field(Field::Operand2, self.operand2, OPERAND_MAX)
    }

    /// The all-zero word: `ADD R0, R0`.
    pub const fn zero() -> Self {
        Self { opcode: Opcode::Add, operand1: 0, operand2: 0 }
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::zero()
    }
}

/// Instruction fields, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Opcode,
    Operand1,
    Operand2,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Opcode => "opcode",
            Field::Operand1 => "operand1",
            Field::Operand2 => "operand2",
        })
    }
}

fn check_field(field: Field, value: u8, max: u8) -> Result<(), DecodeError> {
    if value > max {
        return Err(DecodeError::FieldOutOfRange { field, value, max });
    }
    Ok(())
}

/// Decode an 11-bit word.
///
/// Every bit pattern is a valid instruction, so this cannot fail.
pub fn decode(word: InstructionWord) -> Instruction {
    let opcode: OpcodeBits = word.slice(0);
    let operand1: Nibble = word.slice(3);
    let operand2: Nibble = word.slice(7);

    Instruction {
        opcode: Opcode::ALL[opcode.to_u32() as usize],
        operand1: operand1.to_u8(),
        operand2: operand2.to_u8(),
    }
}

/// Encode an instruction to an 11-bit word.
///
/// Operand fields wider than 4 bits are truncated; use
/// [`Instruction::validate`] first when the source is untrusted.
pub fn encode(instr: &Instruction) -> InstructionWord {
    let opcode = OpcodeBits::wrapping_from(instr.opcode.to_u8() as u32);
    let operand1 = Nibble::wrapping_from(instr.operand1 as u32);
    let operand2 = Nibble::wrapping_from(instr.operand2 as u32);

    let mut bits = [crate::bits::Bit::Zero; 11];
    bits[0..3].copy_from_slice(opcode.bits());
    bits[3..7].copy_from_slice(operand1.bits());
    bits[7..11].copy_from_slice(operand2.bits());
    BitWord::from_bits(bits)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{field} value {value} out of range (0-{max})")]
    FieldOutOfRange { field: Field, value: u8, max: u8 },

    #[error("invalid opcode: {0}")]
    InvalidOpcode(u8),
}
