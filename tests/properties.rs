//! Property tests for the arithmetic and execution rules.

use proptest::prelude::*;

use nibble::bits::{add, subtract, BitOps};
use nibble::{from_bits, to_bits, Instruction, Machine, Nibble, Opcode};

fn nibble(v: u8) -> Nibble {
    Nibble::wrapping_from(v as u32)
}

fn ins(opcode: Opcode, a: u8, b: u8) -> Instruction {
    Instruction { opcode, operand1: a, operand2: b }
}

/// Machine with R1 = a and R2 = b.
fn loaded(a: u8, b: u8) -> Machine {
    let mut m = Machine::new();
    m.execute(ins(Opcode::Immd, 1, a)).unwrap();
    m.execute(ins(Opcode::Immd, 2, b)).unwrap();
    m
}

proptest! {
    #[test]
    fn bits_roundtrip(width in 1u32..=32, raw in any::<u32>()) {
        let value = if width == 32 { raw } else { raw % (1u32 << width) };
        let bits = to_bits(value, width).unwrap();
        prop_assert_eq!(bits.len(), width as usize);
        prop_assert_eq!(from_bits(&bits), value);
    }

    #[test]
    fn bits_reject_oversized(width in 1u32..32, extra in 0u32..1000) {
        let value = (1u32 << width) + extra;
        prop_assert!(to_bits(value, width).is_err());
    }

    #[test]
    fn add_wraps_mod_16(a in 0u8..16, b in 0u8..16) {
        let (sum, _) = add(&nibble(a), &nibble(b));
        prop_assert_eq!(sum.to_u8(), (a + b) % 16);
    }

    #[test]
    fn subtract_wraps_mod_16(a in 0u8..16, b in 0u8..16) {
        let (diff, _) = subtract(&nibble(a), &nibble(b));
        prop_assert_eq!(diff.to_u8(), (a + 16 - b) % 16);
    }

    #[test]
    fn not_is_involution(a in 0u8..16) {
        let n = nibble(a);
        prop_assert_eq!(n.bit_not().bit_not(), n);
        prop_assert_eq!(n.bit_not().to_u8(), !a & 0xF);
    }

    #[test]
    fn and_or_commute_and_idempotent(a in 0u8..16, b in 0u8..16) {
        let (x, y) = (nibble(a), nibble(b));
        prop_assert_eq!(x.bit_and(&y), y.bit_and(&x));
        prop_assert_eq!(x.bit_or(&y), y.bit_or(&x));
        prop_assert_eq!(x.bit_and(&x), x);
        prop_assert_eq!(x.bit_or(&x), x);
        prop_assert_eq!(x.bit_and(&y).to_u8(), a & b);
        prop_assert_eq!(x.bit_or(&y).to_u8(), a | b);
    }

    #[test]
    fn alu_ops_write_r0(a in 0u8..16, b in 0u8..16) {
        let mut m = loaded(a, b);
        for (op, expected) in [
            (Opcode::Add, (a + b) % 16),
            (Opcode::Sub, (a + 16 - b) % 16),
            (Opcode::And, a & b),
            (Opcode::Or, a | b),
        ] {
            m.execute(ins(op, 1, 2)).unwrap();
            prop_assert_eq!(m.registers().values()[0].to_u8(), expected);
            prop_assert_eq!(m.registers().values()[1].to_u8(), a);
            prop_assert_eq!(m.registers().values()[2].to_u8(), b);
        }
    }

    #[test]
    fn jump_if_zero_rule(target in 0u8..16, cond in 0u8..15, value in 0u8..16) {
        let mut m = Machine::new();
        m.execute(ins(Opcode::Immd, cond, value)).unwrap();
        let clock_before = m.clock().value();

        let cycle = m.step_direct(ins(Opcode::JumpIfZero, target, cond));
        prop_assert!(cycle.fault.is_none());
        if value == 0 {
            prop_assert!(cycle.jumped);
            prop_assert_eq!(m.clock().value().to_u8(), target);
        } else {
            prop_assert!(!cycle.jumped);
            prop_assert_eq!(m.clock().value().to_u8(), (clock_before.to_u8() + 1) % 16);
        }
    }

    #[test]
    fn register_15_is_a_no_op(op_index in 0usize..8, first in any::<bool>(), other in 0u8..16) {
        let opcode = Opcode::ALL[op_index];
        // put 15 in a register-valued operand slot
        let use_first = if opcode.operand1_is_register() && opcode.operand2_is_register() {
            first
        } else {
            opcode.operand1_is_register()
        };
        let (a, b) = if use_first { (15, other) } else { (other, 15) };

        let mut m = loaded(7, 9);
        let before = m.snapshot();
        prop_assert!(m.execute(ins(opcode, a, b)).is_err());
        prop_assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn oversized_fields_rejected(opcode in 8u8..=255, a in 16u8..=255, b in 0u8..16) {
        let mut m = Machine::new();
        let before = m.snapshot();
        prop_assert!(m.execute_raw(opcode, 0, b).is_err());
        prop_assert!(m.execute_raw(0, a, b).is_err());
        prop_assert!(m.execute_raw(0, b, a).is_err());
        prop_assert_eq!(m.snapshot(), before);
    }
}

fn r(m: &Machine, addr: u8) -> u8 {
    m.registers().read(addr).unwrap().to_u8()
}

proptest! {
    #[test]
    fn execute_not_twice_restores(src in 0u8..15, dst in 0u8..15, value in 0u8..16) {
        let mut m = Machine::new();
        m.execute(ins(Opcode::Immd, src, value)).unwrap();

        m.execute(ins(Opcode::Not, src, dst)).unwrap();
        prop_assert_eq!(r(&m, dst), !value & 0xF);
        m.execute(ins(Opcode::Not, dst, dst)).unwrap();
        prop_assert_eq!(r(&m, dst), value);
        if src != dst {
            prop_assert_eq!(r(&m, src), value);
        }
    }

    #[test]
    fn execute_and_or_commute(
        ra in 1u8..15, rb in 1u8..15, a in 0u8..16, b in 0u8..16,
    ) {
        prop_assume!(ra != rb);
        let mut m = Machine::new();
        m.execute(ins(Opcode::Immd, ra, a)).unwrap();
        m.execute(ins(Opcode::Immd, rb, b)).unwrap();

        for (op, expected) in [(Opcode::And, a & b), (Opcode::Or, a | b)] {
            m.execute(ins(op, ra, rb)).unwrap();
            let forward = r(&m, 0);
            m.execute(ins(op, rb, ra)).unwrap();
            prop_assert_eq!(r(&m, 0), forward);
            prop_assert_eq!(forward, expected);
        }
    }

    #[test]
    fn execute_and_or_idempotent(reg in 1u8..15, a in 0u8..16) {
        let mut m = Machine::new();
        m.execute(ins(Opcode::Immd, reg, a)).unwrap();

        m.execute(ins(Opcode::And, reg, reg)).unwrap();
        prop_assert_eq!(r(&m, 0), a);
        m.execute(ins(Opcode::Immd, 0, 0)).unwrap();
        m.execute(ins(Opcode::Or, reg, reg)).unwrap();
        prop_assert_eq!(r(&m, 0), a);
        prop_assert_eq!(r(&m, reg), a);
    }

    #[test]
    fn execute_and_or_through_accumulator(a in 0u8..16) {
        // operands may name R0 itself
        let mut m = Machine::new();
        m.execute(ins(Opcode::Immd, 0, a)).unwrap();
        m.execute(ins(Opcode::And, 0, 0)).unwrap();
        prop_assert_eq!(r(&m, 0), a);
        m.execute(ins(Opcode::Or, 0, 0)).unwrap();
        prop_assert_eq!(r(&m, 0), a);
    }
}
