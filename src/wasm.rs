//! WebAssembly bindings for the 4-bit machine.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use js_sys::Array;
use wasm_bindgen::prelude::*;
use crate::{Machine, Instruction};
use crate::asm::{assemble, parse_triple};
use crate::asm::disasm::format_instruction;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    program: Vec<Instruction>,
}

#[wasm_bindgen]
impl WasmMachine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(),
            program: Vec::new(),
        }
    }

    /// Reset and load a program from assembly source. Returns the word count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let instructions = assemble(source)
            .map_err(|e| JsError::new(&e.to_string()))?;

        self.machine.reset();
        let len = self.machine.load(&instructions)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.program = instructions;
        Ok(len)
    }

    /// Run one cycle from the program store. Returns the executed instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let cycle = self.machine.step();
        match cycle.fault {
            Some(e) => Err(JsError::new(&e.to_string())),
            None => Ok(format_instruction(&cycle.instruction)),
        }
    }

    /// Execute an operator-entered triple such as `"011 0001 0101"` directly.
    #[wasm_bindgen]
    pub fn exec(&mut self, triple: &str) -> Result<bool, JsError> {
        let instr = parse_triple(triple)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let cycle = self.machine.step_direct(instr);
        match cycle.fault {
            Some(e) => Err(JsError::new(&e.to_string())),
            None => Ok(cycle.jumped),
        }
    }

    /// Run `cycles` cycles without pacing. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, cycles: u32) -> u64 {
        for _ in 0..cycles {
            self.machine.step();
        }
        self.machine.cycles()
    }

    /// Reset the machine and reload the last program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine.reset();
        if !self.program.is_empty() {
            let _ = self.machine.load(&self.program);
        }
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.machine.cycles()
    }

    /// Clock (program counter) value.
    #[wasm_bindgen]
    pub fn clock(&self) -> u8 {
        self.machine.clock().value().to_u8()
    }

    /// Register value. Address 15 and above is an error.
    #[wasm_bindgen]
    pub fn register(&self, addr: u8) -> Result<u8, JsError> {
        self.machine.registers().read(addr)
            .map(|v| v.to_u8())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// All registers as an array of bit strings.
    #[wasm_bindgen]
    pub fn registers_bits(&self) -> Array {
        self.machine.registers().values()
            .iter()
            .map(|v| JsValue::from_str(&v.to_string()))
            .collect()
    }

    /// All program words as an array of bit strings.
    #[wasm_bindgen]
    pub fn program_bits(&self) -> Array {
        self.machine.program().words()
            .iter()
            .map(|w| JsValue::from_str(&w.to_string()))
            .collect()
    }

    /// Full machine snapshot as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine.snapshot())
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return instruction count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let instructions = assemble(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(instructions.len())
}

/// Disassemble a single 11-bit value.
#[wasm_bindgen]
pub fn wasm_disassemble(value: u32) -> Result<String, JsError> {
    let word = crate::InstructionWord::from_u32(value)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(crate::asm::disasm::disassemble_instruction(word))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn register_reports_bad_address() {
        let mut wm = WasmMachine::new();
        assert!(wm.exec("011 0001 0101").is_ok());
        assert_eq!(wm.register(1).ok(), Some(5));
        assert_eq!(wm.register(0).ok(), Some(0));
        assert!(wm.register(15).is_err());
    }

    #[wasm_bindgen_test]
    fn bit_arrays_cover_machine() {
        let wm = WasmMachine::new();
        assert_eq!(wm.registers_bits().length(), 15);
        assert_eq!(wm.program_bits().length(), 16);
        assert_eq!(wm.registers_bits().get(0).as_string().as_deref(), Some("0000"));
    }
}
