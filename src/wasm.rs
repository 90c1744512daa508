//! WebAssembly bindings for the simulator.
//!
//! This module provides JavaScript-friendly wrappers around the core engine.
//! Views are exported as JSON strings.

use wasm_bindgen::prelude::*;
use crate::asm::{assemble, disassemble_word};
use crate::binary::Word30;
use crate::cpu::{Cpu, StepStatus};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly simulator wrapper.
#[wasm_bindgen]
pub struct WasmSimulator {
    cpu: Cpu,
}

#[wasm_bindgen]
impl WasmSimulator {
    /// Create a new simulator with no program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { cpu: Cpu::new() }
    }

    /// Assemble and load source text. Returns the instruction count.
    ///
    /// On failure the error message holds every `Line N: ...` error.
    #[wasm_bindgen]
    pub fn load_source(&mut self, source: &str) -> Result<usize, JsError> {
        let program = assemble(source)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let len = program.len();
        self.cpu.load(program);
        Ok(len)
    }

    /// Run the whole program. Returns the number of instructions executed.
    #[wasm_bindgen]
    pub fn run(&mut self) -> Result<u64, JsError> {
        self.cpu.run().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Execute one instruction. Returns true while more remain.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<bool, JsError> {
        match self.cpu.step() {
            Ok(StepStatus::Continue { .. }) => Ok(true),
            Ok(StepStatus::Finished) => Ok(false),
            Err(e) => Err(JsError::new(&e.to_string())),
        }
    }

    /// Stop the current step sequence.
    #[wasm_bindgen]
    pub fn stop(&mut self) -> bool {
        self.cpu.stop()
    }

    #[wasm_bindgen]
    pub fn can_run(&self) -> bool {
        self.cpu.can_run()
    }

    #[wasm_bindgen]
    pub fn can_stop(&self) -> bool {
        self.cpu.can_stop()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Get the console trace.
    #[wasm_bindgen]
    pub fn trace(&self) -> String {
        self.cpu.trace().to_string()
    }

    /// Get registers as a JSON array of `{name, value}`.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.regs.snapshot())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Get variables as a JSON array of `{address, name, value}`.
    #[wasm_bindgen]
    pub fn variables_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.vars.snapshot())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Get every view at once as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.snapshot())
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the encoded words as bit strings.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<String>, JsError> {
    let program = assemble(source)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(program.words().iter().map(Word30::to_string).collect())
}

/// Disassemble a single 30-character bit string.
#[wasm_bindgen]
pub fn wasm_disassemble(bits: &str) -> Result<String, JsError> {
    let word = Word30::parse(bits)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(disassemble_word(word, None))
}
