//! # asm-sim
//!
//! A teaching simulator for a small register-machine assembly language.
//!
//! Source lines are validated against a fixed catalog of 47 instructions,
//! each encoded as a 30-bit word. Programs run all at once or one step at a
//! time against ten 16-bit registers and a table of named variables, with
//! every executed instruction written to a trace.

pub mod binary;
pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use binary::{Word30, to_binary16, from_binary16};
pub use cpu::{Cpu, CpuState, CpuError, Registers, RegisterId, VariableTable, Program, Instruction, Mnemonic};
pub use asm::{assemble, validate_line, disassemble, AssemblyErrors, save_listing, load_listing};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
