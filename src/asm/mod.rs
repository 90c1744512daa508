//! Assembler and disassembler.
//!
//! This module provides:
//! - operand classification and the per-line validator
//! - a two-pass program assembler (source text → [`Program`](crate::cpu::Program))
//! - a disassembler (30-bit words → readable text)
//! - listing files of encoded words

pub mod operand;
pub mod assembler;
pub mod disasm;
pub mod listing;

pub use operand::{is_register, is_immediate, is_variable, Operand, OperandError};
pub use assembler::{
    assemble, validate_line, declare_variable,
    AsmError, AssemblyErrors, LineError, VariableError,
};
pub use disasm::{disassemble, disassemble_word};
pub use listing::{format_listing, parse_listing, save_listing, load_listing, ListingError};
