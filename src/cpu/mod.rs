//! The simulated machine.
//!
//! - ten registers: `$r1`..`$r8`, the stack register `$sp` and the bit register `$rb`
//! - a variable table standing in for memory
//! - a 47-instruction catalog in six operand shapes, encoded as 30-bit words

pub mod memory;
pub mod registers;
pub mod decode;
pub mod program;
pub mod execute;

pub use memory::{VariableTable, VariableCell};
pub use registers::{Registers, RegisterId, RegisterValue};
pub use decode::{Instruction, Mnemonic, Operands, OperandKind, Shape, DecodeError, encode, decode};
pub use program::{Program, ValidatedInstruction};
pub use execute::{Cpu, CpuError, CpuState, RuntimeError, Snapshot, StepStatus};
