//! The simulator's register file.
//!
//! There are ten registers:
//! - `$r1`..`$r8`: plain general-purpose registers
//! - `$sp`: the stack register (writes push, reads pop)
//! - `$rb`: the bit register, which only ever holds 0 or 1

use std::fmt;
use serde::{Serialize, Deserialize};

/// Identifies one of the ten registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterId {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    /// Stack register
    Sp,
    /// Bit register
    Rb,
}

impl RegisterId {
    /// All registers, in display order.
    pub const ALL: [RegisterId; 10] = [
        RegisterId::R1, RegisterId::R2, RegisterId::R3, RegisterId::R4,
        RegisterId::R5, RegisterId::R6, RegisterId::R7, RegisterId::R8,
        RegisterId::Sp, RegisterId::Rb,
    ];

    /// Width of an encoded register id.
    pub const BITS: usize = 4;

    /// Textual name as written in source.
    pub const fn name(self) -> &'static str {
        match self {
            RegisterId::R1 => "$r1",
            RegisterId::R2 => "$r2",
            RegisterId::R3 => "$r3",
            RegisterId::R4 => "$r4",
            RegisterId::R5 => "$r5",
            RegisterId::R6 => "$r6",
            RegisterId::R7 => "$r7",
            RegisterId::R8 => "$r8",
            RegisterId::Sp => "$sp",
            RegisterId::Rb => "$rb",
        }
    }

    /// 4-bit binary id used in instruction encoding.
    pub const fn code(self) -> u32 {
        match self {
            RegisterId::R1 => 0b0001,
            RegisterId::R2 => 0b0010,
            RegisterId::R3 => 0b0011,
            RegisterId::R4 => 0b0100,
            RegisterId::R5 => 0b0101,
            RegisterId::R6 => 0b0110,
            RegisterId::R7 => 0b0111,
            RegisterId::R8 => 0b1000,
            RegisterId::Sp => 0b1001,
            RegisterId::Rb => 0b1010,
        }
    }

    /// Look up a register by its exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Look up a register by its 4-bit id.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.code() == code)
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single register and its value semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Register {
    Plain { value: i32 },
    /// Any nonzero write stores 1.
    Bit { value: i32 },
    /// Writes push, reads pop; an empty stack reads as 0.
    Stack { stack: Vec<i32> },
}

impl Register {
    /// The register in its initial state for the given id.
    pub fn initial(id: RegisterId) -> Self {
        match id {
            RegisterId::Sp => Register::Stack { stack: Vec::new() },
            RegisterId::Rb => Register::Bit { value: 0 },
            _ => Register::Plain { value: 0 },
        }
    }

    /// Read the register. Reading the stack register pops it.
    pub fn read(&mut self) -> i32 {
        match self {
            Register::Plain { value } | Register::Bit { value } => *value,
            Register::Stack { stack } => stack.pop().unwrap_or(0),
        }
    }

    /// Write the register. Writing the stack register pushes.
    pub fn write(&mut self, new_value: i32) {
        match self {
            Register::Plain { value } => *value = new_value,
            Register::Bit { value } => *value = i32::from(new_value != 0),
            Register::Stack { stack } => stack.push(new_value),
        }
    }

    /// The value shown to the user, without side effects.
    ///
    /// For the stack register this is the top of the stack (0 when empty).
    pub fn peek(&self) -> i32 {
        match self {
            Register::Plain { value } | Register::Bit { value } => *value,
            Register::Stack { stack } => stack.last().copied().unwrap_or(0),
        }
    }

    /// Restore the initial value: 0, or an empty stack.
    pub fn reset(&mut self) {
        match self {
            Register::Plain { value } | Register::Bit { value } => *value = 0,
            Register::Stack { stack } => stack.clear(),
        }
    }
}

/// A register's name and displayed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    pub name: String,
    pub value: i32,
}

/// The register file: one register per [`RegisterId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    regs: [Register; 10],
}

impl Registers {
    /// Create a register file with every register in its initial state.
    pub fn new() -> Self {
        Self {
            regs: RegisterId::ALL.map(Register::initial),
        }
    }

    /// Reset every register.
    pub fn reset(&mut self) {
        for reg in &mut self.regs {
            reg.reset();
        }
    }

    /// Read a register, with that register's side effects.
    #[inline]
    pub fn read(&mut self, id: RegisterId) -> i32 {
        self.regs[id.index()].read()
    }

    /// Write a register, with that register's coercion or push.
    #[inline]
    pub fn write(&mut self, id: RegisterId, value: i32) {
        self.regs[id.index()].write(value);
    }

    /// Reset a single register.
    #[inline]
    pub fn reset_one(&mut self, id: RegisterId) {
        self.regs[id.index()].reset();
    }

    /// Displayed value of a register.
    #[inline]
    pub fn peek(&self, id: RegisterId) -> i32 {
        self.regs[id.index()].peek()
    }

    /// Borrow a register.
    pub fn get(&self, id: RegisterId) -> &Register {
        &self.regs[id.index()]
    }

    /// Number of values on the stack register.
    pub fn stack_depth(&self) -> usize {
        match &self.regs[RegisterId::Sp.index()] {
            Register::Stack { stack } => stack.len(),
            _ => 0,
        }
    }

    /// Name/value pairs for every register, in display order.
    pub fn snapshot(&self) -> Vec<RegisterValue> {
        RegisterId::ALL
            .iter()
            .map(|&id| RegisterValue {
                name: id.name().to_string(),
                value: self.peek(id),
            })
            .collect()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup() {
        assert_eq!(RegisterId::from_name("$r1"), Some(RegisterId::R1));
        assert_eq!(RegisterId::from_name("$sp"), Some(RegisterId::Sp));
        assert_eq!(RegisterId::from_name("$rb"), Some(RegisterId::Rb));
        assert_eq!(RegisterId::from_name("$r9"), None);
        assert_eq!(RegisterId::from_name(" $r1"), None);
        assert_eq!(RegisterId::from_name("r1"), None);
    }

    #[test]
    fn test_register_codes_unique() {
        for (i, a) in RegisterId::ALL.iter().enumerate() {
            assert_eq!(RegisterId::from_code(a.code()), Some(*a));
            for b in &RegisterId::ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
        assert_eq!(RegisterId::Rb.code(), 0b1010);
        assert_eq!(RegisterId::from_code(0), None);
    }

    #[test]
    fn test_bit_register_coercion() {
        let mut regs = Registers::new();

        regs.write(RegisterId::Rb, 5);
        assert_eq!(regs.peek(RegisterId::Rb), 1);

        regs.write(RegisterId::Rb, 0);
        assert_eq!(regs.peek(RegisterId::Rb), 0);

        regs.write(RegisterId::Rb, -3);
        assert_eq!(regs.peek(RegisterId::Rb), 1);
    }

    #[test]
    fn test_stack_register_lifo() {
        let mut regs = Registers::new();
        for v in [1, 2, 3] {
            regs.write(RegisterId::Sp, v);
        }

        assert_eq!(regs.stack_depth(), 3);
        assert_eq!(regs.peek(RegisterId::Sp), 3);
        assert_eq!(regs.read(RegisterId::Sp), 3);
        assert_eq!(regs.read(RegisterId::Sp), 2);
        assert_eq!(regs.read(RegisterId::Sp), 1);
    }

    #[test]
    fn test_empty_stack_reads_zero() {
        let mut regs = Registers::new();
        assert_eq!(regs.read(RegisterId::Sp), 0);
        assert_eq!(regs.read(RegisterId::Sp), 0);
        assert_eq!(regs.stack_depth(), 0);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.write(RegisterId::R3, 42);
        regs.write(RegisterId::Sp, 7);
        regs.write(RegisterId::Rb, 1);

        regs.reset();

        assert_eq!(regs, Registers::new());
        assert_eq!(regs.stack_depth(), 0);
    }

    #[test]
    fn test_snapshot_order() {
        let mut regs = Registers::new();
        regs.write(RegisterId::R2, -9);

        let snapshot = regs.snapshot();
        let names: Vec<_> = snapshot.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["$r1", "$r2", "$r3", "$r4", "$r5", "$r6", "$r7", "$r8", "$sp", "$rb"]);
        assert_eq!(snapshot[1].value, -9);
    }
}
