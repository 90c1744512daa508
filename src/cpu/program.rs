//! Validated programs, ready to execute.

use crate::binary::Word30;
use crate::cpu::decode::{encode, Instruction};
use crate::cpu::memory::VariableTable;
use serde::{Serialize, Deserialize};

/// One accepted source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedInstruction {
    instruction: Instruction,
    encoding: Word30,
    text: String,
}

impl ValidatedInstruction {
    /// Wrap an instruction with its canonical `mnemonic(args)` text.
    pub fn new(instruction: Instruction, text: String) -> Self {
        let encoding = encode(&instruction);
        Self { instruction, encoding, text }
    }

    #[inline]
    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    /// The 30-bit encoding.
    #[inline]
    pub fn encoding(&self) -> Word30 {
        self.encoding
    }

    /// Canonical display text, e.g. `add($r1, $r2, $r3)`.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The line written to the trace when this instruction executes.
    pub fn trace_line(&self) -> String {
        format!("{} - {}\n", self.text, self.encoding)
    }
}

/// An assembled program: instructions plus the declared variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<ValidatedInstruction>,
    pub variables: VariableTable,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if there are no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Encoded words, in program order.
    pub fn words(&self) -> Vec<Word30> {
        self.instructions.iter().map(|i| i.encoding()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{Mnemonic, Operands};
    use crate::cpu::registers::RegisterId;

    #[test]
    fn test_trace_line() {
        let instr = Instruction::new(Mnemonic::Inc, Operands::OneReg { reg: RegisterId::R1 });
        let validated = ValidatedInstruction::new(instr, "inc($r1)".into());

        assert_eq!(validated.trace_line(), "inc($r1) - 100110000100000000000000000000\n");
    }

    #[test]
    fn test_program_words() {
        let mut program = Program::new();
        assert!(program.is_empty());

        let instr = Instruction::new(Mnemonic::Li, Operands::OneRegOneI { dest: RegisterId::R2, imm: 3 });
        program.instructions.push(ValidatedInstruction::new(instr.clone(), "li($r2, 3)".into()));

        assert_eq!(program.len(), 1);
        assert_eq!(program.words(), vec![encode(&instr)]);
    }
}
