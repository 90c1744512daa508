//! Disassembler.
//!
//! Converts 30-bit words back to canonical `mnemonic(args)` text.

use crate::binary::Word30;
use crate::cpu::decode::{decode, Instruction, Operands};
use crate::cpu::memory::VariableTable;

/// Disassemble a single word.
///
/// Memory operands are shown by address unless `vars` names them.
pub fn disassemble_word(word: Word30, vars: Option<&VariableTable>) -> String {
    match decode(word) {
        Ok(instr) => name_memory_operand(instr, vars).to_string(),
        Err(e) => format!("??? ; {}", e),
    }
}

/// Disassemble a slice of words into a numbered listing.
pub fn disassemble(words: &[Word30]) -> String {
    let mut output = String::new();
    output.push_str("; Disassembly\n");
    output.push_str("; -----------\n\n");

    for (index, word) in words.iter().enumerate() {
        let line = disassemble_word(*word, None);
        output.push_str(&format!("{:03}: {:<24} ; {}\n", index, line, word));
    }

    output
}

fn name_memory_operand(instr: Instruction, vars: Option<&VariableTable>) -> Instruction {
    let named = match (vars, instr.operands()) {
        (Some(vars), &Operands::Memory { reg, name: None, address }) => vars
            .name_at(address)
            .map(|name| Operands::Memory { reg, name: Some(name.to_string()), address }),
        _ => None,
    };

    match named {
        Some(operands) => Instruction::new(instr.mnemonic(), operands),
        None => instr,
    }
}
