//! Operand classification.
//!
//! Source operands are raw tokens. Each shape position expects one
//! [`OperandKind`]; a token that fits becomes a typed [`Operand`].

use crate::binary::{MAX_VALUE, MIN_VALUE};
use crate::cpu::decode::{Mnemonic, OperandKind};
use crate::cpu::memory::VariableTable;
use crate::cpu::registers::RegisterId;
use thiserror::Error;

/// A classified operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(RegisterId),
    Immediate(i32),
    Variable(String),
}

/// True if the token is exactly a register name.
pub fn is_register(token: &str) -> bool {
    RegisterId::from_name(token).is_some()
}

/// True if the token is a decimal integer in the 16-bit range.
pub fn is_immediate(token: &str) -> bool {
    parse_immediate(token).is_some()
}

/// True if the token could name a variable: non-empty and not a number.
pub fn is_variable(token: &str) -> bool {
    !token.is_empty() && !is_numeric(token)
}

fn parse_immediate(token: &str) -> Option<i32> {
    let value = token.parse::<i64>().ok()?;
    if (i64::from(MIN_VALUE)..=i64::from(MAX_VALUE)).contains(&value) {
        Some(value as i32)
    } else {
        None
    }
}

// `inf` and `nan` parse as floats but read as names here.
fn is_numeric(token: &str) -> bool {
    token.parse::<i64>().is_ok()
        || (token.parse::<f64>().is_ok() && token.chars().any(|c| c.is_ascii_digit()))
}

/// Check an operand count against a mnemonic's signature.
pub fn check_count(mnemonic: Mnemonic, got: usize) -> Result<(), OperandError> {
    let expected = mnemonic.shape().signature().len();
    if got < expected {
        return Err(OperandError::TooFew { mnemonic, expected, got });
    }
    if got > expected {
        return Err(OperandError::TooMany { mnemonic, expected, got });
    }
    Ok(())
}

/// Classify the token at `position` as `kind`.
pub fn classify(position: usize, token: &str, kind: OperandKind) -> Result<Operand, OperandError> {
    let operand = match kind {
        OperandKind::Register => RegisterId::from_name(token).map(Operand::Register),
        OperandKind::Immediate => parse_immediate(token).map(Operand::Immediate),
        OperandKind::Variable => is_variable(token).then(|| Operand::Variable(token.to_string())),
    };

    operand.ok_or_else(|| OperandError::WrongKind {
        position,
        value: token.to_string(),
        expected: kind,
    })
}

/// Check count and kinds, then the variable table, in that order.
pub fn classify_all(
    mnemonic: Mnemonic,
    tokens: &[&str],
    vars: &VariableTable,
) -> Result<Vec<Operand>, OperandError> {
    check_count(mnemonic, tokens.len())?;

    let operands = mnemonic
        .shape()
        .signature()
        .iter()
        .zip(tokens)
        .enumerate()
        .map(|(i, (&kind, token))| classify(i, token, kind))
        .collect::<Result<Vec<_>, _>>()?;

    for operand in &operands {
        if let Operand::Variable(name) = operand {
            if !vars.contains(name) {
                return Err(OperandError::UndefinedVariable(name.clone()));
            }
        }
    }

    Ok(operands)
}

/// Why an operand list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("Too few arguments passed into {mnemonic}. Expected {expected} but got {got}")]
    TooFew { mnemonic: Mnemonic, expected: usize, got: usize },

    #[error("Too many arguments passed into {mnemonic}. Expected {expected} but got {got}")]
    TooMany { mnemonic: Mnemonic, expected: usize, got: usize },

    #[error("Argument in position {position} ({value}) is not a valid {expected}")]
    WrongKind { position: usize, value: String, expected: OperandKind },

    #[error("The variable {0} is not defined")]
    UndefinedVariable(String),
}
