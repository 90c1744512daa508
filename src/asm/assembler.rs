//! Line validator and program assembler.
//!
//! Syntax:
//! ```text
//! lw $r1, x           ; mnemonic, then comma-separated operands
//! inc $r1
//! sw $r1, x
//!
//! variables:          ; every later line declares a variable
//! x: 5
//! ```

use crate::asm::operand::{classify_all, Operand, OperandError};
use crate::binary::{MAX_VALUE, MIN_VALUE};
use crate::cpu::decode::{Instruction, Operands, Shape};
use crate::cpu::memory::VariableTable;
use crate::cpu::program::{Program, ValidatedInstruction};
use thiserror::Error;

/// Marks the start of the variable declarations.
pub const VARIABLES_HEADER: &str = "variables:";

/// Validate one instruction line against a variable table.
///
/// The mnemonic is everything before the first whitespace; the remainder
/// is split on commas. The canonical text keeps the tokens as written.
pub fn validate_line(line: &str, vars: &VariableTable) -> Result<ValidatedInstruction, AsmError> {
    let line = line.trim();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let tokens: Vec<&str> = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    let mnemonic = Shape::search(name)
        .ok_or_else(|| AsmError::UnknownInstruction(name.to_string()))?;

    let operands = classify_all(mnemonic, &tokens, vars)?;
    let instruction = Instruction::new(mnemonic, build_operands(mnemonic.shape(), operands, vars)?);
    let text = format!("{}({})", name, tokens.join(", "));

    Ok(ValidatedInstruction::new(instruction, text))
}

fn build_operands(shape: Shape, operands: Vec<Operand>, vars: &VariableTable) -> Result<Operands, OperandError> {
    use Operand::{Immediate as I, Register as R, Variable as V};

    let operands = match (shape, operands.as_slice()) {
        (Shape::ThreeReg, &[R(dest), R(first), R(second)]) => Operands::ThreeReg { dest, first, second },
        (Shape::TwoReg, &[R(first), R(second)]) => Operands::TwoReg { first, second },
        (Shape::TwoRegOneI, &[R(dest), R(src), I(imm)]) => Operands::TwoRegOneI { dest, src, imm },
        (Shape::OneReg, &[R(reg)]) => Operands::OneReg { reg },
        (Shape::OneRegOneI, &[R(dest), I(imm)]) => Operands::OneRegOneI { dest, imm },
        (Shape::Memory, [R(reg), V(name)]) => {
            let address = vars
                .address_of(name)
                .ok_or_else(|| OperandError::UndefinedVariable(name.clone()))?;
            Operands::Memory { reg: *reg, name: Some(name.clone()), address }
        }
        (shape, ops) => unreachable!("classified operands {:?} do not fit {:?}", ops, shape),
    };

    Ok(operands)
}

/// Parse one `name: value` declaration into the table.
pub fn declare_variable(line: &str, vars: &mut VariableTable) -> Result<(), VariableError> {
    let (name, value) = match line.split_once(':') {
        Some((name, value)) if !value.contains(':') && !value.trim().is_empty() => {
            (name.trim(), value.trim())
        }
        _ => return Err(VariableError::InvalidDeclaration),
    };

    if name.is_empty() || starts_with_integer(name) {
        return Err(VariableError::NumericName(name.to_string()));
    }

    if vars.contains(name) {
        return Err(VariableError::AlreadyDefined(name.to_string()));
    }

    let number = parse_value(value)?;

    if vars.is_full() {
        return Err(VariableError::OutOfMemory(name.to_string()));
    }

    vars.declare(name, number);
    Ok(())
}

/// Parse a declared value, keeping well-formed integers of any length apart
/// from text that is not a number at all.
fn parse_value(text: &str) -> Result<i32, VariableError> {
    let digits = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VariableError::NotANumber(text.to_string()));
    }

    let negative = text.starts_with('-');
    let out_of_range = || {
        if negative {
            VariableError::TooSmall(text.to_string())
        } else {
            VariableError::TooLarge(text.to_string())
        }
    };

    let value: i64 = text.parse().map_err(|_| out_of_range())?;
    if (i64::from(MIN_VALUE)..=i64::from(MAX_VALUE)).contains(&value) {
        Ok(value as i32)
    } else {
        Err(out_of_range())
    }
}

fn starts_with_integer(name: &str) -> bool {
    let unsigned = name.strip_prefix(|c| c == '+' || c == '-').unwrap_or(name);
    unsigned.starts_with(|c: char| c.is_ascii_digit())
}

/// Assemble a whole source text.
///
/// Declarations are collected first, so instructions may use variables
/// declared further down. Every error is reported, sorted by line.
pub fn assemble(source: &str) -> Result<Program, AssemblyErrors> {
    let lines: Vec<(usize, &str)> = source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let (code, declarations) = match lines.iter().position(|(_, l)| l.starts_with(VARIABLES_HEADER)) {
        Some(header) => (&lines[..header], &lines[header + 1..]),
        None => (&lines[..], &[][..]),
    };

    let mut errors = Vec::new();

    // Pass 1: variables
    let mut variables = VariableTable::new();
    for &(line, text) in declarations {
        if text.starts_with(VARIABLES_HEADER) {
            continue;
        }
        if let Err(e) = declare_variable(text, &mut variables) {
            errors.push(LineError { line, error: e.into() });
        }
    }

    // Pass 2: instructions
    let mut instructions = Vec::with_capacity(code.len());
    for &(line, text) in code {
        match validate_line(text, &variables) {
            Ok(instr) => instructions.push(instr),
            Err(error) => errors.push(LineError { line, error }),
        }
    }

    if !errors.is_empty() {
        errors.sort_by_key(|e| e.line);
        log::debug!("assembly rejected with {} errors", errors.len());
        return Err(AssemblyErrors(errors));
    }

    log::debug!(
        "assembled {} instructions and {} variables",
        instructions.len(),
        variables.len()
    );
    Ok(Program { instructions, variables })
}

/// Why a single line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    #[error("Failed to find instruction '{0}'")]
    UnknownInstruction(String),

    #[error("Validation error: {0}")]
    Operand(#[from] OperandError),

    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// Errors in a variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("Invalid variable declaration. Syntax - var: val")]
    InvalidDeclaration,

    #[error("Invalid variable name {0}. Variable name cannot be a number")]
    NumericName(String),

    #[error("The variable {0} has already been defined")]
    AlreadyDefined(String),

    #[error("The value '{0}' is not a number")]
    NotANumber(String),

    #[error("The value, {0}, is too large. 32767 is the max")]
    TooLarge(String),

    #[error("The value, {0}, is too small. -32768 is the min")]
    TooSmall(String),

    #[error("Cannot declare {0}. Memory is full, 4090 variables is the max")]
    OutOfMemory(String),
}

/// An error tagged with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line}: {error}")]
pub struct LineError {
    pub line: usize,
    pub error: AsmError,
}

/// Every error found while assembling, in line order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_lines(.0))]
pub struct AssemblyErrors(pub Vec<LineError>);

impl AssemblyErrors {
    pub fn iter(&self) -> impl Iterator<Item = &LineError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn join_lines(errors: &[LineError]) -> String {
    errors
        .iter()
        .map(LineError::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
