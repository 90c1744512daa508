//! Instruction catalog, encoder and decoder.
//!
//! Every mnemonic belongs to exactly one [`Shape`], the fixed list of operand
//! kinds it accepts. An encoded instruction is a 6-bit opcode followed by
//! one field per operand (4-bit register ids, 16-bit immediates or variable
//! addresses), right-padded with zeros to 30 bits.

use std::fmt;
use crate::binary::{Field, Word30, IMMEDIATE_BITS};
use crate::cpu::registers::RegisterId;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Width of the opcode field.
pub const OPCODE_BITS: usize = 6;

/// The kind of value an operand position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperandKind {
    Register,
    Immediate,
    Variable,
}

impl OperandKind {
    /// Encoded width of this operand.
    pub const fn bits(self) -> usize {
        match self {
            OperandKind::Register => RegisterId::BITS,
            OperandKind::Immediate | OperandKind::Variable => IMMEDIATE_BITS,
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperandKind::Register => "register",
            OperandKind::Immediate => "immediate",
            OperandKind::Variable => "variable",
        })
    }
}

/// Operand signature shared by a group of mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    ThreeReg,
    TwoReg,
    TwoRegOneI,
    OneReg,
    OneRegOneI,
    Memory,
}

impl Shape {
    /// Order in which shapes are searched for a mnemonic; first match wins.
    pub const SEARCH_ORDER: [Shape; 6] = [
        Shape::ThreeReg,
        Shape::Memory,
        Shape::OneReg,
        Shape::TwoRegOneI,
        Shape::TwoReg,
        Shape::OneRegOneI,
    ];

    /// Operand kinds, in source order.
    pub const fn signature(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            Shape::ThreeReg => &[Register, Register, Register],
            Shape::TwoReg => &[Register, Register],
            Shape::TwoRegOneI => &[Register, Register, Immediate],
            Shape::OneReg => &[Register],
            Shape::OneRegOneI => &[Register, Immediate],
            Shape::Memory => &[Register, Variable],
        }
    }

    /// Mnemonics owned by this shape.
    pub const fn mnemonics(self) -> &'static [Mnemonic] {
        use Mnemonic::*;
        match self {
            Shape::ThreeReg => &[Add, Sub, Addo, Subo, Mulo, And, Or, Xor, Div, Diff, Expo, Mul],
            Shape::TwoReg => &[
                Abs, Neg, Sqrt, Cp, Eq, Gt, Gte, Lt, Lte, Neq,
                Adds, Subs, Muls, Addso, Subso, Mulso,
            ],
            Shape::TwoRegOneI => &[Addi, Subi, Muli, Divi, Expoi, Lshift, Rshift],
            Shape::OneReg => &[Push, Pop, Inc, Dec, Zero, Addfs, Subfs, Mulfs, Divs],
            Shape::OneRegOneI => &[Li],
            Shape::Memory => &[Lw, Sw],
        }
    }

    /// Find a mnemonic of this shape by name.
    pub fn find(self, name: &str) -> Option<Mnemonic> {
        self.mnemonics().iter().copied().find(|m| m.name() == name)
    }

    /// Search every shape in [`Shape::SEARCH_ORDER`].
    pub fn search(name: &str) -> Option<Mnemonic> {
        Self::SEARCH_ORDER.iter().find_map(|shape| shape.find(name))
    }
}

/// Every instruction the simulator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mnemonic {
    // ==================== ThreeReg ====================
    Add,
    Sub,
    Addo,
    Subo,
    Mulo,
    And,
    Or,
    Xor,
    Div,
    Diff,
    Expo,
    Mul,

    // ==================== TwoReg ====================
    Abs,
    Neg,
    Sqrt,
    Cp,
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Neq,
    Adds,
    Subs,
    Muls,
    Addso,
    Subso,
    Mulso,

    // ==================== TwoRegOneI ====================
    Addi,
    Subi,
    Muli,
    Divi,
    Expoi,
    Lshift,
    Rshift,

    // ==================== OneReg ====================
    Push,
    Pop,
    Inc,
    Dec,
    Zero,
    Addfs,
    Subfs,
    Mulfs,
    Divs,

    // ==================== OneRegOneI ====================
    Li,

    // ==================== Memory ====================
    Lw,
    Sw,
}

impl Mnemonic {
    /// All mnemonics, in opcode order.
    pub const ALL: [Mnemonic; 47] = {
        use Mnemonic::*;
        [
            Add, Sub, Addo, Subo, Mulo, And, Or, Xor, Div, Diff, Expo, Mul,
            Abs, Neg, Sqrt, Cp, Eq, Gt, Gte, Lt, Lte, Neq,
            Adds, Subs, Muls, Addso, Subso, Mulso,
            Addi, Subi, Muli, Divi, Expoi, Lshift, Rshift,
            Push, Pop, Inc, Dec, Zero, Addfs, Subfs, Mulfs, Divs,
            Li,
            Lw, Sw,
        ]
    };

    /// Name as written in source.
    pub const fn name(self) -> &'static str {
        match self {
            Mnemonic::Add => "add",
            Mnemonic::Sub => "sub",
            Mnemonic::Addo => "addo",
            Mnemonic::Subo => "subo",
            Mnemonic::Mulo => "mulo",
            Mnemonic::And => "and",
            Mnemonic::Or => "or",
            Mnemonic::Xor => "xor",
            Mnemonic::Div => "div",
            Mnemonic::Diff => "diff",
            Mnemonic::Expo => "expo",
            Mnemonic::Mul => "mul",
            Mnemonic::Abs => "abs",
            Mnemonic::Neg => "neg",
            Mnemonic::Sqrt => "sqrt",
            Mnemonic::Cp => "cp",
            Mnemonic::Eq => "eq",
            Mnemonic::Gt => "gt",
            Mnemonic::Gte => "gte",
            Mnemonic::Lt => "lt",
            Mnemonic::Lte => "lte",
            Mnemonic::Neq => "neq",
            Mnemonic::Adds => "adds",
            Mnemonic::Subs => "subs",
            Mnemonic::Muls => "muls",
            Mnemonic::Addso => "addso",
            Mnemonic::Subso => "subso",
            Mnemonic::Mulso => "mulso",
            Mnemonic::Addi => "addi",
            Mnemonic::Subi => "subi",
            Mnemonic::Muli => "muli",
            Mnemonic::Divi => "divi",
            Mnemonic::Expoi => "expoi",
            Mnemonic::Lshift => "lshift",
            Mnemonic::Rshift => "rshift",
            Mnemonic::Push => "push",
            Mnemonic::Pop => "pop",
            Mnemonic::Inc => "inc",
            Mnemonic::Dec => "dec",
            Mnemonic::Zero => "zero",
            Mnemonic::Addfs => "addfs",
            Mnemonic::Subfs => "subfs",
            Mnemonic::Mulfs => "mulfs",
            Mnemonic::Divs => "divs",
            Mnemonic::Li => "li",
            Mnemonic::Lw => "lw",
            Mnemonic::Sw => "sw",
        }
    }

    /// 6-bit opcode.
    pub const fn opcode(self) -> u32 {
        match self {
            Mnemonic::Add => 1,
            Mnemonic::Sub => 2,
            Mnemonic::Addo => 3,
            Mnemonic::Subo => 4,
            Mnemonic::Mulo => 5,
            Mnemonic::And => 6,
            Mnemonic::Or => 7,
            Mnemonic::Xor => 8,
            Mnemonic::Div => 9,
            Mnemonic::Diff => 10,
            Mnemonic::Expo => 11,
            Mnemonic::Mul => 12,
            Mnemonic::Abs => 13,
            Mnemonic::Neg => 14,
            Mnemonic::Sqrt => 15,
            Mnemonic::Cp => 16,
            Mnemonic::Eq => 17,
            Mnemonic::Gt => 18,
            Mnemonic::Gte => 19,
            Mnemonic::Lt => 20,
            Mnemonic::Lte => 21,
            Mnemonic::Neq => 22,
            Mnemonic::Adds => 23,
            Mnemonic::Subs => 24,
            Mnemonic::Muls => 25,
            Mnemonic::Addso => 26,
            Mnemonic::Subso => 27,
            Mnemonic::Mulso => 28,
            Mnemonic::Addi => 29,
            Mnemonic::Subi => 30,
            Mnemonic::Muli => 31,
            Mnemonic::Divi => 32,
            Mnemonic::Expoi => 33,
            Mnemonic::Lshift => 34,
            Mnemonic::Rshift => 35,
            Mnemonic::Push => 36,
            Mnemonic::Pop => 37,
            Mnemonic::Inc => 38,
            Mnemonic::Dec => 39,
            Mnemonic::Zero => 40,
            Mnemonic::Addfs => 41,
            Mnemonic::Subfs => 42,
            Mnemonic::Mulfs => 43,
            Mnemonic::Divs => 44,
            Mnemonic::Li => 45,
            Mnemonic::Lw => 46,
            Mnemonic::Sw => 47,
        }
    }

    /// The shape that owns this mnemonic.
    pub const fn shape(self) -> Shape {
        use Mnemonic::*;
        match self {
            Add | Sub | Addo | Subo | Mulo | And | Or | Xor | Div | Diff | Expo | Mul => Shape::ThreeReg,
            Abs | Neg | Sqrt | Cp | Eq | Gt | Gte | Lt | Lte | Neq
            | Adds | Subs | Muls | Addso | Subso | Mulso => Shape::TwoReg,
            Addi | Subi | Muli | Divi | Expoi | Lshift | Rshift => Shape::TwoRegOneI,
            Push | Pop | Inc | Dec | Zero | Addfs | Subfs | Mulfs | Divs => Shape::OneReg,
            Li => Shape::OneRegOneI,
            Lw | Sw => Shape::Memory,
        }
    }

    /// One-line summary for instruction reference listings.
    pub const fn summary(self) -> &'static str {
        match self {
            Mnemonic::Add => "d = a + b",
            Mnemonic::Sub => "d = a - b",
            Mnemonic::Addo => "d = a + b, wrapping on overflow",
            Mnemonic::Subo => "d = a - b, wrapping on overflow",
            Mnemonic::Mulo => "d = a * b, wrapping on overflow",
            Mnemonic::And => "d = a & b",
            Mnemonic::Or => "d = a | b, 0 if out of range",
            Mnemonic::Xor => "d = a ^ b, 0 if out of range",
            Mnemonic::Div => "d = floor(a / b)",
            Mnemonic::Diff => "d = ||a| - |b||",
            Mnemonic::Expo => "d = a ^ b (power)",
            Mnemonic::Mul => "d = a * b",
            Mnemonic::Abs => "d = |a|",
            Mnemonic::Neg => "d = -a",
            Mnemonic::Sqrt => "d = floor(sqrt(a))",
            Mnemonic::Cp => "d = a",
            Mnemonic::Eq => "$rb = a == b",
            Mnemonic::Gt => "$rb = a > b",
            Mnemonic::Gte => "$rb = a >= b",
            Mnemonic::Lt => "$rb = a < b",
            Mnemonic::Lte => "$rb = a <= b",
            Mnemonic::Neq => "$rb = a != b",
            Mnemonic::Adds => "push a + b",
            Mnemonic::Subs => "push a - b",
            Mnemonic::Muls => "push a * b",
            Mnemonic::Addso => "push a + b, wrapping on overflow",
            Mnemonic::Subso => "push a - b, wrapping on overflow",
            Mnemonic::Mulso => "push a * b, wrapping on overflow",
            Mnemonic::Addi => "d = a + imm",
            Mnemonic::Subi => "d = a - imm",
            Mnemonic::Muli => "d = a * imm",
            Mnemonic::Divi => "d = floor(a / imm)",
            Mnemonic::Expoi => "d = a ^ imm (power)",
            Mnemonic::Lshift => "d = a << imm, 0 if out of range",
            Mnemonic::Rshift => "d = a >> imm (arithmetic)",
            Mnemonic::Push => "push r",
            Mnemonic::Pop => "r = pop",
            Mnemonic::Inc => "r = r + 1",
            Mnemonic::Dec => "r = r - 1",
            Mnemonic::Zero => "reset r",
            Mnemonic::Addfs => "r = pop + pop",
            Mnemonic::Subfs => "r = pop - pop",
            Mnemonic::Mulfs => "r = pop * pop",
            Mnemonic::Divs => "r = floor(pop / pop)",
            Mnemonic::Li => "r = imm",
            Mnemonic::Lw => "r = variable",
            Mnemonic::Sw => "variable = r",
        }
    }

    /// Look up a mnemonic by opcode.
    pub fn from_opcode(opcode: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.opcode() == opcode)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed operands, one variant per [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operands {
    ThreeReg { dest: RegisterId, first: RegisterId, second: RegisterId },
    TwoReg { first: RegisterId, second: RegisterId },
    TwoRegOneI { dest: RegisterId, src: RegisterId, imm: i32 },
    OneReg { reg: RegisterId },
    OneRegOneI { dest: RegisterId, imm: i32 },
    /// `name` is `None` when decoded from a word, which only carries the address.
    Memory { reg: RegisterId, name: Option<String>, address: u16 },
}

impl Operands {
    /// Shape these operands satisfy.
    pub fn shape(&self) -> Shape {
        match self {
            Operands::ThreeReg { .. } => Shape::ThreeReg,
            Operands::TwoReg { .. } => Shape::TwoReg,
            Operands::TwoRegOneI { .. } => Shape::TwoRegOneI,
            Operands::OneReg { .. } => Shape::OneReg,
            Operands::OneRegOneI { .. } => Shape::OneRegOneI,
            Operands::Memory { .. } => Shape::Memory,
        }
    }

    fn fields(&self) -> Vec<Field> {
        let reg = |id: &RegisterId| Field::new(id.code(), RegisterId::BITS);
        match self {
            Operands::ThreeReg { dest, first, second } => vec![reg(dest), reg(first), reg(second)],
            Operands::TwoReg { first, second } => vec![reg(first), reg(second)],
            Operands::TwoRegOneI { dest, src, imm } => vec![reg(dest), reg(src), Field::immediate(*imm)],
            Operands::OneReg { reg: r } => vec![reg(r)],
            Operands::OneRegOneI { dest, imm } => vec![reg(dest), Field::immediate(*imm)],
            Operands::Memory { reg: r, address, .. } => {
                vec![reg(r), Field::new(u32::from(*address), IMMEDIATE_BITS)]
            }
        }
    }
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operands::ThreeReg { dest, first, second } => write!(f, "{}, {}, {}", dest, first, second),
            Operands::TwoReg { first, second } => write!(f, "{}, {}", first, second),
            Operands::TwoRegOneI { dest, src, imm } => write!(f, "{}, {}, {}", dest, src, imm),
            Operands::OneReg { reg } => write!(f, "{}", reg),
            Operands::OneRegOneI { dest, imm } => write!(f, "{}, {}", dest, imm),
            Operands::Memory { reg, name: Some(name), .. } => write!(f, "{}, {}", reg, name),
            Operands::Memory { reg, name: None, address } => write!(f, "{}, @{:#06x}", reg, address),
        }
    }
}

/// A mnemonic with operands of its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    mnemonic: Mnemonic,
    operands: Operands,
}

impl Instruction {
    /// Pair a mnemonic with its operands.
    ///
    /// # Panics
    /// Panics if the operands are not of the mnemonic's shape.
    pub fn new(mnemonic: Mnemonic, operands: Operands) -> Self {
        assert_eq!(
            mnemonic.shape(), operands.shape(),
            "operands for {} do not match its shape", mnemonic
        );
        Self { mnemonic, operands }
    }

    #[inline]
    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    #[inline]
    pub fn operands(&self) -> &Operands {
        &self.operands
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.mnemonic, self.operands)
    }
}

/// Encode an instruction as a 30-bit word.
pub fn encode(instr: &Instruction) -> Word30 {
    let mut fields = vec![Field::new(instr.mnemonic.opcode(), OPCODE_BITS)];
    fields.extend(instr.operands.fields());
    Word30::assemble(&fields)
}

/// Decode a 30-bit word.
pub fn decode(word: Word30) -> Result<Instruction, DecodeError> {
    let opcode = word.field(0, OPCODE_BITS);
    let mnemonic = Mnemonic::from_opcode(opcode)
        .ok_or(DecodeError::InvalidOpcode(opcode))?;

    let mut offset = OPCODE_BITS;
    let mut reg = || -> Result<RegisterId, DecodeError> {
        let code = word.field(offset, RegisterId::BITS);
        offset += RegisterId::BITS;
        RegisterId::from_code(code).ok_or(DecodeError::InvalidRegister(code))
    };

    let operands = match mnemonic.shape() {
        Shape::ThreeReg => Operands::ThreeReg { dest: reg()?, first: reg()?, second: reg()? },
        Shape::TwoReg => Operands::TwoReg { first: reg()?, second: reg()? },
        Shape::TwoRegOneI => {
            let dest = reg()?;
            let src = reg()?;
            Operands::TwoRegOneI { dest, src, imm: word.signed_field(OPCODE_BITS + 8) }
        }
        Shape::OneReg => Operands::OneReg { reg: reg()? },
        Shape::OneRegOneI => {
            let dest = reg()?;
            Operands::OneRegOneI { dest, imm: word.signed_field(OPCODE_BITS + 4) }
        }
        Shape::Memory => {
            let r = reg()?;
            let address = word.field(OPCODE_BITS + 4, IMMEDIATE_BITS) as u16;
            Operands::Memory { reg: r, name: None, address }
        }
    };

    let used = OPCODE_BITS + mnemonic.shape().signature().iter().map(|k| k.bits()).sum::<usize>();
    if !word.is_padding_clear(used) {
        return Err(DecodeError::NonZeroPadding(word));
    }

    Ok(Instruction::new(mnemonic, operands))
}

/// Errors from decoding an instruction word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:06b}")]
    InvalidOpcode(u32),

    #[error("invalid register id: {0:04b}")]
    InvalidRegister(u32),

    #[error("padding bits are not zero in {0}")]
    NonZeroPadding(Word30),
}
