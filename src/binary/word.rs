//! Fixed-width binary words.
//!
//! Two widths matter to the simulator:
//! - 16 bits: immediates and variable addresses, in two's complement
//! - 30 bits: a whole encoded instruction

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Largest value a register, immediate or variable may hold.
pub const MAX_VALUE: i32 = 32_767;

/// Smallest value a register, immediate or variable may hold.
pub const MIN_VALUE: i32 = -32_768;

/// Width of an encoded immediate.
pub const IMMEDIATE_BITS: usize = 16;

/// Width of an encoded instruction.
pub const INSTRUCTION_BITS: usize = 30;

/// Encode a value as a 16-character two's-complement bit string.
///
/// Negative values are encoded as the complement of `|v| - 1`, which is the
/// same bit pattern as ordinary two's complement.
///
/// # Panics
/// Panics if value is outside the range [-32768, 32767].
pub fn to_binary16(value: i32) -> String {
    format!("{:016b}", twos_complement16(value))
}

/// The 16-bit pattern behind [`to_binary16`].
///
/// # Panics
/// Panics if value is outside the range [-32768, 32767].
fn twos_complement16(value: i32) -> u16 {
    assert!(
        (MIN_VALUE..=MAX_VALUE).contains(&value),
        "Value {} out of range for a 16-bit immediate [{}, {}]",
        value, MIN_VALUE, MAX_VALUE
    );

    if value >= 0 {
        value as u16
    } else {
        let magnitude = (value.unsigned_abs() - 1) as u16;
        !magnitude
    }
}

/// Decode a 16-character two's-complement bit string.
pub fn from_binary16(bits: &str) -> Result<i32, BinaryError> {
    if bits.len() != IMMEDIATE_BITS {
        return Err(BinaryError::WrongWidth { expected: IMMEDIATE_BITS, found: bits.len() });
    }

    if !is_bit_string(bits) {
        return Err(BinaryError::InvalidDigit(bits.to_string()));
    }
    let raw = u16::from_str_radix(bits, 2)
        .map_err(|_| BinaryError::InvalidDigit(bits.to_string()))?;

    // High bit set: undo the complement-of-magnitude-minus-one encoding
    if raw & 0x8000 != 0 {
        Ok(-(i32::from(!raw)) - 1)
    } else {
        Ok(i32::from(raw))
    }
}

fn is_bit_string(s: &str) -> bool {
    s.bytes().all(|b| b == b'0' || b == b'1')
}

/// One field of an instruction word, most significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub value: u32,
    pub width: usize,
}

impl Field {
    pub const fn new(value: u32, width: usize) -> Self {
        Self { value, width }
    }

    /// A 16-bit two's-complement immediate field, bit for bit what
    /// [`to_binary16`] prints.
    ///
    /// # Panics
    /// Panics if value is outside the range [-32768, 32767].
    pub fn immediate(value: i32) -> Self {
        Self::new(u32::from(twos_complement16(value)), IMMEDIATE_BITS)
    }
}

/// A 30-bit encoded instruction.
///
/// Fields are packed from the most significant bit down; whatever width the
/// fields leave unused is zero padding on the right.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Word30 {
    bits: u32,
}

impl Word30 {
    /// Mask covering all 30 instruction bits.
    pub const MASK: u32 = (1 << INSTRUCTION_BITS) - 1;

    /// Create from a raw value.
    ///
    /// # Panics
    /// Panics if the value does not fit in 30 bits.
    pub fn from_raw(bits: u32) -> Self {
        assert!(bits <= Self::MASK, "Value {:#x} does not fit in {} bits", bits, INSTRUCTION_BITS);
        Self { bits }
    }

    /// The raw 30-bit value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.bits
    }

    /// Concatenate fields and right-pad the result with zeros.
    ///
    /// # Panics
    /// Panics if the fields are wider than 30 bits in total, or if a field
    /// value does not fit its width.
    pub fn assemble(fields: &[Field]) -> Self {
        let mut bits: u32 = 0;
        let mut used = 0;

        for field in fields {
            assert!(
                field.width < 32 && field.value >> field.width == 0,
                "Field value {:#x} does not fit in {} bits", field.value, field.width
            );
            bits = (bits << field.width) | field.value;
            used += field.width;
        }

        assert!(used <= INSTRUCTION_BITS, "Fields use {} bits, only {} available", used, INSTRUCTION_BITS);

        Self { bits: bits << (INSTRUCTION_BITS - used) }
    }

    /// Extract `width` bits starting `offset` bits from the most significant end.
    pub fn field(&self, offset: usize, width: usize) -> u32 {
        debug_assert!(offset + width <= INSTRUCTION_BITS);
        let shift = INSTRUCTION_BITS - offset - width;
        (self.bits >> shift) & ((1 << width) - 1)
    }

    /// Extract a 16-bit two's-complement field as a signed value.
    pub fn signed_field(&self, offset: usize) -> i32 {
        i32::from(self.field(offset, IMMEDIATE_BITS) as u16 as i16)
    }

    /// True if every bit from `offset` to the end is zero.
    pub fn is_padding_clear(&self, offset: usize) -> bool {
        offset >= INSTRUCTION_BITS || self.field(offset, INSTRUCTION_BITS - offset) == 0
    }

    /// Parse a 30-character bit string.
    pub fn parse(s: &str) -> Result<Self, BinaryError> {
        if s.len() != INSTRUCTION_BITS {
            return Err(BinaryError::WrongWidth { expected: INSTRUCTION_BITS, found: s.len() });
        }

        if !is_bit_string(s) {
            return Err(BinaryError::InvalidDigit(s.to_string()));
        }
        let bits = u32::from_str_radix(s, 2)
            .map_err(|_| BinaryError::InvalidDigit(s.to_string()))?;
        Ok(Self { bits })
    }
}

impl fmt::Display for Word30 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:030b}", self.bits)
    }
}

impl fmt::Debug for Word30 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word30({})", self)
    }
}

/// Errors from parsing bit strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinaryError {
    #[error("expected {expected} bits, found {found}")]
    WrongWidth { expected: usize, found: usize },

    #[error("invalid binary digit in '{0}'")]
    InvalidDigit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary16_positive() {
        assert_eq!(to_binary16(0), "0000000000000000");
        assert_eq!(to_binary16(5), "0000000000000101");
        assert_eq!(to_binary16(MAX_VALUE), "0111111111111111");
    }

    #[test]
    fn test_binary16_negative() {
        assert_eq!(to_binary16(-1), "1111111111111111");
        assert_eq!(to_binary16(-2), "1111111111111110");
        assert_eq!(to_binary16(MIN_VALUE), "1000000000000000");
    }

    #[test]
    fn test_binary16_matches_native_twos_complement() {
        for v in [-32768, -1234, -17, -1, 0, 1, 17, 1234, 32767] {
            assert_eq!(to_binary16(v), format!("{:016b}", v as i16 as u16));
        }
    }

    #[test]
    #[should_panic]
    fn test_binary16_rejects_out_of_range() {
        to_binary16(40_000);
    }

    #[test]
    fn test_from_binary16_errors() {
        assert_eq!(
            from_binary16("0101"),
            Err(BinaryError::WrongWidth { expected: 16, found: 4 })
        );
        assert!(matches!(
            from_binary16("000000000000000x"),
            Err(BinaryError::InvalidDigit(_))
        ));
    }

    #[test]
    fn test_immediate_field_uses_binary16_pattern() {
        for v in [MIN_VALUE, -300, -1, 0, 1, 300, MAX_VALUE] {
            let field = Field::immediate(v);
            assert_eq!(field.width, IMMEDIATE_BITS);
            assert_eq!(format!("{:016b}", field.value), to_binary16(v));
        }
    }

    #[test]
    #[should_panic]
    fn test_immediate_field_rejects_out_of_range() {
        Field::immediate(MAX_VALUE + 1);
    }

    #[test]
    fn test_word30_assemble_pads_right() {
        let word = Word30::assemble(&[Field::new(0b000001, 6), Field::new(0b0001, 4)]);
        assert_eq!(word.to_string(), "000001000100000000000000000000");
        assert_eq!(word.to_string().len(), INSTRUCTION_BITS);
    }

    #[test]
    fn test_word30_full_width() {
        let word = Word30::assemble(&[
            Field::new(0b011101, 6),
            Field::new(0b0001, 4),
            Field::new(0b0010, 4),
            Field::immediate(-1),
        ]);
        assert_eq!(word.to_string(), "011101000100101111111111111111");
    }

    #[test]
    fn test_word30_field_extraction() {
        let word = Word30::assemble(&[
            Field::new(45, 6),
            Field::new(3, 4),
            Field::immediate(-42),
        ]);
        assert_eq!(word.field(0, 6), 45);
        assert_eq!(word.field(6, 4), 3);
        assert_eq!(word.signed_field(10), -42);
        assert!(word.is_padding_clear(26));
        assert!(!word.is_padding_clear(10));
    }

    #[test]
    fn test_word30_parse() {
        let word = Word30::assemble(&[Field::new(7, 6)]);
        assert_eq!(Word30::parse(&word.to_string()), Ok(word));
        assert!(Word30::parse("0101").is_err());
        assert!(Word30::parse("00000000000000000000000000000x").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn binary16_roundtrip(v in MIN_VALUE..=MAX_VALUE) {
            let bits = to_binary16(v);
            prop_assert_eq!(bits.len(), IMMEDIATE_BITS);
            prop_assert_eq!(from_binary16(&bits), Ok(v));
        }

        #[test]
        fn immediate_field_matches_string_encoding(v in MIN_VALUE..=MAX_VALUE) {
            let word = Word30::assemble(&[Field::immediate(v)]);
            let text = word.to_string();
            prop_assert_eq!(&text[..IMMEDIATE_BITS], to_binary16(v));
            prop_assert_eq!(word.signed_field(0), v);
        }
    }
}
