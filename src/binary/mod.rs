//! Binary number primitives.
//!
//! This module provides the value-level building blocks of the simulator:
//! - [`to_binary16`] / [`from_binary16`] - 16-bit two's-complement immediates
//! - [`Word30`] - a fixed-width encoded instruction
//! - [`arith`] - the numeric policies applied by instruction actions

mod word;
pub mod arith;

pub use word::{
    to_binary16, from_binary16, Field, Word30, BinaryError,
    IMMEDIATE_BITS, INSTRUCTION_BITS, MAX_VALUE, MIN_VALUE,
};
pub use arith::{bounds_check, overflow_wrap, clamp_to_zero, floor_div, LimitError};
