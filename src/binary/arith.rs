//! Numeric policies for 16-bit register arithmetic.
//!
//! Results are computed in `i64` and then brought back into
//! [`MIN_VALUE`, `MAX_VALUE`] by one of three policies:
//! - [`bounds_check`] rejects out-of-range results
//! - [`overflow_wrap`] reflects them back into range
//! - [`clamp_to_zero`] replaces them with zero

use crate::binary::{MAX_VALUE, MIN_VALUE};
use thiserror::Error;

/// Strict range check used by default arithmetic.
pub fn bounds_check(value: i64) -> Result<i32, LimitError> {
    if value > i64::from(MAX_VALUE) {
        return Err(LimitError::AboveMaximum);
    }
    if value < i64::from(MIN_VALUE) {
        return Err(LimitError::BelowMinimum);
    }
    Ok(value as i32)
}

/// Fold an out-of-range value back into range.
///
/// Below the minimum the value becomes `MAX + 1 + (v rem MIN)`, above the
/// maximum it becomes `MIN - 1 + (v rem MAX)`, repeated until in range.
/// `rem` truncates toward zero. Values already in range are unchanged.
pub fn overflow_wrap(mut value: i64) -> i32 {
    let min = i64::from(MIN_VALUE);
    let max = i64::from(MAX_VALUE);

    loop {
        if value < min {
            value = max + 1 + value % min;
        } else if value > max {
            value = min - 1 + value % max;
        } else {
            return value as i32;
        }
    }
}

/// Replace an out-of-range value with zero.
#[inline]
pub fn clamp_to_zero(value: i64) -> i32 {
    if (i64::from(MIN_VALUE)..=i64::from(MAX_VALUE)).contains(&value) {
        value as i32
    } else {
        0
    }
}

/// Division rounding toward negative infinity.
///
/// # Panics
/// Panics if `divisor` is zero; callers check for that first.
pub fn floor_div(dividend: i64, divisor: i64) -> i64 {
    let quotient = dividend / divisor;
    if dividend % divisor != 0 && (dividend < 0) != (divisor < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// `base` raised to `exponent`, bounds-checked.
///
/// Negative exponents produce a fraction, which is floored. Zero raised
/// to a negative power is unbounded and reported as above the maximum.
pub fn power(base: i32, exponent: i32) -> Result<i32, LimitError> {
    let result = f64::from(base).powf(f64::from(exponent)).floor();
    if result > f64::from(MAX_VALUE) {
        return Err(LimitError::AboveMaximum);
    }
    if result < f64::from(MIN_VALUE) {
        return Err(LimitError::BelowMinimum);
    }
    Ok(result as i32)
}

/// 32-bit left shift with the count masked to five bits.
#[inline]
pub fn shift_left(value: i32, count: i32) -> i64 {
    i64::from(value.wrapping_shl(count as u32))
}

/// 32-bit arithmetic right shift with the count masked to five bits.
#[inline]
pub fn shift_right(value: i32, count: i32) -> i32 {
    value.wrapping_shr(count as u32)
}

/// Floored square root of a non-negative value.
pub fn isqrt(value: i32) -> Option<i32> {
    if value < 0 {
        return None;
    }
    Some(f64::from(value).sqrt().floor() as i32)
}

/// A result fell outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("Number exceeded maximum limit: {}", MAX_VALUE)]
    AboveMaximum,

    #[error("Number exceeded minimum limit: {}", MIN_VALUE)]
    BelowMinimum,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wrap_is_identity_in_range(v in MIN_VALUE..=MAX_VALUE) {
            prop_assert_eq!(overflow_wrap(i64::from(v)), v);
        }

        #[test]
        fn wrap_always_lands_in_range(v in -(1i64 << 40)..(1i64 << 40)) {
            let wrapped = overflow_wrap(v);
            prop_assert!((MIN_VALUE..=MAX_VALUE).contains(&wrapped));
        }

        #[test]
        fn floor_div_never_exceeds_true_quotient(a in -40_000i64..40_000, b in 1i64..500) {
            let q = floor_div(a, b);
            prop_assert!(q * b <= a);
            prop_assert!((q + 1) * b > a);
        }
    }
}
