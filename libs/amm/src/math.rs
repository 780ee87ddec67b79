//! Fixed-point integer helpers
//!
//! Pool balances are `u128` token units. Anything that multiplies two
//! balances (or a balance and the invariant) is widened to `U256` first and
//! narrowed back with [`to_u128`]. Every division truncates toward zero.

use primitive_types::U256;
use thiserror::Error;

/// Arithmetic failures inside the solver and fee math
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Arithmetic underflow in {0}")]
    Underflow(&'static str),

    #[error("Division by zero in {0}")]
    DivisionByZero(&'static str),
}

pub type MathResult<T> = Result<T, MathError>;

#[inline]
pub fn widen(value: u128) -> U256 {
    U256::from(value)
}

/// Narrow a 256-bit intermediate back to token units
pub fn to_u128(value: U256, context: &'static str) -> MathResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow(context));
    }
    Ok(value.as_u128())
}

pub fn checked_add(a: U256, b: U256, context: &'static str) -> MathResult<U256> {
    a.checked_add(b).ok_or(MathError::Overflow(context))
}

pub fn checked_sub(a: U256, b: U256, context: &'static str) -> MathResult<U256> {
    a.checked_sub(b).ok_or(MathError::Underflow(context))
}

pub fn checked_mul(a: U256, b: U256, context: &'static str) -> MathResult<U256> {
    a.checked_mul(b).ok_or(MathError::Overflow(context))
}

pub fn checked_div(a: U256, b: U256, context: &'static str) -> MathResult<U256> {
    a.checked_div(b).ok_or(MathError::DivisionByZero(context))
}

/// `a * b / denominator` with a 256-bit intermediate, truncating
pub fn mul_div(a: u128, b: u128, denominator: u128) -> MathResult<u128> {
    let product = checked_mul(widen(a), widen(b), "mul_div")?;
    let quotient = checked_div(product, widen(denominator), "mul_div")?;
    to_u128(quotient, "mul_div")
}

#[inline]
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// True when `a` and `b` differ by at most `tolerance` units
#[inline]
pub fn within_tolerance(a: U256, b: U256, tolerance: u128) -> bool {
    abs_diff(a, b) <= widen(tolerance)
}

/// Sum of a balance vector as a 256-bit value
pub fn sum(values: &[u128]) -> MathResult<U256> {
    values
        .iter()
        .try_fold(U256::zero(), |acc, &v| checked_add(acc, widen(v), "sum"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_truncates() {
        assert_eq!(mul_div(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div(1, 1, 3).unwrap(), 0);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // u128::MAX * 4 overflows u128 but the quotient fits
        assert_eq!(mul_div(u128::MAX, 4, 8).unwrap(), u128::MAX / 2);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(
            mul_div(1, 1, 0),
            Err(MathError::DivisionByZero("mul_div"))
        );
        assert_eq!(
            mul_div(u128::MAX, u128::MAX, 1),
            Err(MathError::Overflow("mul_div"))
        );
    }

    #[test]
    fn test_tolerance() {
        assert!(within_tolerance(widen(10), widen(11), 1));
        assert!(within_tolerance(widen(11), widen(10), 1));
        assert!(!within_tolerance(widen(10), widen(12), 1));
        assert_eq!(abs_diff(widen(3), widen(7)), widen(4));
    }

    #[test]
    fn test_sum_overflow_free_in_u256() {
        let total = sum(&[u128::MAX, u128::MAX]).unwrap();
        assert_eq!(total, widen(u128::MAX) * U256::from(2u8));
        assert!(to_u128(total, "test").is_err());
    }
}
