//! StableSwap invariant solver
//!
//! Newton iterations for the invariant `D` of a balance vector and for the
//! single balance `y` that keeps `D` fixed when another balance moves.
//! Both solvers work on 256-bit intermediates, truncate every division, and
//! stop once two successive iterates are within one unit of each other.
//! The order of multiplications and divisions below is part of the result:
//! reordering them changes the last digit.

use crate::math::{
    checked_add, checked_div, checked_mul, checked_sub, sum, to_u128, widen, within_tolerance,
    MathError,
};
use primitive_types::U256;
use stablepool_config::constants::{
    amplification::A_PRECISION,
    pool::MIN_ASSETS,
    solver::{CONVERGENCE_TOLERANCE, MAX_ITERATIONS},
};
use thiserror::Error;

/// Solver failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("Invalid solver input: {0}")]
    InvalidInput(String),

    /// The iteration budget ran out before two iterates agreed
    #[error("{solver} did not converge within {iterations} iterations")]
    DidNotConverge {
        solver: &'static str,
        iterations: usize,
    },

    #[error(transparent)]
    Math(#[from] MathError),
}

pub type SolverResult<T> = Result<T, SolverError>;

/// StableSwap invariant math with no state and no I/O
pub struct InvariantSolver;

impl InvariantSolver {
    /// Compute the invariant `D` for `balances` at amplification `amp`
    /// (scaled by `A_PRECISION`).
    ///
    /// An all-zero vector yields 0. A vector with some zero entries cannot
    /// be solved and reports `MathError::DivisionByZero`.
    pub fn compute_d(balances: &[u128], amp: u128) -> SolverResult<u128> {
        let d = Self::compute_d_wide(balances, amp, MAX_ITERATIONS)?;
        Ok(to_u128(d, "compute_d")?)
    }

    fn compute_d_wide(balances: &[u128], amp: u128, max_iterations: usize) -> SolverResult<U256> {
        let n_coins = balances.len();
        if n_coins < MIN_ASSETS {
            return Err(SolverError::InvalidInput(format!(
                "need at least {} balances, got {}",
                MIN_ASSETS, n_coins
            )));
        }

        let s = sum(balances)?;
        if s.is_zero() {
            return Ok(U256::zero());
        }

        let n = U256::from(n_coins);
        let precision = widen(A_PRECISION);
        let ann = checked_mul(widen(amp), n, "compute_d")?;
        let ann_less_precision = checked_sub(ann, precision, "compute_d")?;
        let ann_s = checked_div(checked_mul(ann, s, "compute_d")?, precision, "compute_d")?;
        let n_plus_one = n + U256::one();

        let mut d = s;
        for _ in 0..max_iterations {
            let mut d_p = d;
            for &balance in balances {
                let scaled = checked_mul(widen(balance), n, "compute_d")?;
                d_p = checked_div(checked_mul(d_p, d, "compute_d")?, scaled, "compute_d")?;
            }

            let previous = d;
            let numerator = checked_mul(
                checked_add(ann_s, checked_mul(d_p, n, "compute_d")?, "compute_d")?,
                d,
                "compute_d",
            )?;
            let denominator = checked_add(
                checked_div(
                    checked_mul(ann_less_precision, d, "compute_d")?,
                    precision,
                    "compute_d",
                )?,
                checked_mul(n_plus_one, d_p, "compute_d")?,
                "compute_d",
            )?;
            d = checked_div(numerator, denominator, "compute_d")?;

            if within_tolerance(d, previous, CONVERGENCE_TOLERANCE) {
                return Ok(d);
            }
        }

        Err(SolverError::DidNotConverge {
            solver: "compute_d",
            iterations: max_iterations,
        })
    }

    /// Compute the balance of asset `j` that keeps `D(balances)` constant
    /// when asset `i` moves to `new_balance_i`, all other balances fixed.
    ///
    /// `D` is taken from the current (pre-change) `balances`.
    pub fn compute_y(
        i: usize,
        j: usize,
        new_balance_i: u128,
        balances: &[u128],
        amp: u128,
    ) -> SolverResult<u128> {
        Self::compute_y_bounded(i, j, new_balance_i, balances, amp, MAX_ITERATIONS)
    }

    fn compute_y_bounded(
        i: usize,
        j: usize,
        new_balance_i: u128,
        balances: &[u128],
        amp: u128,
        max_iterations: usize,
    ) -> SolverResult<u128> {
        let n_coins = balances.len();
        if i == j {
            return Err(SolverError::InvalidInput(format!(
                "asset index {} used on both sides",
                i
            )));
        }
        if i >= n_coins || j >= n_coins {
            return Err(SolverError::InvalidInput(format!(
                "asset index out of range: i={}, j={}, assets={}",
                i, j, n_coins
            )));
        }

        let d = Self::compute_d_wide(balances, amp, MAX_ITERATIONS)?;
        let n = U256::from(n_coins);
        let precision = widen(A_PRECISION);
        let ann = checked_mul(widen(amp), n, "compute_y")?;

        let mut c = d;
        let mut s = U256::zero();
        for (k, &balance) in balances.iter().enumerate() {
            if k == j {
                continue;
            }
            let x = if k == i { widen(new_balance_i) } else { widen(balance) };
            s = checked_add(s, x, "compute_y")?;
            c = checked_div(
                checked_mul(c, d, "compute_y")?,
                checked_mul(x, n, "compute_y")?,
                "compute_y",
            )?;
        }
        c = checked_div(
            checked_mul(checked_mul(c, d, "compute_y")?, precision, "compute_y")?,
            checked_mul(ann, n, "compute_y")?,
            "compute_y",
        )?;
        let b = checked_add(
            s,
            checked_div(checked_mul(d, precision, "compute_y")?, ann, "compute_y")?,
            "compute_y",
        )?;

        let mut y = d;
        for _ in 0..max_iterations {
            let previous = y;
            let numerator = checked_add(checked_mul(y, y, "compute_y")?, c, "compute_y")?;
            let denominator = checked_sub(
                checked_add(checked_mul(y, U256::from(2u8), "compute_y")?, b, "compute_y")?,
                d,
                "compute_y",
            )?;
            y = checked_div(numerator, denominator, "compute_y")?;

            if within_tolerance(y, previous, CONVERGENCE_TOLERANCE) {
                return Ok(to_u128(y, "compute_y")?);
            }
        }

        Err(SolverError::DidNotConverge {
            solver: "compute_y",
            iterations: max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = 1_000_000_000_000_000_000;
    const AMP: u128 = 2000;

    #[test]
    fn test_empty_pool_has_zero_invariant() {
        assert_eq!(InvariantSolver::compute_d(&[0, 0], AMP).unwrap(), 0);
        assert_eq!(InvariantSolver::compute_d(&[0, 0, 0], AMP).unwrap(), 0);
    }

    #[test]
    fn test_balanced_invariant_equals_sum() {
        let d = InvariantSolver::compute_d(&[100 * E18, 100 * E18], AMP).unwrap();
        assert_eq!(d, 200 * E18);

        let d = InvariantSolver::compute_d(&[7 * E18, 7 * E18, 7 * E18], AMP).unwrap();
        assert_eq!(d, 21 * E18);
    }

    #[test]
    fn test_imbalanced_invariant_below_sum() {
        let d = InvariantSolver::compute_d(&[150 * E18, 100 * E18], AMP).unwrap();
        assert!(d < 250 * E18);
        // Flat curve near the peg: D stays within 0.5% of the sum
        assert!(d > 249 * E18);
    }

    #[test]
    fn test_higher_amplification_is_flatter() {
        let balances = [300 * E18, 100 * E18];
        let low = InvariantSolver::compute_d(&balances, 100).unwrap();
        let high = InvariantSolver::compute_d(&balances, 100_000).unwrap();
        assert!(high > low);
        assert!(high <= 400 * E18);
    }

    #[test]
    fn test_partial_zero_balance_is_rejected() {
        let result = InvariantSolver::compute_d(&[100 * E18, 0], AMP);
        assert!(matches!(
            result,
            Err(SolverError::Math(MathError::DivisionByZero(_)))
        ));
    }

    #[test]
    fn test_single_balance_is_rejected() {
        assert!(matches!(
            InvariantSolver::compute_d(&[100 * E18], AMP),
            Err(SolverError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_y_without_change_returns_current_balance() {
        let balances = [100 * E18, 100 * E18];
        let y = InvariantSolver::compute_y(0, 1, balances[0], &balances, AMP).unwrap();
        assert!(y.abs_diff(balances[1]) <= 2);
    }

    #[test]
    fn test_y_decreases_when_input_grows() {
        let balances = [100 * E18, 100 * E18];
        let y = InvariantSolver::compute_y(0, 1, 110 * E18, &balances, AMP).unwrap();
        assert!(y < 100 * E18);
        // Near the peg the counterparty moves almost one-for-one
        assert!(y > 90 * E18);
    }

    #[test]
    fn test_y_round_trip_near_peg() {
        let balances = [100 * E18, 100 * E18, 100 * E18];
        let x = 101 * E18;
        let y = InvariantSolver::compute_y(0, 2, x, &balances, AMP).unwrap();
        let x_back = InvariantSolver::compute_y(2, 0, y, &balances, AMP).unwrap();
        assert!(x_back.abs_diff(x) <= 2, "x={} x_back={}", x, x_back);
    }

    #[test]
    fn test_y_round_trip_large_skewed_balances() {
        let balances = [120_000_000 * E18, 990_000_000 * E18];
        for amount in [E18, 1_000 * E18, 1_000_000 * E18, 50_000_000 * E18] {
            let x = balances[0] + amount;
            let y = InvariantSolver::compute_y(0, 1, x, &balances, AMP).unwrap();
            let x_back = InvariantSolver::compute_y(1, 0, y, &balances, AMP).unwrap();
            assert!(x_back.abs_diff(x) <= 2, "x={} x_back={}", x, x_back);
        }
    }

    #[test]
    fn test_exhausted_iteration_budget_is_reported() {
        let balances = [150 * E18, 100 * E18];

        let err = InvariantSolver::compute_d_wide(&balances, AMP, 1).unwrap_err();
        assert_eq!(
            err,
            SolverError::DidNotConverge {
                solver: "compute_d",
                iterations: 1
            }
        );
        assert_eq!(err.to_string(), "compute_d did not converge within 1 iterations");

        let err = InvariantSolver::compute_y_bounded(0, 1, 160 * E18, &balances, AMP, 1).unwrap_err();
        assert!(matches!(
            err,
            SolverError::DidNotConverge {
                solver: "compute_y",
                iterations: 1
            }
        ));

        // The same inputs converge within the full budget
        assert!(InvariantSolver::compute_d_wide(&balances, AMP, MAX_ITERATIONS).is_ok());
        assert!(InvariantSolver::compute_y(0, 1, 160 * E18, &balances, AMP).is_ok());
    }

    #[test]
    fn test_y_rejects_bad_indices() {
        let balances = [100 * E18, 100 * E18];
        assert!(matches!(
            InvariantSolver::compute_y(1, 1, E18, &balances, AMP),
            Err(SolverError::InvalidInput(_))
        ));
        assert!(matches!(
            InvariantSolver::compute_y(0, 2, E18, &balances, AMP),
            Err(SolverError::InvalidInput(_))
        ));
    }
}
