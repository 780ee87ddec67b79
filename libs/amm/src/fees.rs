//! Swap and imbalance fee schedule
//!
//! Rates are basis points over `FEE_DENOMINATOR`. Every fee, on swaps and
//! on imbalanced deposits alike, splits the same way: the admin share
//! leaves the pool balances and accrues to the pool's collected fees, the
//! rest stays in the balances for liquidity providers.

use crate::math::{mul_div, MathError, MathResult};
use serde::{Deserialize, Serialize};
use stablepool_config::constants::{
    fees::{FEE_DENOMINATOR, MAX_ADMIN_FEE_BPS, MAX_SWAP_FEE_BPS},
    pool::MIN_ASSETS,
};

/// Fee rates of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee charged on swap output (4 = 0.04%)
    pub swap_fee_bps: u32,
    /// Admin share of every fee, in basis points of that fee
    pub admin_fee_bps: u32,
}

impl FeeSchedule {
    pub fn new(swap_fee_bps: u32, admin_fee_bps: u32) -> Result<Self, String> {
        let schedule = Self {
            swap_fee_bps,
            admin_fee_bps,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.swap_fee_bps > MAX_SWAP_FEE_BPS {
            return Err(format!(
                "swap fee {} bps exceeds maximum {} bps",
                self.swap_fee_bps, MAX_SWAP_FEE_BPS
            ));
        }
        if self.admin_fee_bps > MAX_ADMIN_FEE_BPS {
            return Err(format!(
                "admin fee {} bps exceeds maximum {} bps",
                self.admin_fee_bps, MAX_ADMIN_FEE_BPS
            ));
        }
        Ok(())
    }

    /// Fee on a gross swap output
    pub fn swap_fee(&self, gross_out: u128) -> MathResult<u128> {
        mul_div(gross_out, u128::from(self.swap_fee_bps), FEE_DENOMINATOR)
    }

    /// Fee on a deposit's deviation from the proportional balance.
    ///
    /// Rate is `swap_fee * n / (4 * (n - 1))`, applied in a single
    /// truncating division.
    pub fn imbalance_fee(&self, deviation: u128, n_coins: usize) -> MathResult<u128> {
        if n_coins < MIN_ASSETS {
            return Err(MathError::DivisionByZero("imbalance_fee"));
        }
        let n = n_coins as u128;
        let numerator_rate = u128::from(self.swap_fee_bps) * n;
        let denominator = 4 * (n - 1) * FEE_DENOMINATOR;
        mul_div(deviation, numerator_rate, denominator)
    }

    /// Part of a fee owed to the administrator; removed from the pool
    /// balances into collected fees
    pub fn admin_share(&self, fee: u128) -> MathResult<u128> {
        mul_div(fee, u128::from(self.admin_fee_bps), FEE_DENOMINATOR)
    }
}
