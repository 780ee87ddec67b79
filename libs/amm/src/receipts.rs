//! Result records returned by mutating pool operations

use crate::collaborators::{AccountId, AssetId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub pool_id: String,
    pub trader: AccountId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub amount_in: u128,
    /// Amount delivered to the trader
    pub amount_out: u128,
    /// Fee charged on the gross output
    pub fee: u128,
    /// Admin share of `fee`, moved from the pool balances to collected fees
    pub admin_fee: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub pool_id: String,
    pub provider: AccountId,
    pub amounts: Vec<u128>,
    /// Imbalance fee per asset (all zero for the first deposit)
    pub fees: Vec<u128>,
    pub shares_minted: u128,
    /// Invariant of the deposit-plus-balances vector net of the full
    /// imbalance fee; the mint is priced against it. The committed pool
    /// invariant is slightly higher because only the admin share of each
    /// fee leaves the balances.
    pub minting_invariant: u128,
    pub share_supply: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub pool_id: String,
    pub provider: AccountId,
    pub shares_burned: u128,
    pub amounts: Vec<u128>,
    pub share_supply: u128,
}

/// Fees transferred out of the pool by its administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeWithdrawal {
    pub pool_id: String,
    pub recipient: AccountId,
    pub amounts: Vec<u128>,
}
