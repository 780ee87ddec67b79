//! External collaborators consumed by a pool
//!
//! A pool never moves tokens or share units itself. Asset movement goes
//! through [`AssetCustody`]; share accounting goes through
//! [`LiquidityLedger`]. Both are expected to apply each call atomically:
//! a call either fully happens or reports an error and changes nothing.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of an underlying asset (e.g. `USDC.arb`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

/// Identifier of an account that pays into or receives from a pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Custody transfer failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("{account} holds {available} of {asset}, needs {required}")]
    InsufficientFunds {
        account: AccountId,
        asset: AssetId,
        available: u128,
        required: u128,
    },

    #[error("Asset {0} is not authorized for custody")]
    AssetNotAuthorized(AssetId),

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Share ledger failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{holder} holds {available} shares, needs {required}")]
    InsufficientShares {
        holder: AccountId,
        available: u128,
        required: u128,
    },

    #[error("Share supply overflow")]
    SupplyOverflow,

    #[error("Ledger rejected operation: {0}")]
    Rejected(String),
}

/// Exclusive custody of the pool's underlying assets
pub trait AssetCustody: Send + Sync {
    /// Approve `asset` for transfers into and out of the pool
    fn authorize(&self, asset: &AssetId) -> Result<(), CustodyError>;

    /// Move `amount` of `asset` from `payer` into pool custody
    fn pull_from(&self, payer: &AccountId, asset: &AssetId, amount: u128)
        -> Result<(), CustodyError>;

    /// Move `amount` of `asset` from pool custody to `recipient`
    fn push_to(
        &self,
        recipient: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<(), CustodyError>;
}

/// Ledger of the share token representing pool ownership
pub trait LiquidityLedger: Send + Sync {
    fn mint(&self, recipient: &AccountId, amount: u128) -> Result<(), LedgerError>;

    fn burn_from(&self, holder: &AccountId, amount: u128) -> Result<(), LedgerError>;

    fn total_supply(&self) -> u128;

    fn balance_of(&self, holder: &AccountId) -> u128;
}
