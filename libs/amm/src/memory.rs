//! In-memory collaborators
//!
//! Reference implementations of [`AssetCustody`] and [`LiquidityLedger`] for
//! hosts that run pools off-chain and for tests. Both support fault
//! injection so callers can exercise the failure paths of every operation.

use crate::collaborators::{AccountId, AssetCustody, AssetId, CustodyError, LedgerError, LiquidityLedger};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Default)]
struct CustodyState {
    authorized: HashSet<AssetId>,
    accounts: HashMap<(AccountId, AssetId), u128>,
    vault: HashMap<AssetId, u128>,
}

#[derive(Debug, Default)]
struct CustodyFaults {
    pulls: HashSet<AssetId>,
    pushes: HashSet<AssetId>,
}

/// Custody backed by in-process balance maps
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    state: Mutex<CustodyState>,
    faults: RwLock<CustodyFaults>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an external account (funding outside the pool)
    pub fn deposit(&self, account: &AccountId, asset: &AssetId, amount: u128) {
        let mut state = self.state.lock();
        *state
            .accounts
            .entry((account.clone(), asset.clone()))
            .or_default() += amount;
    }

    pub fn balance_of(&self, account: &AccountId, asset: &AssetId) -> u128 {
        let state = self.state.lock();
        state
            .accounts
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Amount of `asset` held in pool custody
    pub fn vault_balance(&self, asset: &AssetId) -> u128 {
        self.state.lock().vault.get(asset).copied().unwrap_or(0)
    }

    pub fn is_authorized(&self, asset: &AssetId) -> bool {
        self.state.lock().authorized.contains(asset)
    }

    /// Make every subsequent pull of `asset` fail
    pub fn fail_pulls_of(&self, asset: &AssetId) {
        self.faults.write().pulls.insert(asset.clone());
    }

    /// Make every subsequent push of `asset` fail
    pub fn fail_pushes_of(&self, asset: &AssetId) {
        self.faults.write().pushes.insert(asset.clone());
    }

    pub fn clear_faults(&self) {
        let mut faults = self.faults.write();
        faults.pulls.clear();
        faults.pushes.clear();
    }
}

impl AssetCustody for InMemoryCustody {
    fn authorize(&self, asset: &AssetId) -> Result<(), CustodyError> {
        self.state.lock().authorized.insert(asset.clone());
        debug!(asset = %asset, "custody authorized asset");
        Ok(())
    }

    fn pull_from(
        &self,
        payer: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<(), CustodyError> {
        if self.faults.read().pulls.contains(asset) {
            return Err(CustodyError::Rejected(format!("pull of {} disabled", asset)));
        }

        let mut state = self.state.lock();
        if !state.authorized.contains(asset) {
            return Err(CustodyError::AssetNotAuthorized(asset.clone()));
        }

        let key = (payer.clone(), asset.clone());
        let available = state.accounts.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(CustodyError::InsufficientFunds {
                account: payer.clone(),
                asset: asset.clone(),
                available,
                required: amount,
            });
        }

        state.accounts.insert(key, available - amount);
        *state.vault.entry(asset.clone()).or_default() += amount;
        Ok(())
    }

    fn push_to(
        &self,
        recipient: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<(), CustodyError> {
        if self.faults.read().pushes.contains(asset) {
            return Err(CustodyError::Rejected(format!("push of {} disabled", asset)));
        }

        let mut state = self.state.lock();
        if !state.authorized.contains(asset) {
            return Err(CustodyError::AssetNotAuthorized(asset.clone()));
        }

        let held = state.vault.get(asset).copied().unwrap_or(0);
        if held < amount {
            return Err(CustodyError::Rejected(format!(
                "vault holds {} of {}, cannot release {}",
                held, asset, amount
            )));
        }

        state.vault.insert(asset.clone(), held - amount);
        *state
            .accounts
            .entry((recipient.clone(), asset.clone()))
            .or_default() += amount;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, u128>,
    total_supply: u128,
}

/// Share ledger backed by an in-process map
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    fail_mints: RwLock<bool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mint fail (or succeed again)
    pub fn set_fail_mints(&self, fail: bool) {
        *self.fail_mints.write() = fail;
    }
}

impl LiquidityLedger for InMemoryLedger {
    fn mint(&self, recipient: &AccountId, amount: u128) -> Result<(), LedgerError> {
        if *self.fail_mints.read() {
            return Err(LedgerError::Rejected("minting disabled".to_string()));
        }

        let mut state = self.state.write();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        state.total_supply = supply;
        *state.balances.entry(recipient.clone()).or_default() += amount;
        Ok(())
    }

    fn burn_from(&self, holder: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let available = state.balances.get(holder).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientShares {
                holder: holder.clone(),
                available,
                required: amount,
            });
        }
        state.balances.insert(holder.clone(), available - amount);
        state.total_supply -= amount;
        Ok(())
    }

    fn total_supply(&self) -> u128 {
        self.state.read().total_supply
    }

    fn balance_of(&self, holder: &AccountId) -> u128 {
        self.state.read().balances.get(holder).copied().unwrap_or(0)
    }
}
