//! StableSwap pool state machine
//!
//! Holds balances, amplification and fees for one pool and exposes swap
//! and liquidity operations built on [`InvariantSolver`]. Each mutating
//! operation first computes a complete quote from the current state, then
//! settles with the collaborators, and only then commits the quote. A
//! rejected operation leaves both the pool and the collaborators unchanged.
//!
//! A pool is not internally synchronized; [`crate::PoolRegistry`] wraps each
//! pool in a mutex held for the whole read-modify-write cycle.

use crate::capability::AdminCapability;
use crate::collaborators::{AccountId, AssetCustody, AssetId, LiquidityLedger};
use crate::error::{PoolError, PoolResult};
use crate::fees::FeeSchedule;
use crate::invariant::InvariantSolver;
use crate::math::{mul_div, MathError};
use crate::receipts::{DepositReceipt, FeeWithdrawal, SwapReceipt, WithdrawalReceipt};
use crate::settlement::Settlement;
use serde::{Deserialize, Serialize};
use stablepool_config::constants::{
    amplification::{MAX_AMPLIFICATION, MIN_AMPLIFICATION},
    pool::{MAX_ASSETS, MIN_ASSETS, VIRTUAL_PRICE_SCALE},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Amplification and fee settings of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParameters {
    /// Amplification coefficient scaled by `A_PRECISION`
    pub amplification: u128,
    pub fees: FeeSchedule,
}

impl PoolParameters {
    pub fn new(amplification: u128, swap_fee_bps: u32, admin_fee_bps: u32) -> PoolResult<Self> {
        let params = Self {
            amplification,
            fees: FeeSchedule {
                swap_fee_bps,
                admin_fee_bps,
            },
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> PoolResult<()> {
        if !(MIN_AMPLIFICATION..=MAX_AMPLIFICATION).contains(&self.amplification) {
            return Err(PoolError::ParameterOutOfRange(format!(
                "amplification {} outside [{}, {}]",
                self.amplification, MIN_AMPLIFICATION, MAX_AMPLIFICATION
            )));
        }
        self.fees.validate().map_err(PoolError::ParameterOutOfRange)
    }
}

/// Serializable view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub id: String,
    pub assets: Vec<AssetId>,
    pub balances: Vec<u128>,
    pub collected_fees: Vec<u128>,
    pub parameters: PoolParameters,
    pub share_supply: u128,
    pub initialized: bool,
}

#[derive(Debug)]
struct SwapQuote {
    new_balance_in: u128,
    new_balance_out: u128,
    amount_out: u128,
    fee: u128,
    admin_fee: u128,
}

#[derive(Debug)]
struct DepositQuote {
    balances: Vec<u128>,
    fees: Vec<u128>,
    admin_fees: Vec<u128>,
    shares: u128,
    minting_invariant: u128,
}

pub struct StablePool {
    id: String,
    assets: Vec<AssetId>,
    balances: Vec<u128>,
    collected_fees: Vec<u128>,
    params: PoolParameters,
    initialized: bool,
    scope: Uuid,
    custody: Arc<dyn AssetCustody>,
    ledger: Arc<dyn LiquidityLedger>,
}

impl std::fmt::Debug for StablePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StablePool")
            .field("id", &self.id)
            .field("assets", &self.assets)
            .field("balances", &self.balances)
            .field("collected_fees", &self.collected_fees)
            .field("params", &self.params)
            .field("initialized", &self.initialized)
            .finish()
    }
}

/// Collects everything needed to create a [`StablePool`]
pub struct PoolBuilder {
    id: String,
    assets: Vec<AssetId>,
    amplification: u128,
    swap_fee_bps: u32,
    admin_fee_bps: u32,
    custody: Option<Arc<dyn AssetCustody>>,
    ledger: Option<Arc<dyn LiquidityLedger>>,
}

impl PoolBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            assets: Vec::new(),
            amplification: MIN_AMPLIFICATION,
            swap_fee_bps: 0,
            admin_fee_bps: 0,
            custody: None,
            ledger: None,
        }
    }

    pub fn asset(mut self, asset: AssetId) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn assets<I>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = AssetId>,
    {
        self.assets.extend(assets);
        self
    }

    pub fn amplification(mut self, amplification: u128) -> Self {
        self.amplification = amplification;
        self
    }

    pub fn swap_fee_bps(mut self, bps: u32) -> Self {
        self.swap_fee_bps = bps;
        self
    }

    pub fn admin_fee_bps(mut self, bps: u32) -> Self {
        self.admin_fee_bps = bps;
        self
    }

    pub fn custody(mut self, custody: Arc<dyn AssetCustody>) -> Self {
        self.custody = Some(custody);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn LiquidityLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Build an uninitialized pool administered by `capability`
    pub fn build(self, capability: &AdminCapability) -> PoolResult<StablePool> {
        self.build_scoped(capability.scope())
    }

    pub(crate) fn build_scoped(self, scope: Uuid) -> PoolResult<StablePool> {
        if self.id.trim().is_empty() {
            return Err(PoolError::InvalidInput("pool id must not be empty".to_string()));
        }
        let n_coins = self.assets.len();
        if !(MIN_ASSETS..=MAX_ASSETS).contains(&n_coins) {
            return Err(PoolError::InvalidInput(format!(
                "pool needs between {} and {} assets, got {}",
                MIN_ASSETS, MAX_ASSETS, n_coins
            )));
        }
        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset) {
                return Err(PoolError::InvalidInput(format!("duplicate asset {}", asset)));
            }
        }

        let params = PoolParameters::new(self.amplification, self.swap_fee_bps, self.admin_fee_bps)?;
        let custody = self
            .custody
            .ok_or_else(|| PoolError::InvalidInput("pool needs a custody collaborator".to_string()))?;
        let ledger = self
            .ledger
            .ok_or_else(|| PoolError::InvalidInput("pool needs a share ledger".to_string()))?;

        Ok(StablePool {
            id: self.id,
            balances: vec![0; n_coins],
            collected_fees: vec![0; n_coins],
            assets: self.assets,
            params,
            initialized: false,
            scope,
            custody,
            ledger,
        })
    }
}

impl StablePool {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn balances(&self) -> &[u128] {
        &self.balances
    }

    /// Fees removed from the balances but still held in custody
    pub fn collected_fees(&self) -> &[u128] {
        &self.collected_fees
    }

    pub fn parameters(&self) -> PoolParameters {
        self.params
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn share_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn asset_index(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            id: self.id.clone(),
            assets: self.assets.clone(),
            balances: self.balances.clone(),
            collected_fees: self.collected_fees.clone(),
            parameters: self.params,
            share_supply: self.share_supply(),
            initialized: self.initialized,
        }
    }

    /// One-time transition to the ready state; authorizes every asset
    /// with custody.
    pub fn initialize(&mut self, capability: &AdminCapability) -> PoolResult<()> {
        self.authorize(capability)?;
        if self.initialized {
            return Err(PoolError::AlreadyInitialized(self.id.clone()));
        }
        for asset in &self.assets {
            self.custody.authorize(asset)?;
        }
        self.initialized = true;
        info!(pool = %self.id, assets = self.assets.len(), "pool initialized");
        Ok(())
    }

    /// Replace amplification and fee settings
    pub fn update_parameters(
        &mut self,
        capability: &AdminCapability,
        amplification: u128,
        swap_fee_bps: u32,
        admin_fee_bps: u32,
    ) -> PoolResult<()> {
        self.authorize(capability)?;
        let params = PoolParameters::new(amplification, swap_fee_bps, admin_fee_bps)?;
        info!(
            pool = %self.id,
            old_amp = self.params.amplification,
            new_amp = amplification,
            swap_fee_bps,
            admin_fee_bps,
            "pool parameters updated"
        );
        self.params = params;
        Ok(())
    }

    /// Invariant of an arbitrary balance vector at this pool's amplification
    pub fn get_d(&self, balances: &[u128]) -> PoolResult<u128> {
        if balances.len() != self.assets.len() {
            return Err(self.length_mismatch("balances", balances.len()));
        }
        Ok(InvariantSolver::compute_d(balances, self.params.amplification)?)
    }

    /// Invariant of the current balances
    pub fn invariant(&self) -> PoolResult<u128> {
        self.get_d(&self.balances)
    }

    /// Invariant per share, scaled by 1e18; 0 for an empty pool
    pub fn virtual_price(&self) -> PoolResult<u128> {
        let supply = self.share_supply();
        if supply == 0 {
            return Ok(0);
        }
        Ok(mul_div(self.invariant()?, VIRTUAL_PRICE_SCALE, supply)?)
    }

    /// Preview of [`StablePool::swap`] on the current state
    pub fn get_swap_amount(
        &self,
        token_in: usize,
        token_out: usize,
        amount_in: u128,
    ) -> PoolResult<u128> {
        self.ensure_initialized()?;
        Ok(self.quote_swap(token_in, token_out, amount_in)?.amount_out)
    }

    /// Swap `amount_in` of asset `token_in` for asset `token_out`
    pub fn swap(
        &mut self,
        trader: &AccountId,
        token_in: usize,
        token_out: usize,
        amount_in: u128,
        min_amount_out: u128,
    ) -> PoolResult<SwapReceipt> {
        self.ensure_initialized()?;
        let quote = self.quote_swap(token_in, token_out, amount_in)?;
        if quote.amount_out < min_amount_out {
            warn!(
                pool = %self.id,
                amount_out = quote.amount_out,
                min_amount_out,
                "swap rejected by slippage guard"
            );
            return Err(PoolError::SlippageExceeded(format!(
                "swap yields {}, minimum is {}",
                quote.amount_out, min_amount_out
            )));
        }

        let asset_in = &self.assets[token_in];
        let asset_out = &self.assets[token_out];
        Settlement::run(self.custody.as_ref(), self.ledger.as_ref(), |s| {
            s.pull(trader, asset_in, amount_in)?;
            s.push(trader, asset_out, quote.amount_out)
        })?;

        self.balances[token_in] = quote.new_balance_in;
        self.balances[token_out] = quote.new_balance_out;
        self.collected_fees[token_out] += quote.admin_fee;

        let receipt = SwapReceipt {
            pool_id: self.id.clone(),
            trader: trader.clone(),
            asset_in: self.assets[token_in].clone(),
            asset_out: self.assets[token_out].clone(),
            amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            admin_fee: quote.admin_fee,
        };
        debug!(
            pool = %self.id,
            asset_in = %receipt.asset_in,
            asset_out = %receipt.asset_out,
            amount_in,
            amount_out = receipt.amount_out,
            fee = receipt.fee,
            "swap executed"
        );
        Ok(receipt)
    }

    /// Preview of [`StablePool::add_liquidity`]: shares that would be minted
    pub fn calculate_add_liquidity(&self, amounts: &[u128]) -> PoolResult<u128> {
        self.ensure_initialized()?;
        Ok(self.quote_deposit(amounts)?.shares)
    }

    /// Deposit `amounts` (one entry per asset) and mint shares to `provider`
    pub fn add_liquidity(
        &mut self,
        provider: &AccountId,
        amounts: &[u128],
        min_shares_out: u128,
    ) -> PoolResult<DepositReceipt> {
        self.ensure_initialized()?;
        let quote = self.quote_deposit(amounts)?;
        if quote.shares < min_shares_out {
            warn!(
                pool = %self.id,
                shares = quote.shares,
                min_shares_out,
                "deposit rejected by slippage guard"
            );
            return Err(PoolError::SlippageExceeded(format!(
                "deposit mints {} shares, minimum is {}",
                quote.shares, min_shares_out
            )));
        }

        let assets = &self.assets;
        Settlement::run(self.custody.as_ref(), self.ledger.as_ref(), |s| {
            for (asset, &amount) in assets.iter().zip(amounts) {
                s.pull(provider, asset, amount)?;
            }
            s.mint(provider, quote.shares)
        })?;

        self.balances = quote.balances;
        for (collected, admin_fee) in self.collected_fees.iter_mut().zip(&quote.admin_fees) {
            *collected += admin_fee;
        }

        let receipt = DepositReceipt {
            pool_id: self.id.clone(),
            provider: provider.clone(),
            amounts: amounts.to_vec(),
            fees: quote.fees,
            shares_minted: quote.shares,
            minting_invariant: quote.minting_invariant,
            share_supply: self.share_supply(),
        };
        debug!(
            pool = %self.id,
            provider = %provider,
            shares = receipt.shares_minted,
            supply = receipt.share_supply,
            "liquidity added"
        );
        Ok(receipt)
    }

    /// Preview of [`StablePool::remove_liquidity`]: pro-rata amounts for
    /// `shares`
    pub fn calculate_remove_liquidity(&self, shares: u128) -> PoolResult<Vec<u128>> {
        self.ensure_initialized()?;
        let supply = self.share_supply();
        if shares == 0 {
            return Err(PoolError::InvalidInput("cannot burn zero shares".to_string()));
        }
        if shares > supply {
            return Err(PoolError::InsufficientBalance(format!(
                "cannot burn {} shares, supply is {}",
                shares, supply
            )));
        }
        self.balances
            .iter()
            .map(|&balance| mul_div(balance, shares, supply).map_err(PoolError::from))
            .collect()
    }

    /// Burn `burn_shares` from `provider` and pay out the pro-rata
    /// share of every balance
    pub fn remove_liquidity(
        &mut self,
        provider: &AccountId,
        burn_shares: u128,
        min_amounts_out: &[u128],
    ) -> PoolResult<WithdrawalReceipt> {
        self.ensure_initialized()?;
        if min_amounts_out.len() != self.assets.len() {
            return Err(self.length_mismatch("min_amounts_out", min_amounts_out.len()));
        }
        let amounts = self.calculate_remove_liquidity(burn_shares)?;

        for (i, (&amount, &min)) in amounts.iter().zip(min_amounts_out).enumerate() {
            if amount < min {
                warn!(pool = %self.id, asset = %self.assets[i], amount, min, "withdrawal rejected by slippage guard");
                return Err(PoolError::SlippageExceeded(format!(
                    "withdrawal of {} yields {}, minimum is {}",
                    self.assets[i], amount, min
                )));
            }
        }

        let assets = &self.assets;
        Settlement::run(self.custody.as_ref(), self.ledger.as_ref(), |s| {
            s.burn(provider, burn_shares)?;
            for (asset, &amount) in assets.iter().zip(&amounts) {
                s.push(provider, asset, amount)?;
            }
            Ok(())
        })?;

        for (balance, amount) in self.balances.iter_mut().zip(&amounts) {
            *balance -= amount;
        }

        let receipt = WithdrawalReceipt {
            pool_id: self.id.clone(),
            provider: provider.clone(),
            shares_burned: burn_shares,
            amounts,
            share_supply: self.share_supply(),
        };
        debug!(
            pool = %self.id,
            provider = %provider,
            shares = burn_shares,
            supply = receipt.share_supply,
            "liquidity removed"
        );
        Ok(receipt)
    }

    /// Transfer every collected fee to `recipient`
    pub fn withdraw_collected_fees(
        &mut self,
        capability: &AdminCapability,
        recipient: &AccountId,
    ) -> PoolResult<FeeWithdrawal> {
        self.authorize(capability)?;
        self.ensure_initialized()?;

        let assets = &self.assets;
        let amounts = self.collected_fees.clone();
        Settlement::run(self.custody.as_ref(), self.ledger.as_ref(), |s| {
            for (asset, &amount) in assets.iter().zip(&amounts) {
                s.push(recipient, asset, amount)?;
            }
            Ok(())
        })?;

        self.collected_fees.iter_mut().for_each(|fee| *fee = 0);
        info!(pool = %self.id, recipient = %recipient, ?amounts, "collected fees withdrawn");
        Ok(FeeWithdrawal {
            pool_id: self.id.clone(),
            recipient: recipient.clone(),
            amounts,
        })
    }

    fn quote_swap(&self, token_in: usize, token_out: usize, amount_in: u128) -> PoolResult<SwapQuote> {
        let n_coins = self.assets.len();
        if token_in == token_out {
            return Err(PoolError::InvalidInput(format!(
                "cannot swap asset {} for itself",
                token_in
            )));
        }
        if token_in >= n_coins || token_out >= n_coins {
            return Err(PoolError::InvalidInput(format!(
                "asset index out of range: in={}, out={}, assets={}",
                token_in, token_out, n_coins
            )));
        }
        if amount_in == 0 {
            return Err(PoolError::InvalidInput("swap amount must be positive".to_string()));
        }
        self.ensure_liquidity()?;

        let new_balance_in = self.balances[token_in]
            .checked_add(amount_in)
            .ok_or(MathError::Overflow("swap"))?;
        let target_out = InvariantSolver::compute_y(
            token_in,
            token_out,
            new_balance_in,
            &self.balances,
            self.params.amplification,
        )?;
        let gross_out = self.balances[token_out]
            .checked_sub(target_out)
            .ok_or(MathError::Underflow("swap"))?;

        let fee = self.params.fees.swap_fee(gross_out)?;
        let amount_out = gross_out - fee;
        let admin_fee = self.params.fees.admin_share(fee)?;
        let new_balance_out = self.balances[token_out]
            .checked_sub(amount_out)
            .and_then(|b| b.checked_sub(admin_fee))
            .ok_or(MathError::Underflow("swap"))?;

        Ok(SwapQuote {
            new_balance_in,
            new_balance_out,
            amount_out,
            fee,
            admin_fee,
        })
    }

    fn quote_deposit(&self, amounts: &[u128]) -> PoolResult<DepositQuote> {
        let n_coins = self.assets.len();
        if amounts.len() != n_coins {
            return Err(self.length_mismatch("amounts", amounts.len()));
        }
        let amp = self.params.amplification;
        let supply = self.share_supply();

        let new_balances = self
            .balances
            .iter()
            .zip(amounts)
            .map(|(&balance, &amount)| balance.checked_add(amount).ok_or(MathError::Overflow("deposit")))
            .collect::<Result<Vec<u128>, MathError>>()?;

        if supply == 0 {
            if let Some(i) = amounts.iter().position(|&a| a == 0) {
                return Err(PoolError::InvalidInput(format!(
                    "first deposit must include every asset, {} is zero",
                    self.assets[i]
                )));
            }
            let shares = amounts
                .iter()
                .try_fold(0u128, |acc, &a| acc.checked_add(a))
                .ok_or(MathError::Overflow("deposit"))?;
            let minting_invariant = InvariantSolver::compute_d(&new_balances, amp)?;
            return Ok(DepositQuote {
                balances: new_balances,
                fees: vec![0; n_coins],
                admin_fees: vec![0; n_coins],
                shares,
                minting_invariant,
            });
        }

        self.ensure_liquidity()?;
        let d0 = InvariantSolver::compute_d(&self.balances, amp)?;
        let d1 = InvariantSolver::compute_d(&new_balances, amp)?;
        if d1 <= d0 {
            return Err(PoolError::SlippageExceeded(format!(
                "deposit does not grow the invariant ({} -> {})",
                d0, d1
            )));
        }

        let mut fees = Vec::with_capacity(n_coins);
        let mut admin_fees = Vec::with_capacity(n_coins);
        let mut committed = Vec::with_capacity(n_coins);
        let mut fee_adjusted = Vec::with_capacity(n_coins);
        for (&old, &new) in self.balances.iter().zip(&new_balances) {
            let ideal = mul_div(d1, old, d0)?;
            let fee = self.params.fees.imbalance_fee(new.abs_diff(ideal), n_coins)?;
            let admin_fee = self.params.fees.admin_share(fee)?;
            committed.push(new.checked_sub(admin_fee).ok_or(MathError::Underflow("deposit"))?);
            fee_adjusted.push(new.checked_sub(fee).ok_or(MathError::Underflow("deposit"))?);
            fees.push(fee);
            admin_fees.push(admin_fee);
        }

        let d2 = InvariantSolver::compute_d(&fee_adjusted, amp)?;
        if d2 <= d0 {
            return Err(PoolError::SlippageExceeded(format!(
                "deposit does not grow the invariant after fees ({} -> {})",
                d0, d2
            )));
        }
        let shares = mul_div(supply, d2 - d0, d0)?;
        if shares == 0 {
            return Err(PoolError::SlippageExceeded(
                "deposit is too small to mint a share".to_string(),
            ));
        }

        Ok(DepositQuote {
            balances: committed,
            fees,
            admin_fees,
            shares,
            minting_invariant: d2,
        })
    }

    fn authorize(&self, capability: &AdminCapability) -> PoolResult<()> {
        if capability.grants(self.scope) {
            Ok(())
        } else {
            warn!(pool = %self.id, "privileged call with foreign capability");
            Err(PoolError::Unauthorized(self.id.clone()))
        }
    }

    fn ensure_initialized(&self) -> PoolResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PoolError::NotInitialized(self.id.clone()))
        }
    }

    fn ensure_liquidity(&self) -> PoolResult<()> {
        if self.balances.iter().any(|&b| b == 0) {
            return Err(PoolError::InvalidInput(format!("pool {} has no liquidity", self.id)));
        }
        Ok(())
    }

    fn length_mismatch(&self, what: &str, got: usize) -> PoolError {
        PoolError::InvalidInput(format!(
            "{} has {} entries, pool has {} assets",
            what,
            got,
            self.assets.len()
        ))
    }
}
