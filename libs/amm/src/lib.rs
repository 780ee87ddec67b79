//! # Stablepool AMM - StableSwap Invariant Engine
//!
//! ## Purpose
//!
//! Multi-asset automated market maker for near-pegged assets (for example
//! several bridged representations of USDC). Implements the StableSwap
//! invariant solver and the pool state machine built on it: low-slippage
//! swaps, balanced and imbalanced deposits, and pro-rata withdrawals with
//! consistent fee accounting.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Swap and liquidity requests from a hosting process
//! - **Collaborators**: [`AssetCustody`] moves underlying assets,
//!   [`LiquidityLedger`] mints and burns pool shares
//! - **Configuration**: Pool definitions from `stablepool-config`
//! - **Precision**: `u128` token units, 256-bit solver intermediates,
//!   truncating integer division only
//!
//! ## Architecture Role
//!
//! ```text
//! PoolRegistry ──► Mutex<StablePool> ──► InvariantSolver (compute_d / compute_y)
//!                        │
//!                        ├──► FeeSchedule
//!                        └──► Settlement ──► AssetCustody / LiquidityLedger
//! ```
//!
//! Every pool operation is all-or-nothing: a quote is computed from the
//! current state, collaborator steps are settled (and unwound on failure),
//! and only then is the new state committed.

pub mod capability;
pub mod collaborators;
pub mod error;
pub mod fees;
pub mod invariant;
pub mod math;
pub mod memory;
pub mod pool;
pub mod receipts;
pub mod registry;
pub mod settlement;

pub use capability::AdminCapability;
pub use collaborators::{AccountId, AssetCustody, AssetId, CustodyError, LedgerError, LiquidityLedger};
pub use error::{PoolError, PoolResult};
pub use fees::FeeSchedule;
pub use invariant::{InvariantSolver, SolverError};
pub use memory::{InMemoryCustody, InMemoryLedger};
pub use pool::{PoolBuilder, PoolParameters, PoolSnapshot, StablePool};
pub use receipts::{DepositReceipt, FeeWithdrawal, SwapReceipt, WithdrawalReceipt};
pub use registry::PoolRegistry;
