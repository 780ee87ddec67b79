//! Pool operation errors
//!
//! Every variant is local to the operation that returned it: the pool
//! commits nothing on error and stays usable afterwards.

use crate::collaborators::{CustodyError, LedgerError};
use crate::invariant::SolverError;
use crate::math::MathError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slippage exceeded: {0}")]
    SlippageExceeded(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Parameter out of range: {0}")]
    ParameterOutOfRange(String),

    #[error("Pool {0} is not initialized")]
    NotInitialized(String),

    #[error("Pool {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("Custody transfer failed: {0}")]
    CustodyTransferFailed(String),

    #[error("Capability does not grant access to pool {0}")]
    Unauthorized(String),

    #[error("Pool {0} not found")]
    PoolNotFound(String),

    #[error("Pool {0} already exists")]
    DuplicatePool(String),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<MathError> for PoolError {
    fn from(err: MathError) -> Self {
        PoolError::Solver(SolverError::Math(err))
    }
}

impl From<CustodyError> for PoolError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::InsufficientFunds { .. } => PoolError::InsufficientBalance(err.to_string()),
            other => PoolError::CustodyTransferFailed(other.to_string()),
        }
    }
}

impl From<LedgerError> for PoolError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientShares { .. } => PoolError::InsufficientBalance(err.to_string()),
            other => PoolError::Ledger(other),
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
