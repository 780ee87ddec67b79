//! # Stablepool Centralized Configuration
//!
//! This crate provides the constants and configuration loading shared by
//! the pool engine and any process hosting it.
//!
//! ## Features
//!
//! - **Pool Limits**: Fee denominators, amplification bounds, asset counts
//! - **Solver Constants**: Newton iteration budget and convergence tolerance
//! - **Pool Configuration**: TOML pool definitions with environment overrides
//! - **Logging**: `tracing-subscriber` bootstrap driven by configuration
//!
//! ## Usage
//!
//! ```rust
//! use stablepool_config::constants::{amplification, fees};
//!
//! let max_fee = fees::MAX_SWAP_FEE_BPS;
//! let a_precision = amplification::A_PRECISION;
//! assert!(u128::from(max_fee) < fees::FEE_DENOMINATOR);
//! assert_eq!(a_precision, 100);
//! ```

pub mod constants;
pub mod logging;
pub mod pool_config;

// Re-export commonly used types
pub use logging::init_logging;
pub use pool_config::{load_config, AmmConfig, LoggingConfig, PoolSettings};
