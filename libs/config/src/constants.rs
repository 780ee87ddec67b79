//! Pool limits and solver constants
//!
//! Every bound the pool enforces lives here so that configuration
//! validation and the pool engine agree on the same numbers.

/// Fee constants (basis points)
pub mod fees {
    /// Denominator for all basis-point fee rates
    pub const FEE_DENOMINATOR: u128 = 10_000;

    /// Maximum swap fee (1%)
    pub const MAX_SWAP_FEE_BPS: u32 = 100;

    /// Maximum admin share of the swap fee (100%)
    pub const MAX_ADMIN_FEE_BPS: u32 = FEE_DENOMINATOR as u32;
}

/// Amplification coefficient bounds
pub mod amplification {
    /// Scaling factor applied to A (2000 means A = 20)
    pub const A_PRECISION: u128 = 100;

    /// Largest unscaled A
    pub const MAX_A: u128 = 1_000_000;

    /// Smallest scaled amplification (A = 1)
    pub const MIN_AMPLIFICATION: u128 = A_PRECISION;

    /// Largest scaled amplification
    pub const MAX_AMPLIFICATION: u128 = MAX_A * A_PRECISION;
}

/// Newton iteration settings shared by the D and Y solvers
pub mod solver {
    /// Iteration budget for each solve
    pub const MAX_ITERATIONS: usize = 255;

    /// Two successive iterates within this many units are converged
    pub const CONVERGENCE_TOLERANCE: u128 = 1;
}

/// Pool shape limits
pub mod pool {
    /// Minimum number of assets in a pool
    pub const MIN_ASSETS: usize = 2;

    /// Maximum number of assets in a pool
    pub const MAX_ASSETS: usize = 8;

    /// Scale used by the virtual price (18 decimals)
    pub const VIRTUAL_PRICE_SCALE: u128 = 1_000_000_000_000_000_000;
}
