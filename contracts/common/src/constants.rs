//! Protocol Constants
//!
//! Fixed parameters shared by the pool, registry and vesting contracts.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (one day settlement grace)
//! - Default (no feature) - Testnet values (one hour settlement grace)
//!
//! ```toml
//! # For mainnet deployment:
//! termvault-common = { path = "...", features = ["mainnet"] }
//! ```

/// Basis point arithmetic
pub mod bps {
    /// Basis points denominator (10000 = 100%)
    pub const DENOMINATOR: u64 = 10_000;

    /// Upper bound for the operator fee
    pub const MAX_FEE_BPS: u64 = DENOMINATOR;

    /// Denominator of a yield factor: (DENOMINATOR + interest) * (DENOMINATOR - fee)
    pub const YIELD_DENOMINATOR: u128 = (DENOMINATOR as u128) * (DENOMINATOR as u128);
}

/// Reference asset configuration
pub mod assets {
    /// Decimals of the reference deposit asset (USD stablecoin)
    pub const DEPOSIT_DECIMALS: u8 = 6;

    /// Decimals of the reference collateral asset
    pub const COLLATERAL_DECIMALS: u8 = 18;

    /// Largest supported decimal gap between collateral and deposit asset
    pub const MAX_DECIMAL_GAP: u8 = 30;
}

/// Time configuration (seconds)
pub mod time {
    /// One minute
    pub const MINUTE: u64 = 60;

    /// One hour
    pub const HOUR: u64 = 60 * MINUTE;

    /// One day
    pub const DAY: u64 = 24 * HOUR;

    /// Window after `end_time` during which the operator may still settle.
    /// Mainnet: one day to fund the settlement.
    #[cfg(feature = "mainnet")]
    pub const SETTLEMENT_GRACE_SECS: u64 = DAY;

    /// Testnet: one hour so lifecycle tests stay short.
    #[cfg(not(feature = "mainnet"))]
    pub const SETTLEMENT_GRACE_SECS: u64 = HOUR;
}

/// Domain separators for derived addresses
pub mod domains {
    /// Prefix hashed into every pool address
    pub const POOL: &[u8] = b"termvault.pool";

    /// Prefix hashed into every vesting schedule address
    pub const VESTING: &[u8] = b"termvault.vesting";
}
