//! TermVault Investor Pool
//!
//! A time-boxed capital pool guaranteed by oracle-sized collateral.
//!
//! An operator raises a stable deposit asset from investors between
//! `start_time` and `stage_time`, having posted enough volatile collateral
//! to cover the full capacity at the agreed exchange rate. Once the pool
//! activates, investors may exit early by redeeming principal for
//! collateral, and third parties may re-stake collateral into the capacity
//! investors left open. At term end the operator either funds the
//! settlement (principal plus interest, less fee) or forfeits the
//! collateral to participants.
//!
//! ## Units
//!
//! - Deposit amounts are in deposit-asset base units
//! - Collateral amounts are in collateral-asset base units
//! - `scale = 10^(collateral decimals - deposit decimals)`
//! - `collateral = amount * scale / exchange_rate`
//!
//! ## Modules
//!
//! - [`pool`]: the [`InvestorPool`] state machine and all its operations
//! - [`settlement`]: obligation and entitlement math
//! - [`terms`]: [`PoolTerms`], the asset pair and pool addresses

pub mod pool;
pub mod settlement;
pub mod terms;

pub use pool::InvestorPool;
pub use settlement::{Exposure, Settlement, SettlementKind};
pub use terms::{derive_pool_address, PoolAssets, PoolTerms};
