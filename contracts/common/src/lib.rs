//! TermVault Common Library
//!
//! Shared types, constants, and utilities for all TermVault contracts.
//!
//! TermVault runs time-boxed capital pools: an operator raises a stable
//! deposit asset from investors for a fixed term and posts a volatile
//! collateral asset, sized by an oracle exchange rate, to guarantee
//! repayment. This crate holds everything the pool, registry and vesting
//! contracts agree on:
//!
//! - **Errors**: [`TermVaultError`] with stable error codes
//! - **Events**: typed [`TermVaultEvent`]s collected per call in an [`EventLog`]
//! - **Math**: checked u128 arithmetic, collateral sizing and yield
//! - **Ledger**: the [`AssetLedger`] interface and an in-memory implementation
//! - **Constants**: basis points, decimals, settlement grace per network
//!
//! This crate is `no_std` compatible for WASM compilation when built
//! without the default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};
#[cfg(feature = "std")]
pub use std::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};

pub mod constants;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod math;
pub mod types;
pub mod validation;

pub use errors::{ScheduleViolation, TermVaultError, TermVaultResult, TermsViolation};
pub use events::{EventLog, EventType, TermVaultEvent};
pub use ledger::{AssetBook, AssetLedger, TokenLedger};
pub use types::{Address, AssetId, CallContext, PoolState, ZERO_ADDRESS};
