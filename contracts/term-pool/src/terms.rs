//! Pool Terms
//!
//! Parameters fixed when a pool is registered, the asset pair it runs on,
//! and the deterministic pool address.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use termvault_common::{
    check,
    constants::{bps, domains},
    Address, AssetId, TermVaultError, TermVaultResult, TermsViolation, ZERO_ADDRESS,
};

/// Terms an operator registers a pool with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolTerms {
    /// Party who raises capital and posts collateral
    pub operator: Address,
    /// Pool name, unique per operator and start time
    pub name: String,
    /// Ceiling on total deposits (deposit-asset units)
    pub max_capacity: u128,
    /// Floor that must be reached by stage time
    pub min_capacity: u128,
    /// Initial deposit units per collateral unit, before decimal scaling
    pub exchange_rate: u128,
    /// Deposit window opens
    pub start_time: u64,
    /// Deposit window closes and the pool activates or reverts
    pub stage_time: u64,
    /// Term ends and settlement is due
    pub end_time: u64,
    /// Operator fee on the payout (basis points)
    pub fee_bps: u64,
    /// Term interest owed to investors (basis points)
    pub interest_rate_bps: u64,
}

impl PoolTerms {
    /// Validate the terms as the registry does before deploying a pool.
    ///
    /// The first violated condition is reported.
    pub fn validate(&self, now: u64) -> TermVaultResult<()> {
        let violation = |violation| TermVaultError::InvalidTerms { violation };

        check!(self.operator != ZERO_ADDRESS, violation(TermsViolation::ZeroOperator));
        check!(self.max_capacity > 0, violation(TermsViolation::ZeroCapacity));
        check!(now < self.start_time, violation(TermsViolation::StartTimeBeforeNow));
        check!(self.start_time < self.end_time, violation(TermsViolation::StartAfterEnd));
        check!(self.start_time < self.stage_time, violation(TermsViolation::StartAfterStage));
        check!(self.stage_time < self.end_time, violation(TermsViolation::StageAfterEnd));
        check!(self.fee_bps <= bps::MAX_FEE_BPS, violation(TermsViolation::FeeOverLimit));
        check!(self.exchange_rate > 0, violation(TermsViolation::ZeroExchangeRate));
        Ok(())
    }
}

/// Asset pair a pool runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolAssets {
    /// Stable asset investors deposit
    pub deposit_asset: AssetId,
    /// Volatile asset the operator posts
    pub collateral_asset: AssetId,
    /// `10^(collateral decimals - deposit decimals)`
    pub scale: u128,
}

/// Derive the address a pool holds its balances under
pub fn derive_pool_address(
    registry: &Address,
    operator: &Address,
    name: &str,
    start_time: u64,
) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(domains::POOL);
    hasher.update(registry);
    hasher.update(operator);
    hasher.update((name.len() as u64).to_le_bytes());
    hasher.update(name.as_bytes());
    hasher.update(start_time.to_le_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}
