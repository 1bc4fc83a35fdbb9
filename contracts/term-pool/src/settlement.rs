//! Settlement
//!
//! What the operator owes at term end and how it is split.
//!
//! Depositors are owed their pooled principal plus term interest, less the
//! operator fee. Re-stakers filled capacity the deposit side left open, so
//! they are owed the deposit-asset value of that capacity on the same
//! terms, shared pro-rata by collateral staked.
//!
//! A `Repaid` settlement is funded in deposit asset by `liquidate`. A
//! `Forfeited` settlement is a snapshot of the pool's balances when the
//! grace deadline passed unpaid; claimants split both balances pro-rata by
//! entitlement.
//!
//! Entitlements are rounded down one account at a time, so their sum
//! (`total_weight`) can sit a few units below the obligation. Shares and
//! outstanding amounts are measured against `total_weight`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use termvault_common::{
    math::{apply_yield, deposit_value, mul_div_ceil, pro_rata, safe_add, safe_sub},
    TermVaultResult,
};

/// How the settlement is paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum SettlementKind {
    /// Operator funded the obligation in deposit asset
    Repaid,
    /// Operator defaulted; pool balances at the snapshot are shared out
    Forfeited {
        deposit_balance: u128,
        collateral_balance: u128,
    },
}

/// Pool exposure at the moment of settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    /// Principal still pooled (`funded - exited`)
    pub principal: u128,
    /// Capacity not occupied by pooled principal (`max - funded + exited`)
    pub uncovered: u128,
    /// Collateral re-staked by third parties
    pub restaked: u128,
}

/// Frozen settlement figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Settlement {
    pub kind: SettlementKind,
    /// Owed to depositors in aggregate
    pub depositor_due: u128,
    /// Deposit-asset value of the re-staked collateral, capped at uncovered capacity
    pub restake_value: u128,
    /// Owed to re-stakers in aggregate
    pub restake_due: u128,
    /// Total collateral re-staked when the settlement was assessed
    pub restaked: u128,
    /// Sum of every participant's entitlement
    pub total_weight: u128,
}

impl Settlement {
    /// Assess the settlement for `exposure` at `exchange_rate`
    pub fn assess(
        kind: SettlementKind,
        exposure: &Exposure,
        exchange_rate: u128,
        scale: u128,
        interest_rate_bps: u64,
        fee_bps: u64,
    ) -> TermVaultResult<Self> {
        let depositor_due = apply_yield(exposure.principal, interest_rate_bps, fee_bps)?;
        let restake_value =
            deposit_value(exposure.restaked, exchange_rate, scale)?.min(exposure.uncovered);
        let restake_due = apply_yield(restake_value, interest_rate_bps, fee_bps)?;

        Ok(Self {
            kind,
            depositor_due,
            restake_value,
            restake_due,
            restaked: exposure.restaked,
            total_weight: safe_add(depositor_due, restake_due)?,
        })
    }

    /// Replace the aggregate weight with the exact sum of entitlements
    pub fn with_total_weight(mut self, total_weight: u128) -> Self {
        self.total_weight = total_weight;
        self
    }

    /// Total owed to participants, in deposit-asset units
    pub fn obligation(&self) -> TermVaultResult<u128> {
        safe_add(self.depositor_due, self.restake_due)
    }

    /// Entitlement of one participant, in deposit-asset units.
    ///
    /// Each part is rounded down separately so the sum over participants
    /// never exceeds [`Settlement::obligation`].
    pub fn entitlement(
        &self,
        pooled: u128,
        restake: u128,
        interest_rate_bps: u64,
        fee_bps: u64,
    ) -> TermVaultResult<u128> {
        let deposit_part = apply_yield(pooled, interest_rate_bps, fee_bps)?;
        let restake_part = pro_rata(self.restake_due, restake, self.restaked)?;
        safe_add(deposit_part, restake_part)
    }

    /// Split an entitlement into (deposit asset, collateral) amounts
    pub fn payout(&self, entitlement: u128) -> TermVaultResult<(u128, u128)> {
        match self.kind {
            SettlementKind::Repaid => Ok((entitlement, 0)),
            SettlementKind::Forfeited {
                deposit_balance,
                collateral_balance,
            } => Ok((
                pro_rata(deposit_balance, entitlement, self.total_weight)?,
                pro_rata(collateral_balance, entitlement, self.total_weight)?,
            )),
        }
    }

    /// (deposit asset, collateral) still owed to participants who have not
    /// claimed yet, rounded up
    pub fn outstanding(&self, claimed_weight: u128) -> TermVaultResult<(u128, u128)> {
        let unclaimed = safe_sub(self.total_weight, claimed_weight)?;
        match self.kind {
            SettlementKind::Repaid => Ok((unclaimed, 0)),
            SettlementKind::Forfeited {
                deposit_balance,
                collateral_balance,
            } => {
                if self.total_weight == 0 {
                    return Ok((0, 0));
                }
                Ok((
                    mul_div_ceil(deposit_balance, unclaimed, self.total_weight)?,
                    mul_div_ceil(collateral_balance, unclaimed, self.total_weight)?,
                ))
            }
        }
    }
}
