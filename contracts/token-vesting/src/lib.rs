//! TermVault Token Vesting
//!
//! Linear release of a fixed token amount to a single recipient between
//! `vesting_begin` and `vesting_end`, with nothing claimable before the
//! cliff. The schedule holds the tokens under its own address; it must be
//! funded with the full amount before claims can succeed.
//!
//! Vested at `now` (before end): `total * (now - begin) / (end - begin)`,
//! rounded down. From `vesting_end` on, the whole amount is vested.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use termvault_common::{
    check,
    constants::domains,
    math::{mul_div_floor, safe_add, safe_sub},
    Address, AssetBook, AssetId, AssetLedger, CallContext, ScheduleViolation, TermVaultError,
    TermVaultEvent, TermVaultResult,
};

/// A single-recipient vesting schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct VestingSchedule {
    address: Address,
    asset: AssetId,
    recipient: Address,
    total_amount: u128,
    vesting_begin: u64,
    vesting_cliff: u64,
    vesting_end: u64,
    released: u128,
}

impl VestingSchedule {
    /// Create a schedule. Fails unless `now <= begin <= cliff < end`.
    pub fn new(
        ctx: &CallContext,
        asset: AssetId,
        recipient: Address,
        total_amount: u128,
        vesting_begin: u64,
        vesting_cliff: u64,
        vesting_end: u64,
    ) -> TermVaultResult<Self> {
        let invalid = |violation| TermVaultError::InvalidSchedule { violation };
        check!(vesting_begin >= ctx.now, invalid(ScheduleViolation::StartTooEarly));
        check!(vesting_cliff >= vesting_begin, invalid(ScheduleViolation::CliffTooEarly));
        check!(vesting_end > vesting_cliff, invalid(ScheduleViolation::EndTooEarly));

        let address = derive_schedule_address(&asset, &recipient, total_amount, vesting_begin, vesting_end);
        Ok(Self {
            address,
            asset,
            recipient,
            total_amount,
            vesting_begin,
            vesting_cliff,
            vesting_end,
            released: 0,
        })
    }

    /// Account the schedule holds its tokens under
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn total_amount(&self) -> u128 {
        self.total_amount
    }

    pub fn released(&self) -> u128 {
        self.released
    }

    /// Amount vested at `now`, released or not
    pub fn vested_amount(&self, now: u64) -> TermVaultResult<u128> {
        if now < self.vesting_begin {
            return Ok(0);
        }
        if now >= self.vesting_end {
            return Ok(self.total_amount);
        }
        let elapsed = (now - self.vesting_begin) as u128;
        let duration = (self.vesting_end - self.vesting_begin) as u128;
        mul_div_floor(self.total_amount, elapsed, duration)
    }

    /// Amount a claim at `now` would release
    pub fn releasable(&self, now: u64) -> TermVaultResult<u128> {
        if now < self.vesting_cliff {
            return Ok(0);
        }
        safe_sub(self.vested_amount(now)?, self.released)
    }

    /// Release everything vested so far to the recipient. Anyone may trigger
    /// it; tokens always go to the current recipient.
    pub fn claim<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<u128> {
        check!(
            ctx.now >= self.vesting_cliff,
            TermVaultError::VestingNotStarted { now: ctx.now, cliff: self.vesting_cliff }
        );

        let amount = self.releasable(ctx.now)?;
        let new_released = safe_add(self.released, amount)?;
        book.transfer(&self.asset, &self.address, &self.recipient, amount)?;

        self.released = new_released;
        ctx.emit(TermVaultEvent::VestingReleased {
            schedule: self.address,
            recipient: self.recipient,
            amount,
            total_released: new_released,
            timestamp: ctx.now,
        });
        Ok(amount)
    }

    /// Current recipient hands the schedule to `new_recipient`
    pub fn set_recipient(&mut self, ctx: &mut CallContext, new_recipient: Address) -> TermVaultResult<()> {
        check!(
            ctx.caller == self.recipient,
            TermVaultError::NotRecipient { expected: self.recipient, actual: ctx.caller }
        );

        let old_recipient = self.recipient;
        self.recipient = new_recipient;
        ctx.emit(TermVaultEvent::RecipientChanged {
            schedule: self.address,
            old_recipient,
            new_recipient,
            timestamp: ctx.now,
        });
        Ok(())
    }
}

/// Derive the address a schedule holds its tokens under
pub fn derive_schedule_address(
    asset: &AssetId,
    recipient: &Address,
    total_amount: u128,
    vesting_begin: u64,
    vesting_end: u64,
) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(domains::VESTING);
    hasher.update(asset);
    hasher.update(recipient);
    hasher.update(total_amount.to_le_bytes());
    hasher.update(vesting_begin.to_le_bytes());
    hasher.update(vesting_end.to_le_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

// ============ Tests ============
