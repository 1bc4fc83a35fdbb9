//! Mathematical Utilities for TermVault
//!
//! Checked u128 arithmetic and the conversions between deposit-asset units
//! and collateral units. Collateral owed *to* the pool rounds up, collateral
//! paid *out* of the pool rounds down.

use crate::constants::{assets, bps};
use crate::errors::{TermVaultError, TermVaultResult};

// ============ Safe Arithmetic ============

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> TermVaultResult<u128> {
    a.checked_add(b).ok_or(TermVaultError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> TermVaultResult<u128> {
    a.checked_sub(b).ok_or(TermVaultError::Underflow)
}

/// Safe multiplication with overflow check
pub fn safe_mul(a: u128, b: u128) -> TermVaultResult<u128> {
    a.checked_mul(b).ok_or(TermVaultError::Overflow)
}

/// `floor(a * b / d)`
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> TermVaultResult<u128> {
    safe_mul(a, b)?
        .checked_div(d)
        .ok_or(TermVaultError::DivisionByZero)
}

/// `ceil(a * b / d)`
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> TermVaultResult<u128> {
    if d == 0 {
        return Err(TermVaultError::DivisionByZero);
    }
    let product = safe_mul(a, b)?;
    let quotient = product / d;
    if product % d == 0 {
        Ok(quotient)
    } else {
        safe_add(quotient, 1)
    }
}

// ============ Unit Conversions ============

/// `10^(collateral_decimals - deposit_decimals)`, the factor that turns one
/// deposit-asset base unit into collateral base units at a rate of 1.
pub fn decimal_scale(deposit_decimals: u8, collateral_decimals: u8) -> TermVaultResult<u128> {
    let gap = collateral_decimals
        .checked_sub(deposit_decimals)
        .ok_or(TermVaultError::InvalidInput {
            param: "collateral_decimals",
            reason: "below deposit decimals",
        })?;
    if gap > assets::MAX_DECIMAL_GAP {
        return Err(TermVaultError::InvalidInput {
            param: "collateral_decimals",
            reason: "decimal gap too large",
        });
    }
    10u128.checked_pow(gap as u32).ok_or(TermVaultError::Overflow)
}

/// Collateral needed to back `amount` deposit units, rounded up.
///
/// `ceil(amount * scale / rate)`
pub fn collateral_to_back(amount: u128, scale: u128, rate: u128) -> TermVaultResult<u128> {
    mul_div_ceil(amount, scale, rate)
}

/// Collateral paid out for `amount` deposit units, rounded down.
///
/// `floor(amount * scale / rate)`
pub fn collateral_payout(amount: u128, scale: u128, rate: u128) -> TermVaultResult<u128> {
    mul_div_floor(amount, scale, rate)
}

/// Deposit-asset value of `collateral`, rounded down.
///
/// `floor(collateral * rate / scale)`
pub fn deposit_value(collateral: u128, rate: u128, scale: u128) -> TermVaultResult<u128> {
    mul_div_floor(collateral, rate, scale)
}

// ============ Yield ============

/// `(10000 + interest_bps) * (10000 - fee_bps)`
///
/// Gross term interest with the operator fee taken off; divide by
/// [`bps::YIELD_DENOMINATOR`].
pub fn yield_factor(interest_rate_bps: u64, fee_bps: u64) -> TermVaultResult<u128> {
    let gross = (bps::DENOMINATOR as u128)
        .checked_add(interest_rate_bps as u128)
        .ok_or(TermVaultError::Overflow)?;
    let net = (bps::DENOMINATOR as u128)
        .checked_sub(fee_bps as u128)
        .ok_or(TermVaultError::Underflow)?;
    safe_mul(gross, net)
}

/// Net payout owed on `principal` at term end, rounded down.
///
/// Example: 70_000 units at 10% interest and 1.5% fee pay 75_845 units.
pub fn apply_yield(principal: u128, interest_rate_bps: u64, fee_bps: u64) -> TermVaultResult<u128> {
    let factor = yield_factor(interest_rate_bps, fee_bps)?;
    mul_div_floor(principal, factor, bps::YIELD_DENOMINATOR)
}

/// `floor(total * part / whole)`, zero when `whole` is zero
pub fn pro_rata(total: u128, part: u128, whole: u128) -> TermVaultResult<u128> {
    if whole == 0 {
        return Ok(0);
    }
    mul_div_floor(total, part, whole)
}
