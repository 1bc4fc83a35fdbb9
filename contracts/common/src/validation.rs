//! Validation Helpers for TermVault
//!
//! Reusable guard macro and helpers shared by the contracts.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use termvault_common::check;
//!
//! check!(amount > 0, TermVaultError::ZeroAmount);
//! ```

use crate::{
    errors::{TermVaultError, TermVaultResult},
    types::{Address, ZERO_ADDRESS},
};

// ============ Validation Macro ============

/// Return `Err($error)` from the enclosing function unless `$condition` holds.
///
/// ```rust,ignore
/// check!(
///     pooled >= amount,
///     TermVaultError::InsufficientDeposit { available: pooled, requested: amount }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use crate::check;

// ============ Common Validations ============

/// Validate that an amount is positive (non-zero)
pub fn require_positive(amount: u128) -> TermVaultResult<()> {
    check!(amount > 0, TermVaultError::ZeroAmount);
    Ok(())
}

/// Validate that an address is not the zero address
pub fn require_nonzero_address(address: &Address, param: &'static str) -> TermVaultResult<()> {
    check!(
        *address != ZERO_ADDRESS,
        TermVaultError::InvalidInput {
            param,
            reason: "zero address",
        }
    );
    Ok(())
}

/// Validate the pool operator
pub fn require_operator(operator: &Address, caller: &Address) -> TermVaultResult<()> {
    check!(
        operator == caller,
        TermVaultError::NotOperator {
            expected: *operator,
            actual: *caller,
        }
    );
    Ok(())
}
