//! Asset Ledger
//!
//! Fungible-asset balances and allowances. Contracts never create or
//! destroy balances; they only move them with [`AssetLedger::transfer`]
//! (out of an account the contract controls) and
//! [`AssetLedger::transfer_from`] (out of a participant's account, bounded
//! by the allowance the participant granted).
//!
//! [`TokenLedger`] is the in-memory ledger used by the reference
//! deployment and the test suites. [`AssetBook`] groups ledgers by asset id
//! so a contract can reach any asset it holds.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{TermVaultError, TermVaultResult};
use crate::types::{Address, AssetId};
use crate::{BTreeMap, String};

// ============================================================================
// Ledger Interface
// ============================================================================

/// Interface the contracts use to move a single fungible asset.
pub trait AssetLedger {
    /// Identifier of the asset this ledger tracks
    fn asset_id(&self) -> AssetId;

    /// Decimal places of the asset
    fn decimals(&self) -> u8;

    /// Balance held by `account`
    fn balance_of(&self, account: &Address) -> u128;

    /// Amount `spender` may still move out of `owner`
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Move `amount` from `from` to `to`
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> TermVaultResult<()>;

    /// Move `amount` from `owner` to `to` on behalf of `spender`
    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> TermVaultResult<()>;
}

// ============================================================================
// In-memory Ledger
// ============================================================================

/// Balances and allowances of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenLedger {
    asset_id: AssetId,
    symbol: String,
    decimals: u8,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
}

impl TokenLedger {
    /// Create an empty ledger
    pub fn new(asset_id: AssetId, symbol: &str, decimals: u8) -> Self {
        Self {
            asset_id,
            symbol: String::from(symbol),
            decimals,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// Ticker symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Total units in circulation
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Credit new units to `to`. Used to seed balances at genesis.
    pub fn mint(&mut self, to: &Address, amount: u128) -> TermVaultResult<()> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TermVaultError::Overflow)?;
        let balance = self.balance_of(to);
        let new_balance = balance.checked_add(amount).ok_or(TermVaultError::Overflow)?;

        self.total_supply = new_supply;
        self.balances.insert(*to, new_balance);
        Ok(())
    }

    /// Set the amount `spender` may move out of `owner`.
    ///
    /// `u128::MAX` is an unlimited allowance and is never decremented.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
    }

    fn debit(&mut self, from: &Address, amount: u128) -> TermVaultResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TermVaultError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: u128) -> TermVaultResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balance_of(to);
        let new_balance = balance.checked_add(amount).ok_or(TermVaultError::Overflow)?;
        self.balances.insert(*to, new_balance);
        Ok(())
    }
}

impl AssetLedger for TokenLedger {
    fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> TermVaultResult<()> {
        if from == to {
            let available = self.balance_of(from);
            if available < amount {
                return Err(TermVaultError::InsufficientBalance {
                    available,
                    requested: amount,
                });
            }
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> TermVaultResult<()> {
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(TermVaultError::InsufficientAllowance {
                available: allowed,
                requested: amount,
            });
        }

        self.transfer(owner, to, amount)?;

        if allowed != u128::MAX {
            self.approve(owner, spender, allowed - amount);
        }
        Ok(())
    }
}

// ============================================================================
// Asset Book
// ============================================================================

/// Ledgers keyed by asset id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBook<L = TokenLedger> {
    ledgers: BTreeMap<AssetId, L>,
}

impl<L: AssetLedger> Default for AssetBook<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: AssetLedger> AssetBook<L> {
    /// Create an empty book
    pub fn new() -> Self {
        Self {
            ledgers: BTreeMap::new(),
        }
    }

    /// Add a ledger, replacing any ledger for the same asset
    pub fn register(&mut self, ledger: L) -> Option<L> {
        self.ledgers.insert(ledger.asset_id(), ledger)
    }

    /// Ledger for `asset`
    pub fn ledger(&self, asset: &AssetId) -> TermVaultResult<&L> {
        self.ledgers
            .get(asset)
            .ok_or(TermVaultError::UnknownAsset { asset: *asset })
    }

    /// Mutable ledger for `asset`
    pub fn ledger_mut(&mut self, asset: &AssetId) -> TermVaultResult<&mut L> {
        self.ledgers
            .get_mut(asset)
            .ok_or(TermVaultError::UnknownAsset { asset: *asset })
    }

    /// Balance of `account` in `asset`
    pub fn balance_of(&self, asset: &AssetId, account: &Address) -> TermVaultResult<u128> {
        Ok(self.ledger(asset)?.balance_of(account))
    }

    /// Push `amount` of `asset` from `from` to `to`
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> TermVaultResult<()> {
        self.ledger_mut(asset)?.transfer(from, to, amount)
    }

    /// Pull `amount` of `asset` from `owner` into `to`; `to` is the spender
    pub fn pull(
        &mut self,
        asset: &AssetId,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> TermVaultResult<()> {
        self.ledger_mut(asset)?.transfer_from(to, owner, to, amount)
    }
}
