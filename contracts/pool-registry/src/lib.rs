//! TermVault Pool Registry
//!
//! Validates pool terms, deploys pools, and keeps the ordered list of every
//! pool created. All pools of a registry share one deposit asset and one
//! collateral asset; the decimal scale between them is fixed when the
//! registry is constructed.
//!
//! Pools are addressed by `derive_pool_address(registry, operator, name,
//! start_time)`, so the (operator, name, start time) triple is unique per
//! registry and can be looked up without a scan.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use termvault_common::{
    check,
    math::decimal_scale,
    validation::require_nonzero_address,
    Address, AssetBook, AssetId, AssetLedger, BTreeMap, CallContext, TermVaultError,
    TermVaultEvent, TermVaultResult,
};
use termvault_pool::{derive_pool_address, InvestorPool, PoolAssets, PoolTerms};

/// Pool factory and directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolRegistry {
    address: Address,
    owner: Address,
    assets: PoolAssets,
    pools: Vec<InvestorPool>,
    /// Pool address to position in `pools`
    index: BTreeMap<Address, u64>,
}

impl PoolRegistry {
    /// Create a registry for the given asset pair. Decimals are read from the
    /// asset ledgers.
    pub fn new<L: AssetLedger>(
        address: Address,
        owner: Address,
        book: &AssetBook<L>,
        deposit_asset: AssetId,
        collateral_asset: AssetId,
    ) -> TermVaultResult<Self> {
        require_nonzero_address(&owner, "owner")?;
        check!(
            deposit_asset != collateral_asset,
            TermVaultError::InvalidInput {
                param: "collateral_asset",
                reason: "same as deposit asset",
            }
        );

        let scale = decimal_scale(
            book.ledger(&deposit_asset)?.decimals(),
            book.ledger(&collateral_asset)?.decimals(),
        )?;

        Ok(Self {
            address,
            owner,
            assets: PoolAssets {
                deposit_asset,
                collateral_asset,
                scale,
            },
            pools: Vec::new(),
            index: BTreeMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn assets(&self) -> &PoolAssets {
        &self.assets
    }

    /// Validate `terms` and deploy a pool in the `Created` state
    pub fn create_pool(&mut self, ctx: &mut CallContext, terms: PoolTerms) -> TermVaultResult<Address> {
        // 1. Only the owner
        check!(
            ctx.caller == self.owner,
            TermVaultError::NotOwner { expected: self.owner, actual: ctx.caller }
        );

        // 2. Terms must be consistent
        terms.validate(ctx.now)?;

        // 3. Operator, name and start time must be new
        let pool = derive_pool_address(&self.address, &terms.operator, &terms.name, terms.start_time);
        check!(!self.index.contains_key(&pool), TermVaultError::PoolExists { pool });

        let operator = terms.operator;
        let start_time = terms.start_time;
        self.index.insert(pool, self.pools.len() as u64);
        self.pools.push(InvestorPool::new(pool, terms, self.assets));

        ctx.emit(TermVaultEvent::PoolCreated {
            registry: self.address,
            pool,
            operator,
            start_time,
            timestamp: ctx.now,
        });
        Ok(pool)
    }

    /// Hand the registry to a new owner
    pub fn set_owner(&mut self, ctx: &mut CallContext, new_owner: Address) -> TermVaultResult<()> {
        check!(
            ctx.caller == self.owner,
            TermVaultError::NotOwner { expected: self.owner, actual: ctx.caller }
        );
        require_nonzero_address(&new_owner, "new_owner")?;

        let old_owner = self.owner;
        self.owner = new_owner;
        ctx.emit(TermVaultEvent::OwnerChanged {
            registry: self.address,
            old_owner,
            new_owner,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Address of the pool created `index`-th
    pub fn pool_list(&self, index: usize) -> Option<Address> {
        self.pools.get(index).map(InvestorPool::address)
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Address of the pool registered under (operator, name, start time)
    pub fn get_pool(&self, operator: &Address, name: &str, start_time: u64) -> Option<Address> {
        let pool = derive_pool_address(&self.address, operator, name, start_time);
        self.index.contains_key(&pool).then_some(pool)
    }

    pub fn pool(&self, address: &Address) -> Option<&InvestorPool> {
        self.index
            .get(address)
            .and_then(|i| self.pools.get(*i as usize))
    }

    pub fn pool_mut(&mut self, address: &Address) -> Option<&mut InvestorPool> {
        let i = *self.index.get(address)?;
        self.pools.get_mut(i as usize)
    }

    /// All pools in creation order
    pub fn pools(&self) -> impl Iterator<Item = &InvestorPool> {
        self.pools.iter()
    }
}

#[cfg(test)]
mod integration_tests;
