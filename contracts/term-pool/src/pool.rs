//! Investor Pool
//!
//! The pool state machine. Lifecycle:
//!
//! ```text
//! Created --open_pool--> Opened --stage_time, funded >= min--> Active
//!    |                     |  \--stage_time, funded < min--> Reverted
//!    \--revert_pool--------+--revert_pool------------------> Reverted
//! Active --liquidate, end_time--> Liquidated --close_pool--> Closed
//! Active --end_time + grace-----> Dishonored --close_pool--> Closed
//! ```
//!
//! The state is never stored. It is derived from flags and the caller's
//! timestamp by [`InvestorPool::current_state`], so a time-driven transition
//! is visible to the first call after its deadline. Side effects of a
//! derived transition (the collateral refund on revert, the balance
//! snapshot on dishonor) are applied by the first state-changing call that
//! needs them, or by anyone through [`InvestorPool::update`].
//!
//! Every operation checks all guards and computes all amounts before its
//! first ledger movement, and performs at most one fallible pull, before
//! any field is written.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use termvault_common::{
    check,
    constants::time,
    math::{apply_yield, collateral_payout, collateral_to_back, deposit_value, safe_add, safe_sub},
    validation::{require_operator, require_positive},
    Address, AssetBook, AssetId, AssetLedger, BTreeMap, BTreeSet, CallContext, PoolState,
    TermVaultError, TermVaultEvent, TermVaultResult,
};

use crate::settlement::{Exposure, Settlement, SettlementKind};
use crate::terms::{PoolAssets, PoolTerms};

/// A time-boxed, collateralized capital pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct InvestorPool {
    address: Address,
    terms: PoolTerms,
    assets: PoolAssets,
    /// Current oracle rate; starts at `terms.exchange_rate`
    exchange_rate: u128,
    /// Cumulative principal committed (reduced only by withdraw)
    funded: u128,
    /// Cumulative principal redeemed for collateral
    exited: u128,
    /// Collateral re-staked by third parties
    restaked: u128,
    /// Collateral held for the operator's guarantee plus re-stakes
    locked_collateral: u128,
    pooled_amt: BTreeMap<Address, u128>,
    restake_amt: BTreeMap<Address, u128>,
    claimed: BTreeSet<Address>,
    /// Sum of entitlements already claimed
    claimed_weight: u128,
    opened: bool,
    reverted: bool,
    collateral_returned: bool,
    settlement: Option<Settlement>,
}

impl InvestorPool {
    /// Create a pool in the `Created` state
    pub fn new(address: Address, terms: PoolTerms, assets: PoolAssets) -> Self {
        let exchange_rate = terms.exchange_rate;
        Self {
            address,
            terms,
            assets,
            exchange_rate,
            funded: 0,
            exited: 0,
            restaked: 0,
            locked_collateral: 0,
            pooled_amt: BTreeMap::new(),
            restake_amt: BTreeMap::new(),
            claimed: BTreeSet::new(),
            claimed_weight: 0,
            opened: false,
            reverted: false,
            collateral_returned: false,
            settlement: None,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn terms(&self) -> &PoolTerms {
        &self.terms
    }

    pub fn operator(&self) -> Address {
        self.terms.operator
    }

    pub fn assets(&self) -> &PoolAssets {
        &self.assets
    }

    pub fn exchange_rate(&self) -> u128 {
        self.exchange_rate
    }

    pub fn funded(&self) -> u128 {
        self.funded
    }

    pub fn exited(&self) -> u128 {
        self.exited
    }

    pub fn restaked(&self) -> u128 {
        self.restaked
    }

    pub fn locked_collateral(&self) -> u128 {
        self.locked_collateral
    }

    /// Principal `account` has pooled and not exited or withdrawn
    pub fn pooled_amt(&self, account: &Address) -> u128 {
        self.pooled_amt.get(account).copied().unwrap_or(0)
    }

    /// Collateral `account` has re-staked
    pub fn restake_amt(&self, account: &Address) -> u128 {
        self.restake_amt.get(account).copied().unwrap_or(0)
    }

    pub fn has_claimed(&self, account: &Address) -> bool {
        self.claimed.contains(account)
    }

    /// Obligation the operator funded through `liquidate`, if any
    pub fn liquidated_amount(&self) -> Option<u128> {
        match &self.settlement {
            Some(s) if s.kind == SettlementKind::Repaid => s.obligation().ok(),
            _ => None,
        }
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    /// Time after which an unsettled pool is dishonored
    pub fn settlement_deadline(&self) -> u64 {
        self.terms
            .end_time
            .saturating_add(time::SETTLEMENT_GRACE_SECS)
    }

    /// Lifecycle state at `now`
    pub fn current_state(&self, now: u64) -> PoolState {
        if self.reverted {
            return PoolState::Reverted;
        }
        if !self.opened {
            return PoolState::Created;
        }
        if now < self.terms.stage_time {
            return PoolState::Opened;
        }
        if self.funded < self.terms.min_capacity {
            return PoolState::Reverted;
        }
        if self.collateral_returned {
            return PoolState::Closed;
        }
        match self.settlement.as_ref().map(|s| s.kind) {
            Some(SettlementKind::Repaid) if now >= self.terms.end_time => PoolState::Liquidated,
            Some(SettlementKind::Forfeited { .. }) => PoolState::Dishonored,
            None if now >= self.settlement_deadline() => PoolState::Dishonored,
            _ => PoolState::Active,
        }
    }

    /// Collateral the operator must keep posted at `rate`.
    ///
    /// `ceil((max_capacity - exited) * scale / rate)`
    pub fn operator_requirement(&self, rate: u128) -> TermVaultResult<u128> {
        let open_capacity = safe_sub(self.terms.max_capacity, self.exited)?;
        collateral_to_back(open_capacity, self.assets.scale, rate)
    }

    /// Collateral that can still be re-staked into the uncollateralized gap
    pub fn restake_capacity(&self) -> TermVaultResult<u128> {
        let gap = collateral_payout(self.uncovered()?, self.assets.scale, self.exchange_rate)?;
        Ok(gap.saturating_sub(self.restaked))
    }

    /// Net deposit-asset revenue for re-staking `amount` collateral at the
    /// current rate and terms
    pub fn expected_restake_revenue(&self, amount: u128) -> TermVaultResult<u128> {
        let value = deposit_value(amount, self.exchange_rate, self.assets.scale)?;
        apply_yield(value, self.terms.interest_rate_bps, self.terms.fee_bps)
    }

    /// Deposit-asset entitlement of `account` at `now`; zero when the pool is
    /// not finalized or the account already claimed
    pub fn claimable(&self, account: &Address, now: u64) -> TermVaultResult<u128> {
        if !self.current_state(now).is_claimable() || self.has_claimed(account) {
            return Ok(0);
        }
        let settlement = match &self.settlement {
            Some(s) => *s,
            None => self.assess(SettlementKind::Forfeited {
                deposit_balance: 0,
                collateral_balance: 0,
            })?,
        };
        self.entitlement_of(&settlement, account)
    }

    /// Check the pool's bookkeeping adds up
    pub fn verify_accounting(&self) -> TermVaultResult<()> {
        let principal = safe_sub(self.funded, self.exited)?;
        let pooled = self
            .pooled_amt
            .values()
            .try_fold(0u128, |acc, v| safe_add(acc, *v))?;
        check!(
            pooled == principal,
            TermVaultError::ConservationViolated { expected: principal, actual: pooled }
        );

        let restaked = self
            .restake_amt
            .values()
            .try_fold(0u128, |acc, v| safe_add(acc, *v))?;
        check!(
            restaked == self.restaked,
            TermVaultError::ConservationViolated { expected: self.restaked, actual: restaked }
        );

        check!(
            self.funded <= self.terms.max_capacity,
            TermVaultError::ConservationViolated {
                expected: self.terms.max_capacity,
                actual: self.funded,
            }
        );
        Ok(())
    }

    fn uncovered(&self) -> TermVaultResult<u128> {
        safe_add(safe_sub(self.terms.max_capacity, self.funded)?, self.exited)
    }

    fn assess(&self, kind: SettlementKind) -> TermVaultResult<Settlement> {
        let exposure = Exposure {
            principal: safe_sub(self.funded, self.exited)?,
            uncovered: self.uncovered()?,
            restaked: self.restaked,
        };
        let settlement = Settlement::assess(
            kind,
            &exposure,
            self.exchange_rate,
            self.assets.scale,
            self.terms.interest_rate_bps,
            self.terms.fee_bps,
        )?;
        let total_weight = self.participants().try_fold(0u128, |acc, account| {
            safe_add(acc, self.entitlement_of(&settlement, account)?)
        })?;
        Ok(settlement.with_total_weight(total_weight))
    }

    /// Every account holding pooled principal or re-staked collateral
    fn participants(&self) -> impl Iterator<Item = &Address> + '_ {
        self.pooled_amt.keys().chain(
            self.restake_amt
                .keys()
                .filter(|account| !self.pooled_amt.contains_key(*account)),
        )
    }

    fn entitlement_of(&self, settlement: &Settlement, account: &Address) -> TermVaultResult<u128> {
        settlement.entitlement(
            self.pooled_amt(account),
            self.restake_amt(account),
            self.terms.interest_rate_bps,
            self.terms.fee_bps,
        )
    }

    /// Settlement in force, or the dishonor snapshot the pool would take now
    fn settlement_or_snapshot<L: AssetLedger>(
        &self,
        book: &AssetBook<L>,
    ) -> TermVaultResult<(Settlement, bool)> {
        if let Some(settlement) = self.settlement {
            return Ok((settlement, false));
        }
        let snapshot = self.assess(SettlementKind::Forfeited {
            deposit_balance: book.balance_of(&self.assets.deposit_asset, &self.address)?,
            collateral_balance: book.balance_of(&self.assets.collateral_asset, &self.address)?,
        })?;
        Ok((snapshot, true))
    }

    fn record_dishonor(&mut self, ctx: &mut CallContext, snapshot: Settlement) {
        if let SettlementKind::Forfeited {
            deposit_balance,
            collateral_balance,
        } = snapshot.kind
        {
            ctx.emit(TermVaultEvent::PoolDishonored {
                pool: self.address,
                deposit_balance,
                collateral_balance,
                timestamp: ctx.now,
            });
        }
        self.settlement = Some(snapshot);
    }

    fn refund_on_revert<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<()> {
        let refund = self.locked_collateral;
        if refund > 0 {
            book.transfer(
                &self.assets.collateral_asset,
                &self.address,
                &self.terms.operator,
                refund,
            )?;
        }

        self.locked_collateral = 0;
        self.reverted = true;
        ctx.emit(TermVaultEvent::PoolReverted {
            pool: self.address,
            collateral_refunded: refund,
            timestamp: ctx.now,
        });
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Apply the side effects of any pending time-driven transition and
    /// return the current state. Callable by anyone.
    pub fn update<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<PoolState> {
        let state = self.current_state(ctx.now);
        match state {
            PoolState::Reverted if !self.reverted => self.refund_on_revert(ctx, book)?,
            PoolState::Dishonored if self.settlement.is_none() => {
                let (snapshot, _) = self.settlement_or_snapshot(book)?;
                self.record_dishonor(ctx, snapshot);
            }
            _ => {}
        }
        Ok(state)
    }

    /// Operator posts collateral for the full capacity
    pub fn open_pool<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<()> {
        // 1. Only the operator
        require_operator(&self.terms.operator, &ctx.caller)?;

        // 2. Only once, from Created
        let state = self.current_state(ctx.now);
        check!(state == PoolState::Created, TermVaultError::PoolNotCreated { state });

        // 3. Pull ceil(max_capacity * scale / rate)
        let required = self.operator_requirement(self.exchange_rate)?;
        book.pull(
            &self.assets.collateral_asset,
            &self.terms.operator,
            &self.address,
            required,
        )?;

        self.opened = true;
        self.locked_collateral = required;
        ctx.emit(TermVaultEvent::PoolOpened {
            pool: self.address,
            operator: self.terms.operator,
            collateral_locked: required,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Operator cancels the pool before it activates
    pub fn revert_pool<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<()> {
        require_operator(&self.terms.operator, &ctx.caller)?;

        let state = self.current_state(ctx.now);
        check!(
            matches!(state, PoolState::Created | PoolState::Opened),
            TermVaultError::NotRevertable { state }
        );

        self.refund_on_revert(ctx, book)
    }

    // ========================================================================
    // Depositors
    // ========================================================================

    /// Commit `amount` of deposit asset during the deposit window
    pub fn deposit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        amount: u128,
    ) -> TermVaultResult<()> {
        let state = self.current_state(ctx.now);
        check!(state == PoolState::Opened, TermVaultError::PoolNotOpened { state });
        check!(
            ctx.now >= self.terms.start_time,
            TermVaultError::NotStarted { now: ctx.now, start_time: self.terms.start_time }
        );
        require_positive(amount)?;

        let available = safe_sub(self.terms.max_capacity, self.funded)?;
        check!(
            amount <= available,
            TermVaultError::DepositOverCapacity { requested: amount, available }
        );

        let new_funded = safe_add(self.funded, amount)?;
        let new_pooled = safe_add(self.pooled_amt(&ctx.caller), amount)?;
        book.pull(&self.assets.deposit_asset, &ctx.caller, &self.address, amount)?;

        self.funded = new_funded;
        self.pooled_amt.insert(ctx.caller, new_pooled);
        ctx.emit(TermVaultEvent::Deposited {
            pool: self.address,
            depositor: ctx.caller,
            amount,
            total_funded: new_funded,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Take principal back, during the deposit window or after a revert
    pub fn withdraw<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        amount: u128,
        to: Address,
    ) -> TermVaultResult<()> {
        let state = self.current_state(ctx.now);
        match state {
            PoolState::Opened => check!(
                ctx.now >= self.terms.start_time,
                TermVaultError::NotStarted { now: ctx.now, start_time: self.terms.start_time }
            ),
            PoolState::Reverted => {}
            _ => return Err(TermVaultError::PoolNotOpened { state }),
        }
        require_positive(amount)?;

        let pooled = self.pooled_amt(&ctx.caller);
        check!(
            pooled >= amount,
            TermVaultError::InsufficientDeposit { available: pooled, requested: amount }
        );
        let held = book.balance_of(&self.assets.deposit_asset, &self.address)?;
        check!(
            held >= amount,
            TermVaultError::InsufficientBalance { available: held, requested: amount }
        );

        if state == PoolState::Reverted && !self.reverted {
            self.refund_on_revert(ctx, book)?;
        }
        book.transfer(&self.assets.deposit_asset, &self.address, &to, amount)?;

        self.funded -= amount;
        self.set_pooled(ctx.caller, pooled - amount);
        ctx.emit(TermVaultEvent::Withdrawn {
            pool: self.address,
            depositor: ctx.caller,
            to,
            amount,
            total_funded: self.funded,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Redeem pooled principal for collateral at the current rate
    pub fn exit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        amount: u128,
        to: Address,
    ) -> TermVaultResult<()> {
        self.require_open_positions(ctx.now)?;
        require_positive(amount)?;

        let pooled = self.pooled_amt(&ctx.caller);
        check!(
            pooled >= amount,
            TermVaultError::InsufficientDeposit { available: pooled, requested: amount }
        );

        let collateral = collateral_payout(amount, self.assets.scale, self.exchange_rate)?;
        let new_locked = safe_sub(self.locked_collateral, collateral)?;
        let new_exited = safe_add(self.exited, amount)?;
        book.transfer(&self.assets.collateral_asset, &self.address, &to, collateral)?;

        self.exited = new_exited;
        self.locked_collateral = new_locked;
        self.set_pooled(ctx.caller, pooled - amount);
        ctx.emit(TermVaultEvent::Exited {
            pool: self.address,
            depositor: ctx.caller,
            to,
            amount,
            collateral_paid: collateral,
            timestamp: ctx.now,
        });
        Ok(())
    }

    fn set_pooled(&mut self, account: Address, amount: u128) {
        if amount == 0 {
            self.pooled_amt.remove(&account);
        } else {
            self.pooled_amt.insert(account, amount);
        }
    }

    // ========================================================================
    // Re-stakers
    // ========================================================================

    /// Post collateral into the gap left by unfilled or exited capacity
    pub fn restake<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        amount: u128,
    ) -> TermVaultResult<()> {
        self.require_open_positions(ctx.now)?;
        require_positive(amount)?;

        let available = self.restake_capacity()?;
        check!(
            amount <= available,
            TermVaultError::NoRestakeCapacity { available, requested: amount }
        );

        let new_restaked = safe_add(self.restaked, amount)?;
        let new_stake = safe_add(self.restake_amt(&ctx.caller), amount)?;
        let new_locked = safe_add(self.locked_collateral, amount)?;
        book.pull(&self.assets.collateral_asset, &ctx.caller, &self.address, amount)?;

        self.restaked = new_restaked;
        self.locked_collateral = new_locked;
        self.restake_amt.insert(ctx.caller, new_stake);
        ctx.emit(TermVaultEvent::Restaked {
            pool: self.address,
            staker: ctx.caller,
            amount,
            total_restaked: new_restaked,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Withdraw re-staked collateral
    pub fn unstake<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        amount: u128,
        to: Address,
    ) -> TermVaultResult<()> {
        self.require_open_positions(ctx.now)?;
        require_positive(amount)?;

        let staked = self.restake_amt(&ctx.caller);
        check!(
            staked >= amount,
            TermVaultError::InsufficientRestake { available: staked, requested: amount }
        );
        let new_locked = safe_sub(self.locked_collateral, amount)?;
        book.transfer(&self.assets.collateral_asset, &self.address, &to, amount)?;

        self.restaked -= amount;
        self.locked_collateral = new_locked;
        if staked == amount {
            self.restake_amt.remove(&ctx.caller);
        } else {
            self.restake_amt.insert(ctx.caller, staked - amount);
        }
        ctx.emit(TermVaultEvent::Unstaked {
            pool: self.address,
            staker: ctx.caller,
            to,
            amount,
            total_restaked: self.restaked,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Positions can move only while Active and before settlement is funded
    fn require_open_positions(&self, now: u64) -> TermVaultResult<()> {
        let state = self.current_state(now);
        check!(state == PoolState::Active, TermVaultError::PoolNotActive { state });
        check!(self.settlement.is_none(), TermVaultError::SettlementLocked);
        Ok(())
    }

    // ========================================================================
    // Operator
    // ========================================================================

    /// Operator takes the pooled deposit asset to deploy it
    pub fn pull_deposit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<()> {
        require_operator(&self.terms.operator, &ctx.caller)?;
        self.require_open_positions(ctx.now)?;

        let amount = book.balance_of(&self.assets.deposit_asset, &self.address)?;
        book.transfer(
            &self.assets.deposit_asset,
            &self.address,
            &self.terms.operator,
            amount,
        )?;

        ctx.emit(TermVaultEvent::DepositPulled {
            pool: self.address,
            operator: self.terms.operator,
            amount,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Operator funds the settlement. Pulls only the shortfall between the
    /// obligation and the deposit asset the pool already holds, and sends
    /// anything held beyond the obligation back to the operator, so a repeat
    /// call once funded moves nothing.
    pub fn liquidate<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<()> {
        require_operator(&self.terms.operator, &ctx.caller)?;
        let state = self.current_state(ctx.now);
        check!(state == PoolState::Active, TermVaultError::PoolNotActive { state });

        let settlement = match self.settlement {
            Some(existing) => existing,
            None => self.assess(SettlementKind::Repaid)?,
        };
        let obligation = settlement.obligation()?;
        let held = book.balance_of(&self.assets.deposit_asset, &self.address)?;
        let shortfall = obligation.saturating_sub(held);
        let surplus = held.saturating_sub(obligation);
        if shortfall > 0 {
            book.pull(
                &self.assets.deposit_asset,
                &self.terms.operator,
                &self.address,
                shortfall,
            )?;
        } else if surplus > 0 {
            // principal exited for collateral, or never pulled
            book.transfer(
                &self.assets.deposit_asset,
                &self.address,
                &self.terms.operator,
                surplus,
            )?;
        }

        self.settlement = Some(settlement);
        ctx.emit(TermVaultEvent::PoolLiquidated {
            pool: self.address,
            obligation,
            pulled: shortfall,
            refunded: surplus,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Operator re-prices the collateral. The operator's posted collateral is
    /// re-sized to `ceil((max - exited) * scale / new_rate)`; a shortfall is
    /// pulled from the operator, an excess refunded.
    pub fn set_oracle_price<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        new_rate: u128,
    ) -> TermVaultResult<()> {
        require_operator(&self.terms.operator, &ctx.caller)?;
        check!(
            new_rate > 0,
            TermVaultError::InvalidInput { param: "new_rate", reason: "zero oraclePrice" }
        );
        let state = self.current_state(ctx.now);
        check!(!state.is_terminal(), TermVaultError::PoolTerminal { state });

        let old_rate = self.exchange_rate;
        let (mut pulled, mut refunded) = (0u128, 0u128);
        if state != PoolState::Created {
            let current = safe_sub(self.locked_collateral, self.restaked)?;
            let required = self.operator_requirement(new_rate)?;
            if required > current {
                pulled = required - current;
                book.pull(
                    &self.assets.collateral_asset,
                    &self.terms.operator,
                    &self.address,
                    pulled,
                )?;
            } else if current > required {
                refunded = current - required;
                book.transfer(
                    &self.assets.collateral_asset,
                    &self.address,
                    &self.terms.operator,
                    refunded,
                )?;
            }
            self.locked_collateral = safe_add(required, self.restaked)?;
        }

        self.exchange_rate = new_rate;
        ctx.emit(TermVaultEvent::ExchangeRateUpdated {
            pool: self.address,
            old_rate,
            new_rate,
            collateral_pulled: pulled,
            collateral_refunded: refunded,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Operator recovers deposit asset and collateral not owed to
    /// participants who have yet to claim
    pub fn close_pool<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
    ) -> TermVaultResult<()> {
        require_operator(&self.terms.operator, &ctx.caller)?;
        let state = self.current_state(ctx.now);
        check!(
            matches!(state, PoolState::Liquidated | PoolState::Dishonored),
            TermVaultError::PoolNotFinalized { state }
        );

        let (settlement, fresh_snapshot) = self.settlement_or_snapshot(book)?;
        let (deposit_owed, collateral_owed) = settlement.outstanding(self.claimed_weight)?;
        let held_deposit = book.balance_of(&self.assets.deposit_asset, &self.address)?;
        let held_collateral = book.balance_of(&self.assets.collateral_asset, &self.address)?;
        let deposit_returned = held_deposit.saturating_sub(deposit_owed);
        let collateral_returned = held_collateral.saturating_sub(collateral_owed);

        book.transfer(
            &self.assets.deposit_asset,
            &self.address,
            &self.terms.operator,
            deposit_returned,
        )?;
        book.transfer(
            &self.assets.collateral_asset,
            &self.address,
            &self.terms.operator,
            collateral_returned,
        )?;

        if fresh_snapshot {
            self.record_dishonor(ctx, settlement);
        }
        self.collateral_returned = true;
        self.locked_collateral = held_collateral - collateral_returned;
        ctx.emit(TermVaultEvent::PoolClosed {
            pool: self.address,
            deposit_returned,
            collateral_returned,
            timestamp: ctx.now,
        });
        Ok(())
    }

    /// Operator sweeps an asset that is neither the deposit nor the
    /// collateral asset
    pub fn rescue<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        asset: AssetId,
    ) -> TermVaultResult<()> {
        require_operator(&self.terms.operator, &ctx.caller)?;
        check!(
            asset != self.assets.deposit_asset && asset != self.assets.collateral_asset,
            TermVaultError::ProtectedAsset { asset }
        );

        let amount = book.balance_of(&asset, &self.address)?;
        book.transfer(&asset, &self.address, &self.terms.operator, amount)?;

        ctx.emit(TermVaultEvent::AssetRescued {
            pool: self.address,
            asset,
            amount,
            timestamp: ctx.now,
        });
        Ok(())
    }

    // ========================================================================
    // Claims
    // ========================================================================

    /// Collect the caller's settlement once the pool is finalized. Returns
    /// the (deposit asset, collateral) amounts paid.
    pub fn claim<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        book: &mut AssetBook<L>,
        to: Address,
    ) -> TermVaultResult<(u128, u128)> {
        // 1. Pool must be finalized
        let state = self.current_state(ctx.now);
        check!(state.is_claimable(), TermVaultError::PoolNotFinalized { state });

        // 2. Caller must hold an unclaimed entitlement
        let (settlement, fresh_snapshot) = self.settlement_or_snapshot(book)?;
        let entitlement = self.entitlement_of(&settlement, &ctx.caller)?;
        check!(entitlement > 0, TermVaultError::NoClaim { account: ctx.caller });
        check!(
            !self.has_claimed(&ctx.caller),
            TermVaultError::AlreadyClaimed { account: ctx.caller }
        );

        // 3. Both payouts must be covered before either moves
        let (deposit_amount, collateral_amount) = settlement.payout(entitlement)?;
        let held_deposit = book.balance_of(&self.assets.deposit_asset, &self.address)?;
        check!(
            held_deposit >= deposit_amount,
            TermVaultError::InsufficientBalance { available: held_deposit, requested: deposit_amount }
        );
        let held_collateral = book.balance_of(&self.assets.collateral_asset, &self.address)?;
        check!(
            held_collateral >= collateral_amount,
            TermVaultError::InsufficientBalance {
                available: held_collateral,
                requested: collateral_amount,
            }
        );
        let new_weight = safe_add(self.claimed_weight, entitlement)?;

        // 4. Pay out
        book.transfer(&self.assets.deposit_asset, &self.address, &to, deposit_amount)?;
        if collateral_amount > 0 {
            book.transfer(&self.assets.collateral_asset, &self.address, &to, collateral_amount)?;
            self.locked_collateral = self.locked_collateral.saturating_sub(collateral_amount);
        }

        if fresh_snapshot {
            self.record_dishonor(ctx, settlement);
        }
        self.claimed.insert(ctx.caller);
        self.claimed_weight = new_weight;
        ctx.emit(TermVaultEvent::Claimed {
            pool: self.address,
            claimant: ctx.caller,
            to,
            deposit_amount,
            collateral_amount,
            timestamp: ctx.now,
        });
        Ok((deposit_amount, collateral_amount))
    }
}
