//! Integration Tests
//!
//! End-to-end flows through the registry: create a pool, run it through
//! its lifecycle, and check balances on both ledgers.

use termvault_common::{
    Address, AssetBook, AssetId, CallContext, EventType, PoolState, TokenLedger,
};
use termvault_pool::PoolTerms;

use crate::PoolRegistry;

const T0: u64 = 1_700_000_000;
const HOUR: u64 = 3_600;
const ONE_USD: u128 = 1_000_000;
const ONE_COLL: u128 = 1_000_000_000_000_000_000;

const USDT: AssetId = [0xA1; 32];
const HSF: AssetId = [0xB2; 32];

fn owner() -> Address {
    [5u8; 32]
}

fn operator() -> Address {
    [9u8; 32]
}

fn investor() -> Address {
    [1u8; 32]
}

fn second_investor() -> Address {
    [2u8; 32]
}

fn terms() -> PoolTerms {
    PoolTerms {
        operator: operator(),
        name: "Anomaly".to_string(),
        max_capacity: 100_000 * ONE_USD,
        min_capacity: 70_000 * ONE_USD,
        exchange_rate: 3,
        start_time: T0 + HOUR,
        stage_time: T0 + 5 * HOUR,
        end_time: T0 + 20 * HOUR,
        fee_bps: 150,
        interest_rate_bps: 1000,
    }
}

/// Registry with one created pool and funded, approved participants
fn deployment() -> (PoolRegistry, AssetBook, Address) {
    let mut book = AssetBook::new();
    book.register(TokenLedger::new(USDT, "USDT", 6));
    book.register(TokenLedger::new(HSF, "HSF", 18));

    let mut registry = PoolRegistry::new([0xEE; 32], owner(), &book, USDT, HSF).unwrap();
    let mut ctx = CallContext::new(owner(), T0);
    let pool = registry.create_pool(&mut ctx, terms()).unwrap();

    let usdt = book.ledger_mut(&USDT).unwrap();
    usdt.mint(&operator(), 110_000 * ONE_USD).unwrap();
    usdt.mint(&investor(), 60_000 * ONE_USD).unwrap();
    usdt.mint(&second_investor(), 40_000 * ONE_USD).unwrap();
    for who in [operator(), investor(), second_investor()] {
        usdt.approve(&who, &pool, u128::MAX);
    }

    let hsf = book.ledger_mut(&HSF).unwrap();
    hsf.mint(&operator(), 50_000 * ONE_COLL).unwrap();
    hsf.approve(&operator(), &pool, u128::MAX);

    (registry, book, pool)
}

#[test]
fn test_full_lifecycle_repaid() {
    let (mut registry, mut book, address) = deployment();
    let pool = registry.pool_mut(&address).unwrap();

    // 1. Operator opens, investors fund
    pool.open_pool(&mut CallContext::new(operator(), T0), &mut book).unwrap();
    pool.deposit(&mut CallContext::new(investor(), T0 + HOUR), &mut book, 60_000 * ONE_USD)
        .unwrap();
    pool.deposit(&mut CallContext::new(second_investor(), T0 + 2 * HOUR), &mut book, 40_000 * ONE_USD)
        .unwrap();

    // 2. Pool activates and the operator deploys the capital
    let active = T0 + 6 * HOUR;
    assert_eq!(pool.current_state(active), PoolState::Active);
    pool.pull_deposit(&mut CallContext::new(operator(), active), &mut book).unwrap();
    assert_eq!(book.balance_of(&USDT, &operator()).unwrap(), 210_000 * ONE_USD);

    // 3. Operator settles before the term ends
    let settle = T0 + 19 * HOUR;
    pool.liquidate(&mut CallContext::new(operator(), settle), &mut book).unwrap();
    assert_eq!(pool.liquidated_amount(), Some(108_350 * ONE_USD));

    // 4. Investors claim, operator recovers collateral
    let after = T0 + 20 * HOUR;
    assert_eq!(pool.current_state(after), PoolState::Liquidated);
    pool.claim(&mut CallContext::new(investor(), after), &mut book, investor()).unwrap();
    pool.claim(&mut CallContext::new(second_investor(), after), &mut book, second_investor())
        .unwrap();
    pool.close_pool(&mut CallContext::new(operator(), after), &mut book).unwrap();

    assert_eq!(book.balance_of(&USDT, &investor()).unwrap(), 65_010 * ONE_USD);
    assert_eq!(book.balance_of(&USDT, &second_investor()).unwrap(), 43_340 * ONE_USD);
    assert_eq!(book.balance_of(&HSF, &operator()).unwrap(), 50_000 * ONE_COLL);
    assert_eq!(book.balance_of(&USDT, &address).unwrap(), 0);
    assert_eq!(pool.current_state(after), PoolState::Closed);
    pool.verify_accounting().unwrap();
}

#[test]
fn test_full_lifecycle_dishonored() {
    let (mut registry, mut book, address) = deployment();
    let pool = registry.pool_mut(&address).unwrap();

    pool.open_pool(&mut CallContext::new(operator(), T0), &mut book).unwrap();
    pool.deposit(&mut CallContext::new(investor(), T0 + HOUR), &mut book, 60_000 * ONE_USD)
        .unwrap();
    pool.deposit(&mut CallContext::new(second_investor(), T0 + HOUR), &mut book, 40_000 * ONE_USD)
        .unwrap();
    pool.pull_deposit(&mut CallContext::new(operator(), T0 + 6 * HOUR), &mut book).unwrap();

    // operator never settles
    let deadline = pool.settlement_deadline();
    let mut ctx = CallContext::new(investor(), deadline);
    let (usd, collateral) = pool.claim(&mut ctx, &mut book, investor()).unwrap();
    assert_eq!(ctx.events.filter_by_type(EventType::PoolDishonored).len(), 1);
    assert_eq!(ctx.events.filter_by_type(EventType::Claimed).len(), 1);

    // 60% of the forfeited collateral, nothing in deposit asset
    let forfeited = 33_333_333_333_333_333_333_334u128;
    assert_eq!(usd, 0);
    assert_eq!(collateral, forfeited * 3 / 5);
    assert_eq!(book.balance_of(&HSF, &investor()).unwrap(), collateral);

    pool.close_pool(&mut CallContext::new(operator(), deadline), &mut book).unwrap();
    let (_, second) = pool
        .claim(&mut CallContext::new(second_investor(), deadline), &mut book, second_investor())
        .unwrap();
    assert_eq!(second, forfeited * 2 / 5);
    // close kept the unclaimed share back; only rounding dust remains
    assert_eq!(book.balance_of(&HSF, &address).unwrap(), forfeited - collateral - second);
    assert_eq!(book.balance_of(&HSF, &operator()).unwrap(), 50_000 * ONE_COLL - forfeited);
}

#[test]
fn test_pools_are_independent() {
    let (mut registry, mut book, first) = deployment();
    let mut other = terms();
    other.name = "Second".to_string();
    other.exchange_rate = 5;
    let second = registry
        .create_pool(&mut CallContext::new(owner(), T0), other)
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(registry.pool_list(1), Some(second));

    book.ledger_mut(&HSF)
        .unwrap()
        .approve(&operator(), &second, u128::MAX);
    registry
        .pool_mut(&second)
        .unwrap()
        .open_pool(&mut CallContext::new(operator(), T0), &mut book)
        .unwrap();

    assert_eq!(registry.pool(&first).unwrap().current_state(T0), PoolState::Created);
    assert_eq!(registry.pool(&second).unwrap().current_state(T0), PoolState::Opened);
    assert_eq!(book.balance_of(&HSF, &second).unwrap(), 20_000 * ONE_COLL);
}
