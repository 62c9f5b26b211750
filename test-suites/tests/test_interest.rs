#![cfg(test)]

use lending_pool::{IntentKind, SECONDS_PER_YEAR};
use soroban_sdk::{testutils::Address as _, Address};
use test_suites::{
    assertions::{assert_approx_eq_abs, assert_approx_eq_rel},
    create_fixture_with_data,
    test_fixture::{TokenIndex, SCALAR_7, SCALAR_9},
};

/// Borrow interest accrues to suppliers and the treasury over a year
#[test]
fn test_interest_accrual() {
    let fixture = create_fixture_with_data();
    let frodo = fixture.users[0].clone();
    let usdc = fixture.token(TokenIndex::USDC);

    let samwise = Address::generate(&fixture.env);
    fixture
        .token(TokenIndex::WETH)
        .mint(&samwise, &(10 * SCALAR_9));
    fixture.submit_and_commit(&samwise, IntentKind::Deposit, TokenIndex::WETH, 10 * SCALAR_9);
    fixture.submit_and_commit(&samwise, IntentKind::Borrow, TokenIndex::USDC, 9_000_000000);

    // 9% utilization on a curve with a 1% base, a 4% first slope and an 80% kink
    let reserve = fixture.read_reserve(TokenIndex::USDC);
    assert_eq!(reserve.data.borrow_rate, 0_0145000);
    assert_eq!(
        reserve.data.supply_rate,
        0_0145000 * 9 / 100 * 9 / 10
    );
    assert_eq!(reserve.data.borrow_index, SCALAR_9);

    fixture.jump(SECONDS_PER_YEAR as u64);

    let reserve = fixture.read_reserve(TokenIndex::USDC);
    assert_eq!(reserve.data.borrow_index, 1_014_500_000);
    assert_eq!(reserve.data.total_borrowed, 9_130_500000);
    assert_eq!(reserve.data.total_liquidity, 100_130_500000);
    assert_eq!(reserve.data.treasury_credit, 13_050000);

    let debt = fixture.read_liabilities(&samwise, TokenIndex::USDC);
    assert_eq!(debt, 9_130_500000);
    let supplied = fixture.read_collateral(&frodo, TokenIndex::USDC);
    assert_approx_eq_rel(supplied, 100_117_450000, 0_0000100);
    // suppliers never earn more than borrowers pay, less the treasury's share
    assert!(supplied - 100_000_000000 <= 130_500000 - 13_050000);

    // health factor degrades as debt grows
    let hf = fixture.pool.get_health_factor(&samwise);
    assert_approx_eq_abs(
        hf,
        (16_000 * SCALAR_7 * SCALAR_9) / 9_130_5000000,
        1,
    );

    // repay in full and walk away
    usdc.mint(&samwise, &(debt - 9_000_000000));
    fixture.submit_and_commit(&samwise, IntentKind::Repay, TokenIndex::USDC, debt);
    assert_eq!(fixture.read_liabilities(&samwise, TokenIndex::USDC), 0);
    assert_eq!(usdc.balance(&samwise), 0);
    fixture.submit_and_commit(&samwise, IntentKind::Withdraw, TokenIndex::WETH, 10 * SCALAR_9);
    assert_eq!(fixture.pool.get_positions(&samwise).collateral.len(), 0);

    let reserve = fixture.read_reserve(TokenIndex::USDC);
    assert_eq!(reserve.data.total_borrowed, 0);
    assert_eq!(reserve.data.borrow_rate, 0_0100000);
    assert_eq!(reserve.data.supply_rate, 0);

    // the treasury claims its share
    let treasury = Address::generate(&fixture.env);
    let claimed = fixture.pool.claim_treasury(&usdc.address, &treasury);
    assert_eq!(claimed, 13_050000);
    assert_eq!(usdc.balance(&treasury), 13_050000);
    let reserve = fixture.read_reserve(TokenIndex::USDC);
    assert_eq!(reserve.data.treasury_credit, 0);
    assert_eq!(
        reserve.data.total_liquidity,
        usdc.balance(&fixture.pool.address)
    );

    // frodo can withdraw everything the reserve owes him
    let supplied = fixture.read_collateral(&frodo, TokenIndex::USDC);
    fixture.submit_and_commit(&frodo, IntentKind::Withdraw, TokenIndex::USDC, supplied);
    assert_eq!(usdc.balance(&frodo), supplied);
    assert_eq!(usdc.balance(&fixture.pool.address), 0);
}

/// No interest accrues without borrowers, no matter how much time passes
#[test]
fn test_no_interest_without_borrows() {
    let fixture = create_fixture_with_data();
    let frodo = fixture.users[0].clone();

    let reserve = fixture.read_reserve(TokenIndex::XLM);
    assert_eq!(reserve.data.supply_rate, 0);
    assert_eq!(reserve.data.borrow_rate, 0_0100000);

    fixture.jump(SECONDS_PER_YEAR as u64);

    let reserve = fixture.read_reserve(TokenIndex::XLM);
    assert_eq!(reserve.data.liquidity_index, SCALAR_9);
    assert_eq!(reserve.data.treasury_credit, 0);
    assert_eq!(
        fixture.read_collateral(&frodo, TokenIndex::XLM),
        1_000_000 * SCALAR_7
    );
}
