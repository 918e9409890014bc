use odra::casper_types::U256;
use odra::prelude::Address;
use proptest::prelude::*;

use super::{units, Fixture};
use crate::error::LendingError;
use crate::math::common::{RAY, WAD};
use crate::strategy::InterestRateStrategy;

const YEAR: u64 = 31_536_000;

#[test]
fn supply_and_withdraw_everything() {
    let mut f = Fixture::new();
    let (weth, alice) = (f.weth_address(), f.alice);
    f.env.set_caller(alice);

    f.pool.supply(weth, units(100), alice);
    assert_eq!(f.pool.balance_of(weth, alice), units(100));
    assert_eq!(f.weth.balance_of(alice), units(900));
    assert!(f.pool.get_user_configuration(alice).is_using_as_collateral(0));

    let withdrawn = f.pool.withdraw(weth, U256::MAX, alice);
    assert_eq!(withdrawn, units(100));
    assert_eq!(f.pool.scaled_balance_of(weth, alice), U256::zero());
    assert_eq!(f.weth.balance_of(alice), units(1_000));
    assert!(f.pool.get_user_configuration(alice).is_empty());
}

/// USDC at a fixed 100% borrow rate with 60 borrowed for three years, and a
/// fresh supplier holding 1000 USDC
fn accrued_usdc_market() -> (Fixture, Address) {
    let mut f = Fixture::new();
    let usdc = f.usdc_address();
    f.env.set_caller(f.admin);
    let full_rate = InterestRateStrategy::fixed(U256::from(RAY));
    f.pool.set_reserve_interest_rate_strategy(usdc, full_rate);
    f.weth_borrower(units(60));
    f.advance_seconds(3 * YEAR);

    let carol = f.env.get_account(4);
    f.usdc.mint(carol, units(1_000));
    f.env.set_caller(carol);
    let pool = f.pool_address();
    f.usdc.approve(pool, U256::MAX);
    (f, carol)
}

/// Supplies and withdraws `amount`, returning what came back
fn round_trip(f: &mut Fixture, supplier: Address, amount: U256) -> U256 {
    let usdc = f.usdc_address();
    f.env.set_caller(supplier);
    f.pool.supply(usdc, amount, supplier);
    f.pool.withdraw(usdc, amount, supplier)
}

#[test]
fn withdraw_of_the_supplied_amount_after_interest() {
    let (mut f, carol) = accrued_usdc_market();
    let usdc = f.usdc_address();
    assert!(f.pool.get_reserve_normalized_income(usdc) > U256::from(RAY / 100 * 132));

    for raw in 1u64..=64 {
        let amount = U256::from(raw);
        let before = f.usdc.balance_of(carol);
        let withdrawn = round_trip(&mut f, carol, amount);
        assert!(withdrawn <= amount && amount - withdrawn <= U256::one());
        assert_eq!(f.pool.scaled_balance_of(usdc, carol), U256::zero());
        assert_eq!(f.usdc.balance_of(carol), before - amount + withdrawn);
    }
    assert!(f.pool.get_user_configuration(carol).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]
    #[test]
    fn supplied_amount_can_be_withdrawn_after_interest(
        raw in 1u128..100_000_000_000_000_000_000u128,
    ) {
        let (mut f, carol) = accrued_usdc_market();
        let (usdc, amount) = (f.usdc_address(), U256::from(raw));
        let withdrawn = round_trip(&mut f, carol, amount);
        prop_assert!(withdrawn <= amount);
        prop_assert!(amount - withdrawn <= U256::one());
        prop_assert_eq!(f.pool.scaled_balance_of(usdc, carol), U256::zero());
    }
}

#[test]
fn zero_amounts_are_rejected() {
    let mut f = Fixture::new();
    let (weth, alice) = (f.weth_address(), f.alice);
    f.env.set_caller(alice);
    assert_eq!(
        f.pool.try_supply(weth, U256::zero(), alice),
        Err(LendingError::InvalidAmount.into())
    );
}

#[test]
fn borrow_needs_collateral() {
    let mut f = Fixture::new();
    f.seed_usdc_liquidity();
    let usdc = f.usdc_address();
    f.env.set_caller(f.alice);
    assert_eq!(
        f.pool.try_borrow(usdc, units(10)),
        Err(LendingError::CollateralBalanceIsZero.into())
    );
}

#[test]
fn borrow_is_capped_by_ltv() {
    let mut f = Fixture::new();
    f.weth_borrower(units(70));
    let usdc = f.usdc_address();
    assert_eq!(
        f.pool.try_borrow(usdc, U256::one()),
        Err(LendingError::CollateralCannotCoverNewBorrow.into())
    );
    assert_eq!(f.pool.debt_of(usdc, f.alice), units(70));
    assert!(f.pool.get_user_configuration(f.alice).is_borrowing(1));
}

#[test]
fn withdraw_down_to_the_ltv_edge() {
    let mut f = Fixture::new();
    f.weth_borrower(units(35));
    let (weth, alice) = (f.weth_address(), f.alice);

    assert_eq!(
        f.pool.try_withdraw(weth, units(50) + U256::one(), alice),
        Err(LendingError::LtvValidationFailed.into())
    );
    f.pool.withdraw(weth, units(50), alice);

    let data = f.pool.get_user_account_data(alice);
    assert_eq!(data.total_collateral_base, units(50));
    assert_eq!(data.total_debt_base, units(35));
    assert!(data.health_factor > U256::from(1_214u64) * U256::from(WAD / 1_000));
    assert!(data.health_factor < U256::from(1_215u64) * U256::from(WAD / 1_000));
}

#[test]
fn collateral_cannot_be_disabled_under_debt() {
    let mut f = Fixture::new();
    f.weth_borrower(units(35));
    let weth = f.weth_address();
    assert_eq!(
        f.pool.try_set_user_use_reserve_as_collateral(weth, false),
        Err(LendingError::HealthFactorLowerThanLiquidationThreshold.into())
    );
}

#[test]
fn rate_overflow_leaves_reserve_untouched() {
    let mut f = Fixture::new();
    let (weth, alice) = (f.weth_address(), f.alice);
    f.env.set_caller(f.admin);
    let huge_rate = U256::from(u128::MAX) + U256::one();
    f.pool
        .set_reserve_interest_rate_strategy(weth, InterestRateStrategy::fixed(huge_rate));
    let before = f.pool.get_reserve_data(weth);

    f.env.set_caller(alice);
    assert_eq!(
        f.pool.try_supply(weth, units(1), alice),
        Err(LendingError::MathOverflow.into())
    );
    assert_eq!(f.pool.get_reserve_data(weth), before);
    assert_eq!(f.pool.balance_of(weth, alice), U256::zero());
}

#[test]
fn interest_accrues_and_reaches_treasury() {
    let mut f = Fixture::new();
    let (usdc, alice, treasury) = (f.usdc_address(), f.alice, f.treasury);
    f.env.set_caller(f.admin);
    f.pool.set_reserve_interest_rate_strategy(
        usdc,
        InterestRateStrategy::kinked(
            U256::from(RAY / 10 * 8),
            U256::zero(),
            U256::from(RAY / 100 * 4),
            U256::from(RAY / 100 * 75),
        ),
    );
    f.weth_borrower(units(50));

    f.advance_seconds(YEAR);
    let debt = f.pool.debt_of(usdc, alice);
    assert!(debt > units(50));
    assert!(f.pool.get_reserve_normalized_income(usdc) > U256::from(RAY));
    assert!(f.pool.get_reserve_normalized_variable_debt(usdc) > U256::from(RAY));

    f.env.set_caller(alice);
    assert_eq!(f.pool.repay(usdc, U256::MAX, alice), debt);
    assert_eq!(f.pool.debt_of(usdc, alice), U256::zero());
    assert!(!f.pool.get_user_configuration(alice).is_borrowing(1));

    f.pool.mint_to_treasury(vec![usdc]);
    assert!(f.pool.balance_of(usdc, treasury) > U256::zero());
    let reserve = f.pool.get_reserve_data(usdc).unwrap();
    assert_eq!(reserve.accrued_to_treasury, U256::zero());
}

#[test]
fn borrow_index_is_flat_without_borrowers() {
    let mut f = Fixture::new();
    let (weth, alice) = (f.weth_address(), f.alice);
    f.env.set_caller(f.admin);
    let five_percent = InterestRateStrategy::fixed(U256::from(RAY / 20));
    f.pool.set_reserve_interest_rate_strategy(weth, five_percent);
    f.env.set_caller(alice);
    f.pool.supply(weth, units(10), alice);
    let reserve = f.pool.get_reserve_data(weth).unwrap();
    assert!(!reserve.current_variable_borrow_rate.is_zero());

    f.advance_seconds(YEAR);
    assert_eq!(f.pool.get_reserve_normalized_variable_debt(weth), U256::from(RAY));
    f.pool.supply(weth, units(10), alice);
    let reserve = f.pool.get_reserve_data(weth).unwrap();
    assert_eq!(reserve.variable_borrow_index().0, U256::from(RAY));
}

#[test]
fn repay_without_debt_fails() {
    let mut f = Fixture::new();
    let (usdc, alice) = (f.usdc_address(), f.alice);
    f.env.set_caller(alice);
    assert_eq!(
        f.pool.try_repay(usdc, units(1), alice),
        Err(LendingError::NoDebtOfSelectedType.into())
    );
}

#[test]
fn reserves_are_admin_only() {
    let mut f = Fixture::new();
    let weth = f.weth_address();
    let configuration = f.pool.get_reserve_data(weth).unwrap().configuration;

    f.env.set_caller(f.alice);
    assert_eq!(
        f.pool
            .try_init_reserve(f.alice, configuration.clone(), InterestRateStrategy::zero()),
        Err(LendingError::CallerNotAdmin.into())
    );
    f.env.set_caller(f.admin);
    assert_eq!(
        f.pool
            .try_init_reserve(weth, configuration, InterestRateStrategy::zero()),
        Err(LendingError::ReserveAlreadyInitialized.into())
    );
    assert_eq!(
        f.pool.get_reserves_list(),
        vec![f.weth_address(), f.usdc_address(), f.apes_address()]
    );
}

#[test]
fn reentrant_withdraw_is_rejected() {
    let mut f = Fixture::new();
    let (weth, alice) = (f.weth_address(), f.alice);
    f.env.set_caller(alice);
    f.pool.supply(weth, units(100), alice);

    let pool = f.pool_address();
    f.weth.arm_reentrancy(pool);
    assert_eq!(
        f.pool.try_withdraw(weth, units(10), alice),
        Err(LendingError::ReentrancyDetected.into())
    );
    assert_eq!(f.pool.balance_of(weth, alice), units(100));
}
