use odra::casper_types::U256;
use odra::host::{Deployer, HostRef, NoArgs};
use odra::prelude::Addressable;

use super::{units, Fixture};
use crate::error::LendingError;
use crate::logic::generic::test::config;
use crate::mocks::{MockNft, MockPositionManager};
use crate::state::{AssetType, Erc721Position, Erc721SupplyParams};
use crate::strategy::{DynamicConfigStrategy, InterestRateStrategy, PositionConstituent};

fn token(id: u64, use_as_collateral: bool) -> Erc721SupplyParams {
    Erc721SupplyParams {
        token_id: U256::from(id),
        use_as_collateral,
    }
}

#[test]
fn supply_and_withdraw_nfts() {
    let mut f = Fixture::new();
    let (apes, alice, pool) = (f.apes_address(), f.alice, f.pool_address());
    f.env.set_caller(alice);

    f.pool
        .supply_erc721(apes, vec![token(1, true), token(2, false)], alice);
    assert_eq!(f.apes.owner_of(U256::from(1)), pool);
    assert_eq!(f.pool.balance_of(apes, alice), U256::from(2));
    assert_eq!(
        f.pool.erc721_position(apes, U256::from(1)),
        Some(Erc721Position {
            owner: alice,
            is_collateral: true,
        })
    );
    assert_eq!(f.pool.erc721_collateral_tokens(apes, alice), vec![U256::from(1)]);

    let data = f.pool.get_user_account_data(alice);
    assert_eq!(data.total_collateral_base, units(10));
    assert_eq!(data.total_erc721_collateral_base, units(10));
    assert_eq!(data.ltv, 4_000);

    f.pool
        .withdraw_erc721(apes, vec![U256::from(1), U256::from(2)], alice);
    assert_eq!(f.apes.owner_of(U256::from(2)), alice);
    assert_eq!(f.pool.erc721_position(apes, U256::from(1)), None);
    assert!(f.pool.get_user_configuration(alice).is_empty());
}

#[test]
fn only_the_owner_can_supply() {
    let mut f = Fixture::new();
    let (apes, bob) = (f.apes_address(), f.bob);
    f.env.set_caller(bob);
    assert_eq!(
        f.pool.try_supply_erc721(apes, vec![token(1, true)], bob),
        Err(LendingError::NotTokenOwner.into())
    );
}

#[test]
fn nfts_cannot_be_supplied_as_fungible() {
    let mut f = Fixture::new();
    let (apes, alice) = (f.apes_address(), f.alice);
    f.env.set_caller(alice);
    assert_eq!(
        f.pool.try_supply(apes, U256::one(), alice),
        Err(LendingError::InvalidAssetType.into())
    );
}

#[test]
fn collateral_nft_cannot_leave_under_debt() {
    let mut f = Fixture::new();
    f.nft_borrower();
    let (apes, alice) = (f.apes_address(), f.alice);
    assert_eq!(
        f.pool.try_withdraw_erc721(apes, vec![U256::from(1)], alice),
        Err(LendingError::HealthFactorLowerThanLiquidationThreshold.into())
    );
    assert_eq!(
        f.pool
            .try_set_user_use_erc721_as_collateral(apes, vec![U256::from(1)], false),
        Err(LendingError::HealthFactorLowerThanLiquidationThreshold.into())
    );
}

#[test]
fn others_cannot_withdraw_supplied_nfts() {
    let mut f = Fixture::new();
    f.nft_borrower();
    let (apes, bob) = (f.apes_address(), f.bob);
    f.env.set_caller(bob);
    assert_eq!(
        f.pool.try_withdraw_erc721(apes, vec![U256::from(1)], bob),
        Err(LendingError::NotEnoughAvailableUserBalance.into())
    );
}

#[test]
fn position_nfts_take_the_params_of_their_constituents() {
    let mut f = Fixture::new();
    let (admin, alice, weth) = (f.admin, f.alice, f.weth_address());
    f.env.set_caller(admin);
    let mut positions = MockNft::deploy(&f.env, NoArgs);
    let mut manager = MockPositionManager::deploy(&f.env, NoArgs);
    let collection = positions.address().clone();

    f.pool.init_reserve(
        collection,
        config(AssetType::NonFungible, 3_000, 5_000),
        InterestRateStrategy::zero(),
    );
    f.pool.set_reserve_dynamic_config(
        collection,
        Some(DynamicConfigStrategy {
            position_source: manager.address().clone(),
        }),
    );
    manager.set_position(
        U256::from(7),
        vec![PositionConstituent {
            asset: weth,
            amount: units(10),
        }],
    );
    f.oracle
        .set_token_price(collection, U256::from(7), units(20));
    positions.mint(alice, U256::from(7));

    f.env.set_caller(alice);
    let pool = f.pool_address();
    positions.set_approval_for_all(pool, true);
    f.pool.supply_erc721(collection, vec![token(7, true)], alice);

    let data = f.pool.get_user_account_data(alice);
    assert_eq!(data.total_collateral_base, units(20));
    assert_eq!(data.ltv, 7_000);
    assert_eq!(data.current_liquidation_threshold, 8_500);
}
