//! Pool scenarios run against the odra test vm.

mod erc721;
mod fungible;

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;

use crate::logic::generic::test::config;
use crate::math::common::WAD;
use crate::mocks::{
    fungible_token::{MockFungibleTokenHostRef, MockFungibleTokenInitArgs},
    nft::MockNftHostRef,
    price_oracle::{MockPriceOracleHostRef, MockPriceOracleInitArgs},
    MockFungibleToken, MockNft, MockPriceOracle,
};
use crate::processor::{LendingPool, LendingPoolHostRef, LendingPoolInitArgs};
use crate::state::{AssetType, AuctionRecoveryPolicy};
use crate::strategy::{AuctionStrategy, AuctionStrategyParams, InterestRateStrategy};

pub(crate) const TICK: u64 = 900;
pub(crate) const MILLIS_PER_SECOND: u64 = 1_000;

pub(crate) fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(WAD)
}

/// `n` thousandths of a whole token
pub(crate) fn milli(n: u64) -> U256 {
    U256::from(n) * U256::from(WAD / 1_000)
}

pub(crate) fn exponential_auction() -> AuctionStrategy {
    AuctionStrategy::exponential(AuctionStrategyParams {
        max_price_multiplier: milli(3_000),
        min_exp_price_multiplier: milli(1_200),
        min_price_multiplier: milli(500),
        step_linear: milli(57),
        step_exp: milli(80),
        tick_length: TICK,
    })
}

pub(crate) fn linear_auction() -> AuctionStrategy {
    AuctionStrategy::linear(AuctionStrategyParams {
        max_price_multiplier: milli(3_000),
        min_exp_price_multiplier: milli(1_000),
        min_price_multiplier: milli(500),
        step_linear: milli(50),
        step_exp: U256::zero(),
        tick_length: TICK,
    })
}

/// Pool with WETH (id 0) and USDC (id 1) fungible reserves and an
/// auctionable APES collection (id 2), all priced by a mock oracle
pub(crate) struct Fixture {
    pub env: HostEnv,
    pub pool: LendingPoolHostRef,
    pub oracle: MockPriceOracleHostRef,
    pub weth: MockFungibleTokenHostRef,
    pub usdc: MockFungibleTokenHostRef,
    pub apes: MockNftHostRef,
    pub admin: Address,
    pub alice: Address,
    pub bob: Address,
    pub treasury: Address,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_policy(AuctionRecoveryPolicy::ExplicitEnd)
    }

    pub fn with_policy(recovery_policy: AuctionRecoveryPolicy) -> Self {
        let env = odra_test::env();
        let admin = env.get_account(0);
        let alice = env.get_account(1);
        let bob = env.get_account(2);
        let treasury = env.get_account(3);
        env.set_caller(admin);

        let mut oracle = MockPriceOracle::deploy(&env, MockPriceOracleInitArgs { admin });
        let mut weth = MockFungibleToken::deploy(
            &env,
            MockFungibleTokenInitArgs {
                symbol: String::from("WETH"),
                decimals: 18,
            },
        );
        let mut usdc = MockFungibleToken::deploy(
            &env,
            MockFungibleTokenInitArgs {
                symbol: String::from("USDC"),
                decimals: 18,
            },
        );
        let mut apes = MockNft::deploy(&env, NoArgs);
        let mut pool = LendingPool::deploy(
            &env,
            LendingPoolInitArgs {
                oracle: oracle.address().clone(),
                treasury,
                auction_recovery_health_factor: milli(1_500),
                recovery_policy,
            },
        );
        let pool_address = pool.address().clone();
        let (weth_address, usdc_address, apes_address) = (
            weth.address().clone(),
            usdc.address().clone(),
            apes.address().clone(),
        );

        let mut weth_config = config(AssetType::Fungible, 7_000, 8_500);
        weth_config.liquidation_protocol_fee = 1_000;
        pool.init_reserve(weth_address, weth_config, InterestRateStrategy::zero());
        pool.init_reserve(
            usdc_address,
            config(AssetType::Fungible, 7_000, 8_500),
            InterestRateStrategy::zero(),
        );
        pool.init_reserve(
            apes_address,
            config(AssetType::NonFungible, 4_000, 7_000),
            InterestRateStrategy::zero(),
        );
        pool.set_reserve_auction_strategy(apes_address, Some(exponential_auction()));

        oracle.set_asset_price(weth_address, units(1));
        oracle.set_asset_price(usdc_address, units(1));
        oracle.set_floor_price(apes_address, units(10));

        for user in [alice, bob] {
            weth.mint(user, units(1_000));
            usdc.mint(user, units(1_000));
            env.set_caller(user);
            weth.approve(pool_address, U256::MAX);
            usdc.approve(pool_address, U256::MAX);
            apes.set_approval_for_all(pool_address, true);
            env.set_caller(admin);
        }
        apes.mint(alice, U256::from(1));
        apes.mint(alice, U256::from(2));

        Self {
            env,
            pool,
            oracle,
            weth,
            usdc,
            apes,
            admin,
            alice,
            bob,
            treasury,
        }
    }

    pub fn weth_address(&self) -> Address {
        self.weth.address().clone()
    }

    pub fn usdc_address(&self) -> Address {
        self.usdc.address().clone()
    }

    pub fn apes_address(&self) -> Address {
        self.apes.address().clone()
    }

    pub fn pool_address(&self) -> Address {
        self.pool.address().clone()
    }

    pub fn now(&self) -> u64 {
        self.env.block_time() / MILLIS_PER_SECOND
    }

    pub fn advance_seconds(&self, seconds: u64) {
        self.env.advance_block_time(seconds * MILLIS_PER_SECOND);
    }

    pub fn set_weth_price(&mut self, price: U256) {
        self.env.set_caller(self.admin);
        let weth = self.weth_address();
        self.oracle.set_asset_price(weth, price);
    }

    pub fn set_apes_floor(&mut self, price: U256) {
        self.env.set_caller(self.admin);
        let apes = self.apes_address();
        self.oracle.set_floor_price(apes, price);
    }

    /// Bob provides 500 USDC of liquidity
    pub fn seed_usdc_liquidity(&mut self) {
        self.env.set_caller(self.bob);
        let (usdc, bob) = (self.usdc_address(), self.bob);
        self.pool.supply(usdc, units(500), bob);
    }

    /// Alice supplies 100 WETH and borrows `debt` USDC
    pub fn weth_borrower(&mut self, debt: U256) {
        self.seed_usdc_liquidity();
        self.env.set_caller(self.alice);
        let (weth, usdc, alice) = (self.weth_address(), self.usdc_address(), self.alice);
        self.pool.supply(weth, units(100), alice);
        self.pool.borrow(usdc, debt);
    }

    /// Alice supplies APES #1 and #2 as collateral and borrows 8 USDC
    pub fn nft_borrower(&mut self) {
        self.seed_usdc_liquidity();
        self.env.set_caller(self.alice);
        let (apes, usdc, alice) = (self.apes_address(), self.usdc_address(), self.alice);
        self.pool.supply_erc721(
            apes,
            vec![
                crate::state::Erc721SupplyParams {
                    token_id: U256::from(1),
                    use_as_collateral: true,
                },
                crate::state::Erc721SupplyParams {
                    token_id: U256::from(2),
                    use_as_collateral: true,
                },
            ],
            alice,
        );
        self.pool.borrow(usdc, units(8));
    }
}
