//! Lending pool contract: reserves, balances, auctions and liquidations.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::error::LendingError;
use crate::events::*;
use crate::logic::{
    calculate_user_account_data,
    liquidation::{
        calculate_erc721_liquidation, calculate_liquidation_amounts, CollateralPricing,
        Erc721LiquidationParams, LiquidationParams,
    },
    validation, AccountDataProvider, BalanceChange, UserAccountData, UserAccountParams,
};
use crate::math::{common::wad, Ray};
use crate::oracle::PriceOracleContractRef;
use crate::state::{
    AuctionData, AuctionRecord, AuctionRecoveryPolicy, Erc721Position, Erc721SupplyParams,
    ReserveConfiguration, ReserveData, UserConfiguration, MAX_RESERVES_COUNT,
};
use crate::strategy::{
    dynamic_config::{blend_config_params, ConstituentValuation, PositionSourceContractRef},
    AuctionPricing, AuctionStrategy, DynamicConfigStrategy, InterestRateStrategy,
};
use crate::token::{FungibleTokenContractRef, NonFungibleTokenContractRef};

type AuctionKey = (Address, Address, Option<U256>);

#[odra::module(
    events = [
        Supply,
        Withdraw,
        Borrow,
        Repay,
        ReserveDataUpdated,
        SupplyErc721,
        WithdrawErc721,
        CollateralToggled,
        AuctionStarted,
        AuctionEnded,
        LiquidationCall,
        LiquidateErc721,
        MintedToTreasury,
        ReserveConfigured
    ],
    errors = LendingError
)]
pub struct LendingPool {
    admin: Var<Address>,
    oracle: Var<Address>,
    treasury: Var<Address>,
    auction_recovery_health_factor: Var<U256>,
    recovery_policy: Var<AuctionRecoveryPolicy>,

    reserves: Mapping<Address, ReserveData>,
    reserves_list: Mapping<u8, Address>,
    reserves_count: Var<u8>,

    user_configs: Mapping<Address, UserConfiguration>,
    // (asset, user), token count for NFT reserves
    scaled_supply: Mapping<(Address, Address), U256>,
    scaled_debt: Mapping<(Address, Address), U256>,

    erc721_positions: Mapping<(Address, U256), Option<Erc721Position>>,
    // (collection, user)
    erc721_collateral: Mapping<(Address, Address), Vec<U256>>,

    auctions: Mapping<AuctionKey, Option<AuctionRecord>>,
    // running auctions per reserve
    live_auctions: Mapping<Address, u32>,
    locked: Var<bool>,
}

#[odra::module]
impl LendingPool {
    // ===========================================================================
    // CONSTRUCTOR
    // ===========================================================================

    /// Initializes the pool, the caller becomes the admin
    pub fn init(
        &mut self,
        oracle: Address,
        treasury: Address,
        auction_recovery_health_factor: U256,
        recovery_policy: AuctionRecoveryPolicy,
    ) {
        if auction_recovery_health_factor < wad() {
            self.env().revert(LendingError::InvalidConfig);
        }
        self.admin.set(self.env().caller());
        self.oracle.set(oracle);
        self.treasury.set(treasury);
        self.auction_recovery_health_factor
            .set(auction_recovery_health_factor);
        self.recovery_policy.set(recovery_policy);
        self.reserves_count.set(0);
    }

    // ===========================================================================
    // RESERVE CONFIGURATION
    // ===========================================================================

    /// Lists `asset` as a new reserve
    pub fn init_reserve(
        &mut self,
        asset: Address,
        configuration: ReserveConfiguration,
        interest_rate_strategy: InterestRateStrategy,
    ) {
        let result = self.execute_init_reserve(asset, configuration, interest_rate_strategy);
        self.unwrap_or_revert(result)
    }

    /// Replaces the risk parameters of a reserve
    pub fn set_reserve_configuration(&mut self, asset: Address, configuration: ReserveConfiguration) {
        let result = self.only_admin().and_then(|_| {
            configuration.validate()?;
            let mut reserve = self.accrued_reserve(asset)?;
            if configuration.is_erc721() != reserve.configuration.is_erc721() {
                return Err(LendingError::InvalidAssetType);
            }
            reserve.configuration = configuration;
            self.commit_reserve(asset, reserve.clone());
            self.env().emit_event(ReserveConfigured {
                asset,
                id: reserve.id,
            });
            Ok(())
        });
        self.unwrap_or_revert(result)
    }

    /// Replaces the interest rate strategy of a reserve.
    ///
    /// Rates are recomputed by the next operation on the reserve.
    pub fn set_reserve_interest_rate_strategy(
        &mut self,
        asset: Address,
        interest_rate_strategy: InterestRateStrategy,
    ) {
        let result = self.only_admin().and_then(|_| {
            interest_rate_strategy.validate()?;
            let mut reserve = self.accrued_reserve(asset)?;
            reserve.interest_rate_strategy = interest_rate_strategy;
            self.commit_reserve(asset, reserve);
            Ok(())
        });
        self.unwrap_or_revert(result)
    }

    /// Sets or clears the auction strategy of a reserve. Clearing fails while
    /// any auction on the reserve is running.
    pub fn set_reserve_auction_strategy(
        &mut self,
        asset: Address,
        auction_strategy: Option<AuctionStrategy>,
    ) {
        let result = self.only_admin().and_then(|_| {
            if let Some(strategy) = &auction_strategy {
                strategy.validate()?;
            }
            let mut reserve = self.reserve(asset)?;
            let live = self.live_auctions.get(&asset).unwrap_or_default();
            if auction_strategy.is_none() && live > 0 {
                return Err(LendingError::AuctionInProgress);
            }
            reserve.auction_strategy = auction_strategy;
            self.reserves.set(&asset, reserve);
            Ok(())
        });
        self.unwrap_or_revert(result)
    }

    /// Sets or clears the dynamic configuration of an NFT reserve
    pub fn set_reserve_dynamic_config(
        &mut self,
        collection: Address,
        dynamic_config: Option<DynamicConfigStrategy>,
    ) {
        let result = self.only_admin().and_then(|_| {
            let mut reserve = self.reserve(collection)?;
            if !reserve.configuration.is_erc721() {
                return Err(LendingError::InvalidAssetType);
            }
            reserve.dynamic_config = dynamic_config;
            self.reserves.set(&collection, reserve);
            Ok(())
        });
        self.unwrap_or_revert(result)
    }

    /// Health factor, wad, a borrower must reach to end an auction
    pub fn set_auction_recovery_health_factor(&mut self, value: U256) {
        let result = self.only_admin().and_then(|_| {
            if value < wad() {
                return Err(LendingError::InvalidConfig);
            }
            self.auction_recovery_health_factor.set(value);
            Ok(())
        });
        self.unwrap_or_revert(result)
    }

    // ===========================================================================
    // FUNGIBLE OPERATIONS
    // ===========================================================================

    /// Supplies `amount` of `asset` on behalf of `on_behalf_of`
    pub fn supply(&mut self, asset: Address, amount: U256, on_behalf_of: Address) {
        self.guarded(|pool| pool.execute_supply(asset, amount, on_behalf_of))
    }

    /// Withdraws `amount` of `asset` to `to`, `U256::MAX` withdraws everything
    pub fn withdraw(&mut self, asset: Address, amount: U256, to: Address) -> U256 {
        self.guarded(|pool| pool.execute_withdraw(asset, amount, to))
    }

    /// Borrows `amount` of `asset` at the variable rate
    pub fn borrow(&mut self, asset: Address, amount: U256) {
        self.guarded(|pool| pool.execute_borrow(asset, amount))
    }

    /// Repays up to `amount` of the debt of `on_behalf_of`, `U256::MAX` repays everything
    pub fn repay(&mut self, asset: Address, amount: U256, on_behalf_of: Address) -> U256 {
        self.guarded(|pool| pool.execute_repay(asset, amount, on_behalf_of))
    }

    /// Enables or disables a supplied reserve as collateral
    pub fn set_user_use_reserve_as_collateral(&mut self, asset: Address, use_as_collateral: bool) {
        self.guarded(|pool| pool.execute_set_use_reserve_as_collateral(asset, use_as_collateral))
    }

    // ===========================================================================
    // NFT OPERATIONS
    // ===========================================================================

    /// Supplies NFTs of `collection` on behalf of `on_behalf_of`
    pub fn supply_erc721(
        &mut self,
        collection: Address,
        tokens: Vec<Erc721SupplyParams>,
        on_behalf_of: Address,
    ) {
        self.guarded(|pool| pool.execute_supply_erc721(collection, tokens, on_behalf_of))
    }

    /// Withdraws supplied NFTs to `to`
    pub fn withdraw_erc721(&mut self, collection: Address, token_ids: Vec<U256>, to: Address) {
        self.guarded(|pool| pool.execute_withdraw_erc721(collection, token_ids, to))
    }

    /// Enables or disables supplied NFTs as collateral
    pub fn set_user_use_erc721_as_collateral(
        &mut self,
        collection: Address,
        token_ids: Vec<U256>,
        use_as_collateral: bool,
    ) {
        self.guarded(|pool| {
            pool.execute_set_use_erc721_as_collateral(collection, token_ids, use_as_collateral)
        })
    }

    // ===========================================================================
    // AUCTIONS AND LIQUIDATIONS
    // ===========================================================================

    /// Starts an auction on a collateral unit of an unhealthy borrower
    pub fn start_auction(&mut self, user: Address, asset: Address, token_id: Option<U256>) {
        self.guarded(|pool| pool.execute_start_auction(user, asset, token_id))
    }

    /// Ends the auction of a borrower that recovered
    pub fn end_auction(&mut self, user: Address, asset: Address, token_id: Option<U256>) {
        self.guarded(|pool| pool.execute_end_auction(user, asset, token_id))
    }

    /// Repays debt of `user` in exchange for fungible collateral
    pub fn liquidation_call(
        &mut self,
        collateral_asset: Address,
        debt_asset: Address,
        user: Address,
        debt_to_cover: U256,
        receive_ptoken: bool,
    ) {
        self.guarded(|pool| {
            pool.execute_liquidation_call(
                collateral_asset,
                debt_asset,
                user,
                debt_to_cover,
                receive_ptoken,
            )
        })
    }

    /// Buys a collateral NFT of `user`, paying in `liquidation_asset`
    pub fn liquidation_erc721(
        &mut self,
        collection: Address,
        liquidation_asset: Address,
        user: Address,
        token_id: U256,
        max_liquidation_amount: U256,
        receive_ntoken: bool,
    ) {
        self.guarded(|pool| {
            pool.execute_liquidation_erc721(
                collection,
                liquidation_asset,
                user,
                token_id,
                max_liquidation_amount,
                receive_ntoken,
            )
        })
    }

    /// Credits the treasury share accrued on `assets`
    pub fn mint_to_treasury(&mut self, assets: Vec<Address>) {
        self.guarded(|pool| pool.execute_mint_to_treasury(assets))
    }

    // ===========================================================================
    // VIEWS
    // ===========================================================================

    /// Aggregated position of `user`
    pub fn get_user_account_data(&self, user: Address) -> UserAccountData {
        let result = self.account_data(user, self.user_config(user), BalanceChange::None);
        self.unwrap_or_revert(result)
    }

    /// Running auction of a collateral unit
    pub fn get_auction_data(
        &self,
        user: Address,
        asset: Address,
        token_id: Option<U256>,
    ) -> Option<AuctionData> {
        let record = self.auction(user, asset, token_id)?;
        let strategy = self.reserves.get(&asset)?.auction_strategy?;
        let multiplier = self.unwrap_or_revert(
            snapshot_strategy(&strategy, &record).price_multiplier(record.start_time, self.now()),
        );
        Some(AuctionData {
            user,
            asset,
            token_id,
            start_time: record.start_time,
            tick_length: record.tick_length,
            current_price_multiplier: multiplier.0,
        })
    }

    /// Stored reserve data
    pub fn get_reserve_data(&self, asset: Address) -> Option<ReserveData> {
        self.reserves.get(&asset)
    }

    /// Listed assets by reserve id
    pub fn get_reserves_list(&self) -> Vec<Address> {
        (0..self.reserves_count.get_or_default())
            .filter_map(|id| self.reserves_list.get(&id))
            .collect()
    }

    /// User configuration bitmap
    pub fn get_user_configuration(&self, user: Address) -> UserConfiguration {
        self.user_config(user)
    }

    /// Supply index at the current time, ray
    pub fn get_reserve_normalized_income(&self, asset: Address) -> U256 {
        let result = self
            .reserve(asset)
            .and_then(|r| r.normalized_income(self.now()));
        self.unwrap_or_revert(result).0
    }

    /// Variable borrow index at the current time, ray
    pub fn get_reserve_normalized_variable_debt(&self, asset: Address) -> U256 {
        let result = self
            .reserve(asset)
            .and_then(|r| r.normalized_variable_debt(self.now()));
        self.unwrap_or_revert(result).0
    }

    /// Supply balance in underlying units, token count for NFT reserves
    pub fn balance_of(&self, asset: Address, user: Address) -> U256 {
        let result = self
            .reserve(asset)
            .and_then(|r| self.underlying_balance(&r, asset, user));
        self.unwrap_or_revert(result)
    }

    /// Scaled supply balance
    pub fn scaled_balance_of(&self, asset: Address, user: Address) -> U256 {
        self.scaled_supply.get(&(asset, user)).unwrap_or_default()
    }

    /// Variable debt in underlying units
    pub fn debt_of(&self, asset: Address, user: Address) -> U256 {
        let result = self.reserve(asset).and_then(|r| {
            r.normalized_variable_debt(self.now())?
                .try_mul_amount(self.scaled_debt.get(&(asset, user)).unwrap_or_default())
        });
        self.unwrap_or_revert(result)
    }

    /// Scaled variable debt
    pub fn scaled_debt_of(&self, asset: Address, user: Address) -> U256 {
        self.scaled_debt.get(&(asset, user)).unwrap_or_default()
    }

    /// Supplied NFT
    pub fn erc721_position(&self, collection: Address, token_id: U256) -> Option<Erc721Position> {
        self.erc721_positions.get(&(collection, token_id)).flatten()
    }

    /// NFTs of `collection` the user has enabled as collateral
    pub fn erc721_collateral_tokens(&self, collection: Address, user: Address) -> Vec<U256> {
        self.erc721_collateral
            .get(&(collection, user))
            .unwrap_or_default()
    }

    /// Treasury address
    pub fn get_treasury(&self) -> Option<Address> {
        self.treasury.get()
    }

    /// Health factor, wad, needed to end an auction
    pub fn get_auction_recovery_health_factor(&self) -> U256 {
        self.auction_recovery_health_factor.get_or_default()
    }
}

/// Strategy with the tick length recorded when the auction started
fn snapshot_strategy(strategy: &AuctionStrategy, record: &AuctionRecord) -> AuctionStrategy {
    let mut snapshot = strategy.clone();
    snapshot.params.tick_length = record.tick_length;
    snapshot
}

fn sub(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_sub(b).ok_or(LendingError::NotEnoughAvailableUserBalance)
}

fn add(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_add(b).ok_or(LendingError::MathOverflow)
}

impl LendingPool {
    // ===========================================================================
    // GUARDS AND STORAGE HELPERS
    // ===========================================================================

    fn unwrap_or_revert<T>(&self, result: Result<T, LendingError>) -> T {
        match result {
            Ok(value) => value,
            Err(error) => {
                log::debug!("reverting: {}", error.message());
                self.env().revert(error)
            }
        }
    }

    /// Runs `operation` with the reentrancy lock held
    fn guarded<T, F>(&mut self, operation: F) -> T
    where
        F: FnOnce(&mut Self) -> Result<T, LendingError>,
    {
        if self.locked.get_or_default() {
            self.env().revert(LendingError::ReentrancyDetected);
        }
        self.locked.set(true);
        let result = operation(self);
        let value = self.unwrap_or_revert(result);
        self.locked.set(false);
        value
    }

    fn assert_locked(&self) -> Result<(), LendingError> {
        if self.locked.get_or_default() {
            Ok(())
        } else {
            Err(LendingError::ReentrancyDetected)
        }
    }

    fn only_admin(&self) -> Result<(), LendingError> {
        if self.admin.get() != Some(self.env().caller()) {
            return Err(LendingError::CallerNotAdmin);
        }
        Ok(())
    }

    fn now(&self) -> u64 {
        self.env().get_block_time() / 1_000
    }

    fn reserve(&self, asset: Address) -> Result<ReserveData, LendingError> {
        self.reserves.get(&asset).ok_or(LendingError::ReserveNotListed)
    }

    fn accrued_reserve(&self, asset: Address) -> Result<ReserveData, LendingError> {
        let mut reserve = self.reserve(asset)?;
        reserve.accrue(self.now())?;
        Ok(reserve)
    }

    fn commit_reserve(&mut self, asset: Address, reserve: ReserveData) {
        self.env().emit_event(ReserveDataUpdated {
            reserve: asset,
            liquidity_rate: Ray::from_storage(reserve.current_liquidity_rate).0,
            variable_borrow_rate: Ray::from_storage(reserve.current_variable_borrow_rate).0,
            liquidity_index: reserve.liquidity_index().0,
            variable_borrow_index: reserve.variable_borrow_index().0,
        });
        self.reserves.set(&asset, reserve);
    }

    fn user_config(&self, user: Address) -> UserConfiguration {
        self.user_configs
            .get(&user)
            .unwrap_or_else(UserConfiguration::empty)
    }

    fn auction(&self, user: Address, asset: Address, token_id: Option<U256>) -> Option<AuctionRecord> {
        self.auctions.get(&(user, asset, token_id)).flatten()
    }

    fn clear_auction(&mut self, user: Address, asset: Address, token_id: Option<U256>) {
        if self.auction(user, asset, token_id).is_none() {
            return;
        }
        self.auctions.set(&(user, asset, token_id), None);
        let live = self.live_auctions.get(&asset).unwrap_or_default();
        self.live_auctions.set(&asset, live.saturating_sub(1));
    }

    fn treasury_address(&self) -> Result<Address, LendingError> {
        self.treasury.get().ok_or(LendingError::InvalidConfig)
    }

    fn underlying_balance(
        &self,
        reserve: &ReserveData,
        asset: Address,
        user: Address,
    ) -> Result<U256, LendingError> {
        let scaled = self.scaled_supply.get(&(asset, user)).unwrap_or_default();
        if reserve.configuration.is_erc721() {
            return Ok(scaled);
        }
        reserve.normalized_income(self.now())?.try_mul_amount(scaled)
    }

    fn account_data(
        &self,
        user: Address,
        user_config: UserConfiguration,
        change: BalanceChange,
    ) -> Result<UserAccountData, LendingError> {
        calculate_user_account_data(
            self,
            &UserAccountParams {
                user,
                user_config,
                change,
            },
        )
    }

    /// Adds scaled supply to `user`, enabling the reserve as collateral on first supply
    fn credit_supply(
        &mut self,
        asset: Address,
        reserve: &ReserveData,
        user: Address,
        scaled: U256,
    ) -> Result<(), LendingError> {
        let key = (asset, user);
        let previous = self.scaled_supply.get(&key).unwrap_or_default();
        self.scaled_supply.set(&key, add(previous, scaled)?);
        if previous.is_zero() && !scaled.is_zero() && reserve.configuration.ltv != 0 {
            let mut config = self.user_config(user);
            config.set_using_as_collateral(reserve.id, true)?;
            self.user_configs.set(&user, config);
        }
        Ok(())
    }

    /// Removes scaled supply from `user`, clearing the collateral bit when it reaches zero
    fn debit_supply(
        &mut self,
        asset: Address,
        reserve: &ReserveData,
        user: Address,
        scaled: U256,
    ) -> Result<U256, LendingError> {
        let key = (asset, user);
        let remaining = sub(self.scaled_supply.get(&key).unwrap_or_default(), scaled)?;
        self.scaled_supply.set(&key, remaining);
        if remaining.is_zero() {
            let mut config = self.user_config(user);
            config.set_using_as_collateral(reserve.id, false)?;
            self.user_configs.set(&user, config);
        }
        Ok(remaining)
    }

    /// Burns repaid debt of `user`, clearing the borrowing bit on full repayment
    fn burn_debt(
        &mut self,
        asset: Address,
        reserve: &mut ReserveData,
        user: Address,
        amount: U256,
        user_debt: U256,
    ) -> Result<(), LendingError> {
        let key = (asset, user);
        let scaled_debt = self.scaled_debt.get(&key).unwrap_or_default();
        let burned = if amount >= user_debt {
            scaled_debt
        } else {
            reserve
                .variable_borrow_index()
                .try_div_amount(amount)?
                .min(scaled_debt)
        };
        let remaining = scaled_debt - burned;
        reserve.scaled_variable_debt = reserve.scaled_variable_debt.saturating_sub(burned);
        self.scaled_debt.set(&key, remaining);
        if remaining.is_zero() {
            let mut config = self.user_config(user);
            config.set_borrowing(reserve.id, false)?;
            self.user_configs.set(&user, config);
        }
        Ok(())
    }

    fn remove_collateral_token(&mut self, collection: Address, user: Address, token_id: U256) -> usize {
        let key = (collection, user);
        let mut tokens = self.erc721_collateral.get(&key).unwrap_or_default();
        tokens.retain(|id| *id != token_id);
        let remaining = tokens.len();
        self.erc721_collateral.set(&key, tokens);
        remaining
    }

    fn add_collateral_token(&mut self, collection: Address, user: Address, token_id: U256) {
        let key = (collection, user);
        let mut tokens = self.erc721_collateral.get(&key).unwrap_or_default();
        if !tokens.contains(&token_id) {
            tokens.push(token_id);
        }
        self.erc721_collateral.set(&key, tokens);
    }

    fn set_collateral_bit(&mut self, user: Address, reserve_id: u8, enabled: bool) -> Result<(), LendingError> {
        let mut config = self.user_config(user);
        config.set_using_as_collateral(reserve_id, enabled)?;
        self.user_configs.set(&user, config);
        Ok(())
    }

    fn transfer_in(&self, asset: Address, from: Address, amount: U256) -> Result<(), LendingError> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut token = FungibleTokenContractRef::new(self.env(), asset);
        if !token.transfer_from(from, self.env().self_address(), amount) {
            return Err(LendingError::TokenTransferFailed);
        }
        self.assert_locked()
    }

    fn transfer_out(&self, asset: Address, to: Address, amount: U256) -> Result<(), LendingError> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut token = FungibleTokenContractRef::new(self.env(), asset);
        if !token.transfer(to, amount) {
            return Err(LendingError::TokenTransferFailed);
        }
        self.assert_locked()
    }

    fn transfer_nft(
        &self,
        collection: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), LendingError> {
        let mut token = NonFungibleTokenContractRef::new(self.env(), collection);
        if !token.transfer_from(from, to, token_id) {
            return Err(LendingError::TokenTransferFailed);
        }
        self.assert_locked()
    }

    /// Auction pricing of a collateral unit, or the reserve bonus when the
    /// reserve is not auctioned
    fn collateral_pricing(
        &self,
        reserve: &ReserveData,
        record: Option<&AuctionRecord>,
    ) -> Result<CollateralPricing, LendingError> {
        match (&reserve.auction_strategy, record) {
            (Some(strategy), Some(record)) => {
                let multiplier = snapshot_strategy(strategy, record)
                    .price_multiplier(record.start_time, self.now())?;
                Ok(CollateralPricing::Auction(multiplier))
            }
            _ => Ok(CollateralPricing::Bonus(reserve.configuration.liquidation_bonus)),
        }
    }

    // ===========================================================================
    // RESERVE CONFIGURATION
    // ===========================================================================

    fn execute_init_reserve(
        &mut self,
        asset: Address,
        configuration: ReserveConfiguration,
        interest_rate_strategy: InterestRateStrategy,
    ) -> Result<(), LendingError> {
        self.only_admin()?;
        if self.reserves.get(&asset).is_some() {
            return Err(LendingError::ReserveAlreadyInitialized);
        }
        let id = self.reserves_count.get_or_default();
        if id >= MAX_RESERVES_COUNT {
            return Err(LendingError::NoMoreReservesAllowed);
        }
        configuration.validate()?;
        interest_rate_strategy.validate()?;

        let reserve = ReserveData::new(id, configuration, interest_rate_strategy, self.now())?;
        self.reserves.set(&asset, reserve);
        self.reserves_list.set(&id, asset);
        self.reserves_count.set(id + 1);
        log::info!("listed reserve {:?} with id {}", asset, id);
        self.env().emit_event(ReserveConfigured { asset, id });
        Ok(())
    }

    // ===========================================================================
    // FUNGIBLE OPERATIONS
    // ===========================================================================

    fn execute_supply(
        &mut self,
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
    ) -> Result<(), LendingError> {
        let caller = self.env().caller();
        let mut reserve = self.accrued_reserve(asset)?;
        if reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }
        validation::validate_supply(&reserve, amount, self.now())?;

        let scaled = reserve.liquidity_index().try_div_amount(amount)?;
        if scaled.is_zero() {
            return Err(LendingError::InvalidAmount);
        }
        reserve.scaled_total_supply = add(reserve.scaled_total_supply, scaled)?;
        reserve.update_interest_rates(amount, U256::zero())?;

        self.credit_supply(asset, &reserve, on_behalf_of, scaled)?;
        self.commit_reserve(asset, reserve);
        self.transfer_in(asset, caller, amount)?;

        log::debug!("supply {} of {:?} for {:?}", amount, asset, on_behalf_of);
        self.env().emit_event(Supply {
            reserve: asset,
            user: caller,
            on_behalf_of,
            amount,
        });
        Ok(())
    }

    fn execute_withdraw(
        &mut self,
        asset: Address,
        amount: U256,
        to: Address,
    ) -> Result<U256, LendingError> {
        let caller = self.env().caller();
        let mut reserve = self.accrued_reserve(asset)?;
        if reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }
        let scaled_balance = self.scaled_supply.get(&(asset, caller)).unwrap_or_default();
        let balance = reserve.liquidity_index().try_mul_amount(scaled_balance)?;
        let index = reserve.liquidity_index();
        // a request burning every scaled unit withdraws the rounded balance
        let burns_everything = amount > balance
            && index
                .try_div_amount(amount)
                .map_or(false, |scaled| scaled <= scaled_balance);
        let amount = if amount == U256::MAX || burns_everything {
            balance
        } else {
            amount
        };
        validation::validate_withdraw(&reserve, amount, balance)?;

        let config = self.user_config(caller);
        if config.is_using_as_collateral(reserve.id) && config.is_borrowing_any() {
            let after = self.account_data(
                caller,
                config,
                BalanceChange::CollateralDecrease { asset, amount },
            )?;
            validation::validate_health_after_decrease(&after)?;
        }

        let burned = if amount == balance {
            scaled_balance
        } else {
            index.try_div_amount(amount)?.min(scaled_balance)
        };
        reserve.scaled_total_supply = reserve.scaled_total_supply.saturating_sub(burned);
        reserve.update_interest_rates(U256::zero(), amount)?;

        self.debit_supply(asset, &reserve, caller, burned)?;
        self.commit_reserve(asset, reserve);
        self.transfer_out(asset, to, amount)?;

        self.env().emit_event(Withdraw {
            reserve: asset,
            user: caller,
            to,
            amount,
        });
        Ok(amount)
    }

    fn execute_borrow(&mut self, asset: Address, amount: U256) -> Result<(), LendingError> {
        let caller = self.env().caller();
        let mut reserve = self.accrued_reserve(asset)?;
        validation::validate_borrow(&reserve, amount, self.now())?;

        let mut config = self.user_config(caller);
        let after = self.account_data(caller, config, BalanceChange::DebtIncrease { asset, amount })?;
        validation::validate_borrow_health(&after)?;

        let scaled = reserve.variable_borrow_index().try_div_amount(amount)?;
        if scaled.is_zero() {
            return Err(LendingError::InvalidAmount);
        }
        let key = (asset, caller);
        let scaled_debt = add(self.scaled_debt.get(&key).unwrap_or_default(), scaled)?;
        reserve.scaled_variable_debt = add(reserve.scaled_variable_debt, scaled)?;
        reserve.update_interest_rates(U256::zero(), amount)?;
        let borrow_rate = Ray::from_storage(reserve.current_variable_borrow_rate).0;

        config.set_borrowing(reserve.id, true)?;
        self.scaled_debt.set(&key, scaled_debt);
        self.user_configs.set(&caller, config);
        self.commit_reserve(asset, reserve);
        self.transfer_out(asset, caller, amount)?;

        log::debug!("borrow {} of {:?} by {:?}", amount, asset, caller);
        self.env().emit_event(Borrow {
            reserve: asset,
            user: caller,
            on_behalf_of: caller,
            amount,
            borrow_rate,
        });
        Ok(())
    }

    fn execute_repay(
        &mut self,
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
    ) -> Result<U256, LendingError> {
        let caller = self.env().caller();
        let mut reserve = self.accrued_reserve(asset)?;
        let scaled_debt = self
            .scaled_debt
            .get(&(asset, on_behalf_of))
            .unwrap_or_default();
        let debt = reserve.variable_borrow_index().try_mul_amount(scaled_debt)?;
        validation::validate_repay(&reserve, amount, debt)?;

        let payback = amount.min(debt);
        self.burn_debt(asset, &mut reserve, on_behalf_of, payback, debt)?;
        reserve.update_interest_rates(payback, U256::zero())?;
        self.commit_reserve(asset, reserve);
        self.transfer_in(asset, caller, payback)?;

        self.env().emit_event(Repay {
            reserve: asset,
            user: on_behalf_of,
            repayer: caller,
            amount: payback,
        });
        Ok(payback)
    }

    fn execute_set_use_reserve_as_collateral(
        &mut self,
        asset: Address,
        use_as_collateral: bool,
    ) -> Result<(), LendingError> {
        let caller = self.env().caller();
        let reserve = self.reserve(asset)?;
        if reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }
        let balance = self.underlying_balance(&reserve, asset, caller)?;
        validation::validate_set_use_as_collateral(&reserve, balance)?;

        let mut config = self.user_config(caller);
        if config.is_using_as_collateral(reserve.id) == use_as_collateral {
            return Ok(());
        }
        config.set_using_as_collateral(reserve.id, use_as_collateral)?;
        if !use_as_collateral {
            if self.auction(caller, asset, None).is_some() {
                return Err(LendingError::AuctionInProgress);
            }
            let after = self.account_data(caller, config, BalanceChange::None)?;
            validation::validate_health_after_decrease(&after)?;
        }
        self.user_configs.set(&caller, config);
        self.env().emit_event(CollateralToggled {
            reserve: asset,
            user: caller,
            token_id: None,
            enabled: use_as_collateral,
        });
        Ok(())
    }

    // ===========================================================================
    // NFT OPERATIONS
    // ===========================================================================

    fn execute_supply_erc721(
        &mut self,
        collection: Address,
        tokens: Vec<Erc721SupplyParams>,
        on_behalf_of: Address,
    ) -> Result<(), LendingError> {
        let caller = self.env().caller();
        let mut reserve = self.accrued_reserve(collection)?;
        if !reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }
        let count = U256::from(tokens.len());
        validation::validate_supply(&reserve, count, self.now())?;

        let nft = NonFungibleTokenContractRef::new(self.env(), collection);
        let mut any_collateral = false;
        for token in &tokens {
            if nft.owner_of(token.token_id) != caller {
                return Err(LendingError::NotTokenOwner);
            }
            let key = (collection, token.token_id);
            if self.erc721_positions.get(&key).flatten().is_some() {
                return Err(LendingError::TokenAlreadySupplied);
            }
            self.erc721_positions.set(
                &key,
                Some(Erc721Position {
                    owner: on_behalf_of,
                    is_collateral: token.use_as_collateral,
                }),
            );
            if token.use_as_collateral {
                self.add_collateral_token(collection, on_behalf_of, token.token_id);
                any_collateral = true;
            }
        }

        let key = (collection, on_behalf_of);
        let supplied = add(self.scaled_supply.get(&key).unwrap_or_default(), count)?;
        self.scaled_supply.set(&key, supplied);
        reserve.scaled_total_supply = add(reserve.scaled_total_supply, count)?;
        if any_collateral {
            self.set_collateral_bit(on_behalf_of, reserve.id, true)?;
        }
        self.commit_reserve(collection, reserve);

        let pool = self.env().self_address();
        for token in &tokens {
            self.transfer_nft(collection, caller, pool, token.token_id)?;
        }
        self.env().emit_event(SupplyErc721 {
            reserve: collection,
            user: caller,
            on_behalf_of,
            token_ids: tokens.iter().map(|t| t.token_id).collect(),
        });
        Ok(())
    }

    fn execute_withdraw_erc721(
        &mut self,
        collection: Address,
        token_ids: Vec<U256>,
        to: Address,
    ) -> Result<(), LendingError> {
        let caller = self.env().caller();
        let mut reserve = self.accrued_reserve(collection)?;
        if !reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }
        let key = (collection, caller);
        let supplied = self.scaled_supply.get(&key).unwrap_or_default();
        let count = U256::from(token_ids.len());
        validation::validate_withdraw(&reserve, count, supplied)?;

        let mut removes_collateral = false;
        for token_id in &token_ids {
            let position = self
                .erc721_position(collection, *token_id)
                .ok_or(LendingError::TokenNotSupplied)?;
            if position.owner != caller {
                return Err(LendingError::NotTokenOwner);
            }
            if self.auction(caller, collection, Some(*token_id)).is_some() {
                return Err(LendingError::AuctionInProgress);
            }
            removes_collateral |= position.is_collateral;
        }

        let config = self.user_config(caller);
        if removes_collateral && config.is_borrowing_any() {
            let after = self.account_data(
                caller,
                config,
                BalanceChange::TokensRemoved {
                    collection,
                    token_ids: token_ids.clone(),
                },
            )?;
            validation::validate_health_after_decrease(&after)?;
        }

        let mut remaining_collateral = self.erc721_collateral_tokens(collection, caller).len();
        for token_id in &token_ids {
            self.erc721_positions.set(&(collection, *token_id), None);
            remaining_collateral = self.remove_collateral_token(collection, caller, *token_id);
        }
        let remaining = sub(supplied, count)?;
        self.scaled_supply.set(&key, remaining);
        reserve.scaled_total_supply = reserve.scaled_total_supply.saturating_sub(count);
        if remaining_collateral == 0 {
            self.set_collateral_bit(caller, reserve.id, false)?;
        }
        self.commit_reserve(collection, reserve);

        let pool = self.env().self_address();
        for token_id in &token_ids {
            self.transfer_nft(collection, pool, to, *token_id)?;
        }
        self.env().emit_event(WithdrawErc721 {
            reserve: collection,
            user: caller,
            to,
            token_ids,
        });
        Ok(())
    }

    fn execute_set_use_erc721_as_collateral(
        &mut self,
        collection: Address,
        token_ids: Vec<U256>,
        use_as_collateral: bool,
    ) -> Result<(), LendingError> {
        let caller = self.env().caller();
        let reserve = self.reserve(collection)?;
        if !reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }
        let mut changed = Vec::new();
        for token_id in &token_ids {
            let mut position = self
                .erc721_position(collection, *token_id)
                .ok_or(LendingError::TokenNotSupplied)?;
            if position.owner != caller {
                return Err(LendingError::NotTokenOwner);
            }
            if position.is_collateral == use_as_collateral {
                continue;
            }
            if !use_as_collateral && self.auction(caller, collection, Some(*token_id)).is_some() {
                return Err(LendingError::AuctionInProgress);
            }
            position.is_collateral = use_as_collateral;
            changed.push((*token_id, position));
        }
        if changed.is_empty() {
            return Ok(());
        }

        if !use_as_collateral && self.user_config(caller).is_borrowing_any() {
            let after = self.account_data(
                caller,
                self.user_config(caller),
                BalanceChange::TokensRemoved {
                    collection,
                    token_ids: changed.iter().map(|(id, _)| *id).collect(),
                },
            )?;
            validation::validate_health_after_decrease(&after)?;
        }

        for (token_id, position) in changed {
            self.erc721_positions
                .set(&(collection, token_id), Some(position));
            if use_as_collateral {
                self.add_collateral_token(collection, caller, token_id);
            } else {
                self.remove_collateral_token(collection, caller, token_id);
            }
            self.env().emit_event(CollateralToggled {
                reserve: collection,
                user: caller,
                token_id: Some(token_id),
                enabled: use_as_collateral,
            });
        }
        let has_collateral = !self.erc721_collateral_tokens(collection, caller).is_empty();
        self.set_collateral_bit(caller, reserve.id, has_collateral)
    }

    // ===========================================================================
    // AUCTIONS
    // ===========================================================================

    /// Whether the unit is the user's collateral and the health factor that governs it
    fn position_health(
        &self,
        user: Address,
        asset: Address,
        reserve: &ReserveData,
        token_id: Option<U256>,
    ) -> Result<(bool, U256), LendingError> {
        let data = self.account_data(user, self.user_config(user), BalanceChange::None)?;
        match token_id {
            Some(token_id) => {
                if !reserve.configuration.is_erc721() {
                    return Err(LendingError::InvalidAssetType);
                }
                let is_collateral = self
                    .erc721_position(asset, token_id)
                    .map(|p| p.owner == user && p.is_collateral)
                    .unwrap_or(false);
                Ok((is_collateral, data.erc721_health_factor))
            }
            None => {
                if reserve.configuration.is_erc721() {
                    return Err(LendingError::InvalidAssetType);
                }
                let is_collateral = self.user_config(user).is_using_as_collateral(reserve.id)
                    && !self.scaled_supply.get(&(asset, user)).unwrap_or_default().is_zero();
                Ok((is_collateral, data.health_factor))
            }
        }
    }

    fn execute_start_auction(
        &mut self,
        user: Address,
        asset: Address,
        token_id: Option<U256>,
    ) -> Result<(), LendingError> {
        let reserve = self.reserve(asset)?;
        let strategy = reserve
            .auction_strategy
            .clone()
            .ok_or(LendingError::NotAuctionableAsset)?;
        let (is_collateral, health_factor) = self.position_health(user, asset, &reserve, token_id)?;
        let existing = self.auction(user, asset, token_id);
        validation::validate_start_auction(&validation::PositionState {
            collateral_reserve: &reserve,
            is_collateral,
            health_factor,
            auction: existing.as_ref(),
        })?;

        let record = AuctionRecord::start(self.now(), &strategy);
        self.auctions.set(&(user, asset, token_id), Some(record));
        let live = self.live_auctions.get(&asset).unwrap_or_default();
        self.live_auctions.set(&asset, live.saturating_add(1));
        log::info!("auction started for {:?} on {:?} {:?}", user, asset, token_id);
        self.env().emit_event(AuctionStarted {
            user,
            collateral_asset: asset,
            token_id,
            start_time: record.start_time,
        });
        Ok(())
    }

    fn execute_end_auction(
        &mut self,
        user: Address,
        asset: Address,
        token_id: Option<U256>,
    ) -> Result<(), LendingError> {
        let reserve = self.reserve(asset)?;
        let existing = self.auction(user, asset, token_id);
        if existing.is_none() {
            return Err(LendingError::AuctionNotStarted);
        }
        let (is_collateral, health_factor) = self.position_health(user, asset, &reserve, token_id)?;
        validation::validate_end_auction(
            &validation::PositionState {
                collateral_reserve: &reserve,
                is_collateral,
                health_factor,
                auction: existing.as_ref(),
            },
            self.get_auction_recovery_health_factor(),
        )?;
        self.clear_auction(user, asset, token_id);
        self.env().emit_event(AuctionEnded {
            user,
            collateral_asset: asset,
            token_id,
        });
        Ok(())
    }

    /// Deletes the auction record when the borrower recovered under `EndOnRecovery`
    fn end_auction_on_recovery(
        &mut self,
        user: Address,
        asset: Address,
        token_id: Option<U256>,
        erc721: bool,
    ) -> Result<(), LendingError> {
        if self.auction(user, asset, token_id).is_none() {
            return Ok(());
        }
        let policy = self
            .recovery_policy
            .get()
            .unwrap_or(AuctionRecoveryPolicy::ExplicitEnd);
        if let AuctionRecoveryPolicy::ExplicitEnd = policy {
            return Ok(());
        }
        let data = self.account_data(user, self.user_config(user), BalanceChange::None)?;
        let health_factor = if erc721 {
            data.erc721_health_factor
        } else {
            data.health_factor
        };
        if health_factor >= self.get_auction_recovery_health_factor() {
            self.clear_auction(user, asset, token_id);
            self.env().emit_event(AuctionEnded {
                user,
                collateral_asset: asset,
                token_id,
            });
        }
        Ok(())
    }

    // ===========================================================================
    // LIQUIDATIONS
    // ===========================================================================

    fn execute_liquidation_call(
        &mut self,
        collateral_asset: Address,
        debt_asset: Address,
        user: Address,
        debt_to_cover: U256,
        receive_ptoken: bool,
    ) -> Result<(), LendingError> {
        let liquidator = self.env().caller();
        if liquidator == user {
            return Err(LendingError::LiquidatorIsBorrower);
        }
        if collateral_asset == debt_asset {
            return Err(LendingError::InvalidAssetType);
        }
        let mut collateral_reserve = self.accrued_reserve(collateral_asset)?;
        let mut debt_reserve = self.accrued_reserve(debt_asset)?;
        if collateral_reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }

        let config = self.user_config(user);
        let data = self.account_data(user, config, BalanceChange::None)?;
        let user_scaled_collateral = self
            .scaled_supply
            .get(&(collateral_asset, user))
            .unwrap_or_default();
        let collateral_balance = collateral_reserve
            .liquidity_index()
            .try_mul_amount(user_scaled_collateral)?;
        let user_debt = debt_reserve
            .variable_borrow_index()
            .try_mul_amount(self.scaled_debt.get(&(debt_asset, user)).unwrap_or_default())?;
        let record = self.auction(user, collateral_asset, None);
        validation::validate_liquidation(
            liquidator,
            user,
            &validation::PositionState {
                collateral_reserve: &collateral_reserve,
                is_collateral: config.is_using_as_collateral(collateral_reserve.id)
                    && !collateral_balance.is_zero(),
                health_factor: data.health_factor,
                auction: record.as_ref(),
            },
            &debt_reserve,
            user_debt,
        )?;

        let amounts = calculate_liquidation_amounts(&LiquidationParams {
            collateral_price: self.asset_price(collateral_asset)?,
            collateral_decimals: collateral_reserve.configuration.decimals,
            debt_price: self.asset_price(debt_asset)?,
            debt_decimals: debt_reserve.configuration.decimals,
            pricing: self.collateral_pricing(&collateral_reserve, record.as_ref())?,
            liquidation_protocol_fee: collateral_reserve.configuration.liquidation_protocol_fee,
            user_collateral_balance: collateral_balance,
            user_debt,
            debt_to_cover,
            health_factor: data.health_factor,
            partial_liquidation_allowed: collateral_reserve
                .configuration
                .partial_liquidation_allowed,
        })?;
        log::debug!(
            "liquidating {:?}: repay {}, seize {}",
            user,
            amounts.debt_to_repay,
            amounts.collateral_to_liquidator
        );

        // debt side
        self.burn_debt(debt_asset, &mut debt_reserve, user, amounts.debt_to_repay, user_debt)?;
        debt_reserve.update_interest_rates(amounts.debt_to_repay, U256::zero())?;

        // collateral side
        let index = collateral_reserve.liquidity_index();
        let seized = amounts.total_collateral()?;
        let seized_scaled = if seized >= collateral_balance {
            user_scaled_collateral
        } else {
            index.try_div_amount(seized)?.min(user_scaled_collateral)
        };
        let fee_scaled = index.try_div_amount(amounts.protocol_fee)?.min(seized_scaled);
        let liquidator_scaled = seized_scaled - fee_scaled;
        let remaining = self.debit_supply(collateral_asset, &collateral_reserve, user, seized_scaled)?;
        if !fee_scaled.is_zero() {
            let treasury = self.treasury_address()?;
            self.credit_supply(collateral_asset, &collateral_reserve, treasury, fee_scaled)?;
        }
        if receive_ptoken {
            self.credit_supply(collateral_asset, &collateral_reserve, liquidator, liquidator_scaled)?;
            collateral_reserve.update_interest_rates(U256::zero(), U256::zero())?;
        } else {
            collateral_reserve.scaled_total_supply = collateral_reserve
                .scaled_total_supply
                .saturating_sub(liquidator_scaled);
            collateral_reserve.update_interest_rates(U256::zero(), amounts.collateral_to_liquidator)?;
        }

        self.commit_reserve(debt_asset, debt_reserve);
        self.commit_reserve(collateral_asset, collateral_reserve);
        if remaining.is_zero() {
            self.clear_auction(user, collateral_asset, None);
        } else {
            self.end_auction_on_recovery(user, collateral_asset, None, false)?;
        }

        self.transfer_in(debt_asset, liquidator, amounts.debt_to_repay)?;
        if !receive_ptoken {
            self.transfer_out(collateral_asset, liquidator, amounts.collateral_to_liquidator)?;
        }
        self.env().emit_event(LiquidationCall {
            collateral_asset,
            debt_asset,
            user,
            debt_to_cover: amounts.debt_to_repay,
            liquidated_collateral_amount: seized,
            liquidator,
            receive_ptoken,
        });
        Ok(())
    }

    fn execute_liquidation_erc721(
        &mut self,
        collection: Address,
        liquidation_asset: Address,
        user: Address,
        token_id: U256,
        max_liquidation_amount: U256,
        receive_ntoken: bool,
    ) -> Result<(), LendingError> {
        let liquidator = self.env().caller();
        if liquidator == user {
            return Err(LendingError::LiquidatorIsBorrower);
        }
        let mut collateral_reserve = self.accrued_reserve(collection)?;
        let mut debt_reserve = self.accrued_reserve(liquidation_asset)?;
        if !collateral_reserve.configuration.is_erc721() {
            return Err(LendingError::InvalidAssetType);
        }

        let data = self.account_data(user, self.user_config(user), BalanceChange::None)?;
        let position = self
            .erc721_position(collection, token_id)
            .filter(|p| p.owner == user)
            .ok_or(LendingError::TokenNotSupplied)?;
        let user_debt = debt_reserve.variable_borrow_index().try_mul_amount(
            self.scaled_debt
                .get(&(liquidation_asset, user))
                .unwrap_or_default(),
        )?;
        let record = self.auction(user, collection, Some(token_id));
        validation::validate_liquidation(
            liquidator,
            user,
            &validation::PositionState {
                collateral_reserve: &collateral_reserve,
                is_collateral: position.is_collateral,
                health_factor: data.erc721_health_factor,
                auction: record.as_ref(),
            },
            &debt_reserve,
            user_debt,
        )?;

        let amounts = calculate_erc721_liquidation(&Erc721LiquidationParams {
            token_price: self.token_price(collection, token_id)?,
            pricing: self.collateral_pricing(&collateral_reserve, record.as_ref())?,
            liquidation_asset_price: self.asset_price(liquidation_asset)?,
            liquidation_asset_decimals: debt_reserve.configuration.decimals,
            liquidation_protocol_fee: collateral_reserve.configuration.liquidation_protocol_fee,
            user_debt,
            max_liquidation_amount,
        })?;
        log::debug!(
            "liquidating token {} of {:?}: payment {}, repay {}",
            token_id,
            user,
            amounts.payment,
            amounts.debt_to_repay
        );

        // payment side
        self.burn_debt(liquidation_asset, &mut debt_reserve, user, amounts.debt_to_repay, user_debt)?;
        let index = debt_reserve.liquidity_index();
        let fee_scaled = index.try_div_amount(amounts.protocol_fee)?;
        let excess_scaled = index.try_div_amount(amounts.excess)?;
        if !fee_scaled.is_zero() {
            let treasury = self.treasury_address()?;
            self.credit_supply(liquidation_asset, &debt_reserve, treasury, fee_scaled)?;
        }
        if !excess_scaled.is_zero() {
            self.credit_supply(liquidation_asset, &debt_reserve, user, excess_scaled)?;
        }
        debt_reserve.scaled_total_supply = add(
            debt_reserve.scaled_total_supply,
            add(fee_scaled, excess_scaled)?,
        )?;
        debt_reserve.update_interest_rates(amounts.payment, U256::zero())?;

        // collateral side
        let user_key = (collection, user);
        let user_count = sub(self.scaled_supply.get(&user_key).unwrap_or_default(), U256::one())?;
        self.scaled_supply.set(&user_key, user_count);
        if self.remove_collateral_token(collection, user, token_id) == 0 {
            self.set_collateral_bit(user, collateral_reserve.id, false)?;
        }
        if receive_ntoken {
            self.erc721_positions.set(
                &(collection, token_id),
                Some(Erc721Position {
                    owner: liquidator,
                    is_collateral: true,
                }),
            );
            let liquidator_key = (collection, liquidator);
            let count = add(self.scaled_supply.get(&liquidator_key).unwrap_or_default(), U256::one())?;
            self.scaled_supply.set(&liquidator_key, count);
            self.add_collateral_token(collection, liquidator, token_id);
            self.set_collateral_bit(liquidator, collateral_reserve.id, true)?;
        } else {
            self.erc721_positions.set(&(collection, token_id), None);
            collateral_reserve.scaled_total_supply =
                collateral_reserve.scaled_total_supply.saturating_sub(U256::one());
        }
        self.clear_auction(user, collection, Some(token_id));

        self.commit_reserve(liquidation_asset, debt_reserve);
        self.commit_reserve(collection, collateral_reserve);

        self.transfer_in(liquidation_asset, liquidator, amounts.payment)?;
        if !receive_ntoken {
            let pool = self.env().self_address();
            self.transfer_nft(collection, pool, liquidator, token_id)?;
        }
        self.env().emit_event(LiquidateErc721 {
            collateral_asset: collection,
            liquidation_asset,
            user,
            token_id,
            liquidation_amount: amounts.payment,
            debt_repaid: amounts.debt_to_repay,
            liquidator,
            receive_ntoken,
        });
        Ok(())
    }

    fn execute_mint_to_treasury(&mut self, assets: Vec<Address>) -> Result<(), LendingError> {
        let treasury = self.treasury_address()?;
        for asset in assets {
            let mut reserve = self.accrued_reserve(asset)?;
            let scaled = reserve.accrued_to_treasury;
            if scaled.is_zero() {
                continue;
            }
            let amount_minted = reserve.liquidity_index().try_mul_amount(scaled)?;
            reserve.accrued_to_treasury = U256::zero();
            reserve.scaled_total_supply = add(reserve.scaled_total_supply, scaled)?;
            self.credit_supply(asset, &reserve, treasury, scaled)?;
            self.commit_reserve(asset, reserve);
            self.env().emit_event(MintedToTreasury {
                reserve: asset,
                amount_minted,
            });
        }
        Ok(())
    }
}

impl AccountDataProvider for LendingPool {
    fn reserves_count(&self) -> u8 {
        self.reserves_count.get_or_default()
    }

    fn reserve_by_id(&self, id: u8) -> Option<(Address, ReserveData)> {
        let asset = self.reserves_list.get(&id)?;
        self.reserves.get(&asset).map(|reserve| (asset, reserve))
    }

    fn asset_price(&self, asset: Address) -> Result<U256, LendingError> {
        let oracle = self.oracle.get().ok_or(LendingError::InvalidConfig)?;
        let price = PriceOracleContractRef::new(self.env(), oracle).get_asset_price(asset);
        if price.is_zero() {
            return Err(LendingError::InvalidOraclePrice);
        }
        Ok(price)
    }

    fn token_price(&self, collection: Address, token_id: U256) -> Result<U256, LendingError> {
        let oracle = self.oracle.get().ok_or(LendingError::InvalidConfig)?;
        let price =
            PriceOracleContractRef::new(self.env(), oracle).get_token_price(collection, token_id);
        if price.is_zero() {
            return Err(LendingError::InvalidOraclePrice);
        }
        Ok(price)
    }

    fn scaled_balance(&self, asset: Address, user: Address) -> U256 {
        self.scaled_supply.get(&(asset, user)).unwrap_or_default()
    }

    fn scaled_debt(&self, asset: Address, user: Address) -> U256 {
        self.scaled_debt.get(&(asset, user)).unwrap_or_default()
    }

    fn collateral_token_ids(&self, collection: Address, user: Address) -> Vec<U256> {
        self.erc721_collateral_tokens(collection, user)
    }

    fn token_config_params(
        &self,
        _collection: Address,
        reserve: &ReserveData,
        token_id: U256,
    ) -> Result<(u32, u32), LendingError> {
        let fallback = (
            reserve.configuration.ltv,
            reserve.configuration.liquidation_threshold,
        );
        let dynamic = match &reserve.dynamic_config {
            Some(dynamic) => dynamic,
            None => return Ok(fallback),
        };
        let source = PositionSourceContractRef::new(self.env(), dynamic.position_source);
        let mut valuations = Vec::new();
        for constituent in source.position_constituents(token_id) {
            let underlying = match self.reserves.get(&constituent.asset) {
                Some(underlying) => underlying,
                None => continue,
            };
            let config = &underlying.configuration;
            valuations.push(ConstituentValuation::new(
                constituent.amount,
                self.asset_price(constituent.asset)?,
                config.decimals,
                config.ltv,
                config.liquidation_threshold,
            )?);
        }
        Ok(blend_config_params(&valuations)?.unwrap_or(fallback))
    }

    fn now(&self) -> u64 {
        LendingPool::now(self)
    }
}
