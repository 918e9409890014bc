//! Reserve state and the index engine.

use crate::error::LendingError;
use crate::math::{
    common::PERCENTAGE_FACTOR,
    interest::{calculate_compounded_interest, calculate_linear_interest},
    percent_mul, ray_div, ray_mul, Ray,
};
use crate::strategy::{
    interest_rate::CalculateInterestRatesParams, AuctionStrategy, DynamicConfigStrategy,
    InterestRateModel, InterestRateStrategy,
};
use odra::casper_types::{U128, U256};

/// Maximum number of reserves, two user configuration bits each
pub const MAX_RESERVES_COUNT: u8 = 128;

/// Kind of asset backing a reserve
#[odra::odra_type]
#[derive(Copy)]
pub enum AssetType {
    /// Divisible token, supplied by amount
    Fungible,
    /// NFT collection, supplied by token id
    NonFungible,
}

/// Risk parameters of a reserve
#[odra::odra_type]
pub struct ReserveConfiguration {
    /// Loan to value, basis points
    pub ltv: u32,
    /// Liquidation threshold, basis points
    pub liquidation_threshold: u32,
    /// Liquidation bonus, basis points above 100% (10500 is a 5% bonus)
    pub liquidation_bonus: u32,
    /// Share of borrow interest kept by the treasury, basis points
    pub reserve_factor: u32,
    /// Share of the liquidation bonus kept by the treasury, basis points
    pub liquidation_protocol_fee: u32,
    /// Token decimals, zero for NFT collections
    pub decimals: u8,
    /// Supply cap in whole tokens, zero means uncapped
    pub supply_cap: U256,
    /// Borrow cap in whole tokens, zero means uncapped
    pub borrow_cap: U256,
    /// Reserve accepts operations
    pub is_active: bool,
    /// Reserve rejects new supply and borrow
    pub is_frozen: bool,
    /// Reserve rejects every operation
    pub is_paused: bool,
    /// Reserve can be borrowed
    pub borrowing_enabled: bool,
    /// Liquidations may seize less than requested
    pub partial_liquidation_allowed: bool,
    /// Asset kind
    pub asset_type: AssetType,
}

impl ReserveConfiguration {
    /// Check configuration invariants
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.ltv > self.liquidation_threshold
            || self.liquidation_threshold > PERCENTAGE_FACTOR
            || self.reserve_factor > PERCENTAGE_FACTOR
            || self.liquidation_protocol_fee > PERCENTAGE_FACTOR
            || self.decimals > 38
        {
            return Err(LendingError::InvalidConfig);
        }
        if self.liquidation_threshold != 0 {
            // the bonus must be a premium and the bonus-weighted threshold must stay below 100%
            let weighted = percent_mul(
                U256::from(self.liquidation_threshold),
                self.liquidation_bonus,
            )?;
            if self.liquidation_bonus < PERCENTAGE_FACTOR
                || weighted > U256::from(PERCENTAGE_FACTOR)
            {
                return Err(LendingError::InvalidConfig);
            }
        }
        if self.is_erc721() && (self.decimals != 0 || self.borrowing_enabled) {
            return Err(LendingError::InvalidConfig);
        }
        Ok(())
    }

    /// Reserve of an NFT collection
    pub fn is_erc721(&self) -> bool {
        matches!(self.asset_type, AssetType::NonFungible)
    }
}

/// Reserve data of a listed asset
#[odra::odra_type]
pub struct ReserveData {
    /// Position of the reserve in the user configuration bitmap
    pub id: u8,
    /// Risk parameters
    pub configuration: ReserveConfiguration,
    /// Cumulated supply index, ray
    pub liquidity_index: U128,
    /// Cumulated variable borrow index, ray
    pub variable_borrow_index: U128,
    /// Current supply rate, ray
    pub current_liquidity_rate: U128,
    /// Current variable borrow rate, ray
    pub current_variable_borrow_rate: U128,
    /// Current reported stable borrow rate, ray
    pub current_stable_borrow_rate: U128,
    /// Timestamp of the last accrual, seconds
    pub last_update_timestamp: u64,
    /// Scaled supply owed to the treasury and not yet minted
    pub accrued_to_treasury: U256,
    /// Sum of all scaled supply balances, token count for NFT reserves
    pub scaled_total_supply: U256,
    /// Sum of all scaled variable debt balances
    pub scaled_variable_debt: U256,
    /// Underlying held by the pool and available to borrow
    pub available_liquidity: U256,
    /// Interest rate strategy
    pub interest_rate_strategy: InterestRateStrategy,
    /// Auction strategy, set when the reserve collateral is auctioned on liquidation
    pub auction_strategy: Option<AuctionStrategy>,
    /// Per-token risk parameters for wrapped NFT positions
    pub dynamic_config: Option<DynamicConfigStrategy>,
}

impl ReserveData {
    /// Fresh reserve with indices at one
    pub fn new(
        id: u8,
        configuration: ReserveConfiguration,
        interest_rate_strategy: InterestRateStrategy,
        now: u64,
    ) -> Result<Self, LendingError> {
        let one = Ray::one().try_to_storage()?;
        Ok(Self {
            id,
            configuration,
            liquidity_index: one,
            variable_borrow_index: one,
            current_liquidity_rate: U128::zero(),
            current_variable_borrow_rate: U128::zero(),
            current_stable_borrow_rate: U128::zero(),
            last_update_timestamp: now,
            accrued_to_treasury: U256::zero(),
            scaled_total_supply: U256::zero(),
            scaled_variable_debt: U256::zero(),
            available_liquidity: U256::zero(),
            interest_rate_strategy,
            auction_strategy: None,
            dynamic_config: None,
        })
    }

    /// Stored supply index
    pub fn liquidity_index(&self) -> Ray {
        Ray::from_storage(self.liquidity_index)
    }

    /// Stored variable borrow index
    pub fn variable_borrow_index(&self) -> Ray {
        Ray::from_storage(self.variable_borrow_index)
    }

    /// Supply index as it would be after accruing to `now`
    pub fn normalized_income(&self, now: u64) -> Result<Ray, LendingError> {
        let index = self.liquidity_index();
        let rate = Ray::from_storage(self.current_liquidity_rate);
        if now == self.last_update_timestamp || rate.is_zero() {
            return Ok(index);
        }
        let factor = calculate_linear_interest(rate, self.last_update_timestamp, now)?;
        Ok(Ray(ray_mul(factor.0, index.0)?))
    }

    /// Variable borrow index as it would be after accruing to `now`, which
    /// only moves while the reserve carries debt
    pub fn normalized_variable_debt(&self, now: u64) -> Result<Ray, LendingError> {
        let index = self.variable_borrow_index();
        let rate = Ray::from_storage(self.current_variable_borrow_rate);
        if now == self.last_update_timestamp || rate.is_zero() || self.scaled_variable_debt.is_zero()
        {
            return Ok(index);
        }
        let factor = calculate_compounded_interest(rate, self.last_update_timestamp, now)?;
        Ok(Ray(ray_mul(factor.0, index.0)?))
    }

    /// Accrues interest up to `now`.
    ///
    /// Computes every new value before writing any of them, so on error the
    /// reserve is left as it was.
    pub fn accrue(&mut self, now: u64) -> Result<(), LendingError> {
        if now == self.last_update_timestamp {
            return Ok(());
        }
        let old_borrow_index = self.variable_borrow_index();

        let new_liquidity_index = self.normalized_income(now)?;
        let new_borrow_index = self.normalized_variable_debt(now)?;

        let previous_debt = old_borrow_index.try_mul_amount(self.scaled_variable_debt)?;
        let current_debt = new_borrow_index.try_mul_amount(self.scaled_variable_debt)?;
        let debt_accrued = current_debt.saturating_sub(previous_debt);
        let amount_to_mint = percent_mul(debt_accrued, self.configuration.reserve_factor)?;
        let accrued_to_treasury = if amount_to_mint.is_zero() {
            self.accrued_to_treasury
        } else {
            self.accrued_to_treasury
                .checked_add(ray_div(amount_to_mint, new_liquidity_index.0)?)
                .ok_or(LendingError::MathOverflow)?
        };

        let liquidity_index = new_liquidity_index.try_to_storage()?;
        let variable_borrow_index = new_borrow_index.try_to_storage()?;

        self.liquidity_index = liquidity_index;
        self.variable_borrow_index = variable_borrow_index;
        self.accrued_to_treasury = accrued_to_treasury;
        self.last_update_timestamp = now;
        log::debug!(
            "reserve {} accrued: liquidity index {}, borrow index {}",
            self.id,
            new_liquidity_index,
            new_borrow_index
        );
        Ok(())
    }

    /// Recomputes rates for a liquidity movement and applies the movement to
    /// `available_liquidity`. Nothing is written on error.
    pub fn update_interest_rates(
        &mut self,
        liquidity_added: U256,
        liquidity_taken: U256,
    ) -> Result<(), LendingError> {
        let total_variable_debt = self
            .variable_borrow_index()
            .try_mul_amount(self.scaled_variable_debt)?;
        let rates = self
            .interest_rate_strategy
            .calculate_interest_rates(&CalculateInterestRatesParams {
                available_liquidity: self.available_liquidity,
                liquidity_added,
                liquidity_taken,
                total_variable_debt,
                reserve_factor: self.configuration.reserve_factor,
            })?;

        let liquidity_rate = rates.liquidity_rate.try_to_storage()?;
        let variable_rate = rates.variable_borrow_rate.try_to_storage()?;
        let stable_rate = rates.stable_borrow_rate.try_to_storage()?;
        let available_liquidity = self
            .available_liquidity
            .checked_add(liquidity_added)
            .and_then(|v| v.checked_sub(liquidity_taken))
            .ok_or(LendingError::InsufficientLiquidity)?;

        self.current_liquidity_rate = liquidity_rate;
        self.current_variable_borrow_rate = variable_rate;
        self.current_stable_borrow_rate = stable_rate;
        self.available_liquidity = available_liquidity;
        Ok(())
    }

    /// Total supply in underlying units at `now`
    pub fn total_supply(&self, now: u64) -> Result<U256, LendingError> {
        if self.configuration.is_erc721() {
            return Ok(self.scaled_total_supply);
        }
        self.normalized_income(now)?
            .try_mul_amount(self.scaled_total_supply)
    }

    /// Total variable debt in underlying units at `now`
    pub fn total_variable_debt(&self, now: u64) -> Result<U256, LendingError> {
        self.normalized_variable_debt(now)?
            .try_mul_amount(self.scaled_variable_debt)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::common::{RAY, SECONDS_PER_YEAR, WAD};

    fn fungible_config() -> ReserveConfiguration {
        ReserveConfiguration {
            ltv: 7_000,
            liquidation_threshold: 8_500,
            liquidation_bonus: 10_500,
            reserve_factor: 1_000,
            liquidation_protocol_fee: 1_000,
            decimals: 18,
            supply_cap: U256::zero(),
            borrow_cap: U256::zero(),
            is_active: true,
            is_frozen: false,
            is_paused: false,
            borrowing_enabled: true,
            partial_liquidation_allowed: true,
            asset_type: AssetType::Fungible,
        }
    }

    fn percent(p: u128) -> U256 {
        U256::from(RAY / 100 * p)
    }

    fn strategy() -> InterestRateStrategy {
        InterestRateStrategy::kinked(percent(80), percent(0), percent(4), percent(75))
    }

    fn reserve_with_debt() -> ReserveData {
        let mut reserve = ReserveData::new(0, fungible_config(), strategy(), 1_000).unwrap();
        reserve.scaled_total_supply = U256::from(1_000 * WAD);
        reserve.available_liquidity = U256::from(1_000 * WAD);
        reserve.scaled_variable_debt = U256::from(400 * WAD);
        reserve
            .update_interest_rates(U256::zero(), U256::from(400 * WAD))
            .unwrap();
        reserve
    }

    #[test]
    fn new_reserve_starts_at_one() {
        let reserve = ReserveData::new(3, fungible_config(), strategy(), 7).unwrap();
        assert_eq!(reserve.liquidity_index(), Ray::one());
        assert_eq!(reserve.variable_borrow_index(), Ray::one());
        assert_eq!(reserve.last_update_timestamp, 7);
    }

    #[test]
    fn accrual_at_the_same_timestamp_is_a_no_op() {
        let mut reserve = reserve_with_debt();
        reserve.accrue(1_000 + SECONDS_PER_YEAR).unwrap();
        let once = reserve.clone();
        reserve.accrue(1_000 + SECONDS_PER_YEAR).unwrap();
        assert_eq!(reserve, once);
    }

    #[test]
    fn accrual_grows_both_indices() {
        let mut reserve = reserve_with_debt();
        assert!(!reserve.current_variable_borrow_rate.is_zero());
        let before = reserve.clone();
        reserve.accrue(1_000 + SECONDS_PER_YEAR).unwrap();
        assert!(reserve.liquidity_index() > before.liquidity_index());
        assert!(reserve.variable_borrow_index() > before.variable_borrow_index());
        assert!(reserve.variable_borrow_index() > reserve.liquidity_index());
        assert!(!reserve.accrued_to_treasury.is_zero());
    }

    #[test]
    fn normalized_values_match_accrual() {
        let mut reserve = reserve_with_debt();
        let now = 1_000 + 86_400;
        let income = reserve.normalized_income(now).unwrap();
        let debt = reserve.normalized_variable_debt(now).unwrap();
        reserve.accrue(now).unwrap();
        assert_eq!(reserve.liquidity_index(), income);
        assert_eq!(reserve.variable_borrow_index(), debt);
    }

    #[test]
    fn borrow_index_rests_without_debt() {
        let strategy = InterestRateStrategy::fixed(percent(5));
        let mut reserve = ReserveData::new(0, fungible_config(), strategy, 1_000).unwrap();
        reserve.available_liquidity = U256::from(1_000 * WAD);
        reserve.update_interest_rates(U256::zero(), U256::zero()).unwrap();
        assert!(!reserve.current_variable_borrow_rate.is_zero());

        let now = 1_000 + SECONDS_PER_YEAR;
        assert_eq!(reserve.normalized_variable_debt(now).unwrap(), Ray::one());
        reserve.accrue(now).unwrap();
        assert_eq!(reserve.variable_borrow_index(), Ray::one());
    }

    #[test]
    fn treasury_receives_reserve_factor_share() {
        let mut reserve = reserve_with_debt();
        let now = 1_000 + SECONDS_PER_YEAR;
        let debt_before = reserve.total_variable_debt(1_000).unwrap();
        reserve.accrue(now).unwrap();
        let debt_after = reserve.total_variable_debt(now).unwrap();
        let expected = percent_mul(debt_after - debt_before, 1_000).unwrap();
        let treasury = reserve
            .liquidity_index()
            .try_mul_amount(reserve.accrued_to_treasury)
            .unwrap();
        let diff = if treasury > expected {
            treasury - expected
        } else {
            expected - treasury
        };
        assert!(diff <= U256::one());
    }

    #[test]
    fn index_overflow_leaves_reserve_untouched() {
        let mut reserve = reserve_with_debt();
        reserve.current_variable_borrow_rate = U128::from(u128::MAX);
        let before = reserve.clone();
        assert_eq!(
            reserve.accrue(1_000 + 10 * SECONDS_PER_YEAR),
            Err(LendingError::MathOverflow)
        );
        assert_eq!(reserve, before);
    }

    #[test]
    fn rate_overflow_leaves_reserve_untouched() {
        let mut reserve = reserve_with_debt();
        reserve.interest_rate_strategy =
            InterestRateStrategy::fixed(U256::from(u128::MAX) + U256::one());
        let before = reserve.clone();
        assert_eq!(
            reserve.update_interest_rates(U256::one(), U256::zero()),
            Err(LendingError::MathOverflow)
        );
        assert_eq!(reserve, before);
    }

    #[test]
    fn liquidity_movement_is_applied() {
        let mut reserve = reserve_with_debt();
        assert_eq!(reserve.available_liquidity, U256::from(600 * WAD));
        reserve
            .update_interest_rates(U256::from(100 * WAD), U256::zero())
            .unwrap();
        assert_eq!(reserve.available_liquidity, U256::from(700 * WAD));
        assert_eq!(
            reserve.update_interest_rates(U256::zero(), U256::from(701 * WAD)),
            Err(LendingError::InsufficientLiquidity)
        );
    }

    #[test]
    fn configuration_validation() {
        assert!(fungible_config().validate().is_ok());

        let mut config = fungible_config();
        config.ltv = 9_000;
        assert_eq!(config.validate(), Err(LendingError::InvalidConfig));

        let mut config = fungible_config();
        config.liquidation_bonus = 9_000;
        assert_eq!(config.validate(), Err(LendingError::InvalidConfig));

        let mut config = fungible_config();
        config.liquidation_threshold = 9_800;
        config.ltv = 9_000;
        assert_eq!(config.validate(), Err(LendingError::InvalidConfig));

        let mut config = fungible_config();
        config.asset_type = AssetType::NonFungible;
        config.decimals = 0;
        assert_eq!(config.validate(), Err(LendingError::InvalidConfig));
        config.borrowing_enabled = false;
        assert!(config.validate().is_ok());
    }
}
