//! Interest rate strategies selected per reserve.

use crate::error::LendingError;
use crate::math::{common::*, percent_mul, ray_div, ray_mul, Ray};
use odra::casper_types::U256;

/// Shape of the borrow rate curve
#[odra::odra_type]
#[derive(Copy)]
pub enum RateStrategyKind {
    /// Two slopes joined at the optimal usage ratio
    Kinked,
    /// Variable rate fixed at the base rate
    Fixed,
}

/// Interest rate strategy configuration, all rates in ray
#[odra::odra_type]
pub struct InterestRateStrategy {
    /// Curve shape
    pub kind: RateStrategyKind,
    /// Usage ratio at which the second slope starts
    pub optimal_usage_ratio: U256,
    /// Variable rate at zero usage
    pub base_variable_borrow_rate: U256,
    /// Slope below the optimal usage ratio
    pub variable_rate_slope1: U256,
    /// Slope above the optimal usage ratio
    pub variable_rate_slope2: U256,
    /// Premium of the reported stable rate over the variable rate
    pub base_stable_rate_offset: U256,
}

/// Reserve state handed to a rate strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalculateInterestRatesParams {
    /// Liquidity held by the reserve before the operation
    pub available_liquidity: U256,
    /// Liquidity entering the reserve in the operation
    pub liquidity_added: U256,
    /// Liquidity leaving the reserve in the operation
    pub liquidity_taken: U256,
    /// Outstanding variable debt after the operation
    pub total_variable_debt: U256,
    /// Reserve factor in basis points
    pub reserve_factor: u32,
}

/// Rates produced by a strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterestRates {
    /// Rate earned by suppliers
    pub liquidity_rate: Ray,
    /// Reported stable borrow rate
    pub stable_borrow_rate: Ray,
    /// Variable borrow rate
    pub variable_borrow_rate: Ray,
}

/// Capability every rate strategy exposes to the reserve engine
pub trait InterestRateModel {
    /// Computes the new rates for a reserve
    fn calculate_interest_rates(
        &self,
        params: &CalculateInterestRatesParams,
    ) -> Result<InterestRates, LendingError>;
}

impl InterestRateStrategy {
    /// Two slope strategy
    pub fn kinked(
        optimal_usage_ratio: U256,
        base_variable_borrow_rate: U256,
        variable_rate_slope1: U256,
        variable_rate_slope2: U256,
    ) -> Self {
        Self {
            kind: RateStrategyKind::Kinked,
            optimal_usage_ratio,
            base_variable_borrow_rate,
            variable_rate_slope1,
            variable_rate_slope2,
            base_stable_rate_offset: U256::zero(),
        }
    }

    /// Constant variable rate strategy
    pub fn fixed(variable_borrow_rate: U256) -> Self {
        Self {
            kind: RateStrategyKind::Fixed,
            optimal_usage_ratio: ray(),
            base_variable_borrow_rate: variable_borrow_rate,
            variable_rate_slope1: U256::zero(),
            variable_rate_slope2: U256::zero(),
            base_stable_rate_offset: U256::zero(),
        }
    }

    /// Strategy that never charges interest, used for NFT reserves
    pub fn zero() -> Self {
        Self::fixed(U256::zero())
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<(), LendingError> {
        if self.optimal_usage_ratio.is_zero() || self.optimal_usage_ratio > ray() {
            return Err(LendingError::InvalidConfig);
        }
        Ok(())
    }

    fn variable_rate(&self, borrow_usage_ratio: U256) -> Result<U256, LendingError> {
        let base = self.base_variable_borrow_rate;
        match self.kind {
            RateStrategyKind::Fixed => Ok(base),
            RateStrategyKind::Kinked => {
                if borrow_usage_ratio > self.optimal_usage_ratio {
                    let max_excess = ray() - self.optimal_usage_ratio;
                    let excess_ratio =
                        ray_div(borrow_usage_ratio - self.optimal_usage_ratio, max_excess)?;
                    base.checked_add(self.variable_rate_slope1)
                        .ok_or(LendingError::MathOverflow)?
                        .checked_add(ray_mul(self.variable_rate_slope2, excess_ratio)?)
                        .ok_or(LendingError::MathOverflow)
                } else {
                    let slope_part = ray_div(
                        ray_mul(self.variable_rate_slope1, borrow_usage_ratio)?,
                        self.optimal_usage_ratio,
                    )?;
                    base.checked_add(slope_part).ok_or(LendingError::MathOverflow)
                }
            }
        }
    }
}

impl InterestRateModel for InterestRateStrategy {
    fn calculate_interest_rates(
        &self,
        params: &CalculateInterestRatesParams,
    ) -> Result<InterestRates, LendingError> {
        let total_debt = params.total_variable_debt;
        let borrow_usage_ratio = if total_debt.is_zero() {
            U256::zero()
        } else {
            let available = params
                .available_liquidity
                .checked_add(params.liquidity_added)
                .ok_or(LendingError::MathOverflow)?
                .checked_sub(params.liquidity_taken)
                .ok_or(LendingError::InsufficientLiquidity)?;
            let available_plus_debt = available
                .checked_add(total_debt)
                .ok_or(LendingError::MathOverflow)?;
            ray_div(total_debt, available_plus_debt)?
        };

        let variable_rate = self.variable_rate(borrow_usage_ratio)?;
        let stable_rate = variable_rate
            .checked_add(self.base_stable_rate_offset)
            .ok_or(LendingError::MathOverflow)?;
        let liquidity_rate = percent_mul(
            ray_mul(variable_rate, borrow_usage_ratio)?,
            PERCENTAGE_FACTOR - params.reserve_factor.min(PERCENTAGE_FACTOR),
        )?;

        Ok(InterestRates {
            liquidity_rate: Ray(liquidity_rate),
            stable_borrow_rate: Ray(stable_rate),
            variable_borrow_rate: Ray(variable_rate),
        })
    }
}
