//! Liquidation amount calculations.

use crate::error::LendingError;
use crate::math::{
    common::PERCENTAGE_FACTOR,
    percent_div, percent_mul, wad_mul,
    wad_ray::{mul_div, mul_div_up, unit},
    Wad,
};
use odra::casper_types::U256;

/// Share of the debt repayable at once while the health factor is above
/// `CLOSE_FACTOR_HF_THRESHOLD`
pub const DEFAULT_LIQUIDATION_CLOSE_FACTOR: u32 = 5_000;

/// Share of the debt repayable at once below `CLOSE_FACTOR_HF_THRESHOLD`
pub const MAX_LIQUIDATION_CLOSE_FACTOR: u32 = PERCENTAGE_FACTOR;

/// Health factor, wad, at which the full debt becomes repayable
pub const CLOSE_FACTOR_HF_THRESHOLD: u128 = 950_000_000_000_000_000;

/// Price applied to seized collateral
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollateralPricing {
    /// Oracle price scaled by the auction multiplier, no bonus
    Auction(Wad),
    /// Oracle price with the reserve liquidation bonus
    Bonus(u32),
}

impl CollateralPricing {
    fn apply(&self, oracle_price: U256) -> Result<(U256, u32), LendingError> {
        match self {
            CollateralPricing::Auction(multiplier) => {
                Ok((wad_mul(oracle_price, multiplier.0)?, PERCENTAGE_FACTOR))
            }
            CollateralPricing::Bonus(bonus) => Ok((oracle_price, *bonus)),
        }
    }
}

/// Inputs of a fungible liquidation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidationParams {
    /// Collateral oracle price
    pub collateral_price: U256,
    /// Collateral decimals
    pub collateral_decimals: u8,
    /// Debt oracle price
    pub debt_price: U256,
    /// Debt decimals
    pub debt_decimals: u8,
    /// Collateral pricing mode
    pub pricing: CollateralPricing,
    /// Protocol share of the bonus, basis points
    pub liquidation_protocol_fee: u32,
    /// Borrower collateral balance
    pub user_collateral_balance: U256,
    /// Borrower debt in the debt asset
    pub user_debt: U256,
    /// Debt the liquidator offers to repay
    pub debt_to_cover: U256,
    /// Borrower blended health factor, wad
    pub health_factor: U256,
    /// Collateral reserve accepts partial seizure
    pub partial_liquidation_allowed: bool,
}

/// Result of a fungible liquidation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidationAmounts {
    /// Debt repaid by the liquidator
    pub debt_to_repay: U256,
    /// Collateral sent to the liquidator
    pub collateral_to_liquidator: U256,
    /// Collateral credited to the treasury
    pub protocol_fee: U256,
}

impl LiquidationAmounts {
    /// Collateral leaving the borrower
    pub fn total_collateral(&self) -> Result<U256, LendingError> {
        self.collateral_to_liquidator
            .checked_add(self.protocol_fee)
            .ok_or(LendingError::MathOverflow)
    }
}

/// Close factor for a health factor
pub fn close_factor(health_factor: U256) -> u32 {
    if health_factor > U256::from(CLOSE_FACTOR_HF_THRESHOLD) {
        DEFAULT_LIQUIDATION_CLOSE_FACTOR
    } else {
        MAX_LIQUIDATION_CLOSE_FACTOR
    }
}

/// Debt repaid and collateral seized by a fungible liquidation
pub fn calculate_liquidation_amounts(
    params: &LiquidationParams,
) -> Result<LiquidationAmounts, LendingError> {
    if params.collateral_price.is_zero() || params.debt_price.is_zero() {
        return Err(LendingError::InvalidOraclePrice);
    }
    // non-partial collateral is liquidated in one go, without the close factor
    let cap = if params.partial_liquidation_allowed {
        close_factor(params.health_factor)
    } else {
        MAX_LIQUIDATION_CLOSE_FACTOR
    };
    let max_liquidatable = percent_mul(params.user_debt, cap)?;
    let requested = params.debt_to_cover.min(max_liquidatable);

    let (collateral_price, bonus) = params.pricing.apply(params.collateral_price)?;
    if collateral_price.is_zero() {
        return Err(LendingError::InvalidOraclePrice);
    }
    let collateral_unit = unit(params.collateral_decimals);
    let debt_unit = unit(params.debt_decimals);

    // collateral = debt value / collateral price, both in base currency
    let debt_value = mul_div(requested, params.debt_price, debt_unit)?;
    let base_collateral = mul_div(debt_value, collateral_unit, collateral_price)?;
    let max_collateral = percent_mul(base_collateral, bonus)?;

    let (collateral, debt_to_repay) = if max_collateral > params.user_collateral_balance {
        let collateral = params.user_collateral_balance;
        let collateral_value = mul_div(collateral, collateral_price, collateral_unit)?;
        let debt = percent_div(mul_div(collateral_value, debt_unit, params.debt_price)?, bonus)?;
        (collateral, debt.min(requested))
    } else {
        (max_collateral, requested)
    };

    // settles the whole debt or seizes all of the collateral
    if !params.partial_liquidation_allowed
        && debt_to_repay < params.user_debt
        && collateral < params.user_collateral_balance
    {
        return Err(LendingError::PartialLiquidationNotAllowed);
    }

    let protocol_fee = if params.liquidation_protocol_fee == 0 || bonus == PERCENTAGE_FACTOR {
        U256::zero()
    } else {
        let bonus_collateral = collateral.saturating_sub(percent_div(collateral, bonus)?);
        percent_mul(bonus_collateral, params.liquidation_protocol_fee)?
    };

    Ok(LiquidationAmounts {
        debt_to_repay,
        collateral_to_liquidator: collateral - protocol_fee,
        protocol_fee,
    })
}

/// Inputs of an NFT liquidation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Erc721LiquidationParams {
    /// Oracle price of the token in base currency
    pub token_price: U256,
    /// Pricing mode
    pub pricing: CollateralPricing,
    /// Oracle price of the liquidation asset
    pub liquidation_asset_price: U256,
    /// Decimals of the liquidation asset
    pub liquidation_asset_decimals: u8,
    /// Protocol share of the payment, basis points
    pub liquidation_protocol_fee: u32,
    /// Borrower debt in the liquidation asset
    pub user_debt: U256,
    /// Most the liquidator is willing to pay
    pub max_liquidation_amount: U256,
}

/// Result of an NFT liquidation, amounts in the liquidation asset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Erc721LiquidationAmounts {
    /// Total paid by the liquidator
    pub payment: U256,
    /// Share of the payment credited to the treasury
    pub protocol_fee: U256,
    /// Share of the payment repaying debt
    pub debt_to_repay: U256,
    /// Remainder supplied to the borrower
    pub excess: U256,
}

/// Splits the price of a seized NFT into fee, repayment and excess
pub fn calculate_erc721_liquidation(
    params: &Erc721LiquidationParams,
) -> Result<Erc721LiquidationAmounts, LendingError> {
    if params.token_price.is_zero() || params.liquidation_asset_price.is_zero() {
        return Err(LendingError::InvalidOraclePrice);
    }
    let price_base = match params.pricing {
        CollateralPricing::Auction(multiplier) => wad_mul(params.token_price, multiplier.0)?,
        CollateralPricing::Bonus(bonus) => percent_div(params.token_price, bonus)?,
    };
    let payment = mul_div_up(
        price_base,
        unit(params.liquidation_asset_decimals),
        params.liquidation_asset_price,
    )?;
    if params.max_liquidation_amount < payment {
        return Err(LendingError::PartialLiquidationNotAllowed);
    }

    let protocol_fee = percent_mul(payment, params.liquidation_protocol_fee)?;
    let remaining = payment - protocol_fee;
    let debt_to_repay = remaining.min(params.user_debt);
    Ok(Erc721LiquidationAmounts {
        payment,
        protocol_fee,
        debt_to_repay,
        excess: remaining - debt_to_repay,
    })
}
