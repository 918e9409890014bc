//! Validation of user operations against accrued reserve state.

use crate::error::LendingError;
use crate::logic::generic::{health_factor_liquidation_threshold, UserAccountData};
use crate::math::wad_ray::unit;
use crate::state::{AuctionRecord, ReserveConfiguration, ReserveData};
use odra::casper_types::U256;
use odra::prelude::Address;

fn validate_usable(config: &ReserveConfiguration) -> Result<(), LendingError> {
    if !config.is_active {
        return Err(LendingError::ReserveInactive);
    }
    if config.is_paused {
        return Err(LendingError::ReservePaused);
    }
    Ok(())
}

fn validate_not_frozen(config: &ReserveConfiguration) -> Result<(), LendingError> {
    validate_usable(config)?;
    if config.is_frozen {
        return Err(LendingError::ReserveFrozen);
    }
    Ok(())
}

fn cap_exceeded(cap: U256, decimals: u8, total: U256) -> Result<bool, LendingError> {
    if cap.is_zero() {
        return Ok(false);
    }
    let cap = cap
        .checked_mul(unit(decimals))
        .ok_or(LendingError::MathOverflow)?;
    Ok(total > cap)
}

/// Supply of `amount` units (tokens for NFT reserves)
pub fn validate_supply(reserve: &ReserveData, amount: U256, now: u64) -> Result<(), LendingError> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    let config = &reserve.configuration;
    validate_not_frozen(config)?;
    let treasury = reserve
        .normalized_income(now)?
        .try_mul_amount(reserve.accrued_to_treasury)?;
    let total = reserve
        .total_supply(now)?
        .checked_add(treasury)
        .and_then(|v| v.checked_add(amount))
        .ok_or(LendingError::MathOverflow)?;
    if cap_exceeded(config.supply_cap, config.decimals, total)? {
        return Err(LendingError::SupplyCapExceeded);
    }
    Ok(())
}

/// Withdrawal of `amount` out of `user_balance`
pub fn validate_withdraw(
    reserve: &ReserveData,
    amount: U256,
    user_balance: U256,
) -> Result<(), LendingError> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    if amount > user_balance {
        return Err(LendingError::NotEnoughAvailableUserBalance);
    }
    validate_usable(&reserve.configuration)?;
    if !reserve.configuration.is_erc721() && amount > reserve.available_liquidity {
        return Err(LendingError::InsufficientLiquidity);
    }
    Ok(())
}

/// Reserve side checks of a borrow
pub fn validate_borrow(reserve: &ReserveData, amount: U256, now: u64) -> Result<(), LendingError> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    let config = &reserve.configuration;
    validate_not_frozen(config)?;
    if config.is_erc721() {
        return Err(LendingError::InvalidAssetType);
    }
    if !config.borrowing_enabled {
        return Err(LendingError::BorrowingNotEnabled);
    }
    if amount > reserve.available_liquidity {
        return Err(LendingError::InsufficientLiquidity);
    }
    let total_debt = reserve
        .total_variable_debt(now)?
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;
    if cap_exceeded(config.borrow_cap, config.decimals, total_debt)? {
        return Err(LendingError::BorrowCapExceeded);
    }
    Ok(())
}

/// Account side checks of a borrow, on the account data including the new debt
pub fn validate_borrow_health(data: &UserAccountData) -> Result<(), LendingError> {
    if data.total_collateral_base.is_zero() {
        return Err(LendingError::CollateralBalanceIsZero);
    }
    if data.health_factor < health_factor_liquidation_threshold() {
        return Err(LendingError::HealthFactorLowerThanLiquidationThreshold);
    }
    if data.is_ltv_exceeded() {
        return Err(LendingError::CollateralCannotCoverNewBorrow);
    }
    Ok(())
}

/// Account side checks of a collateral decrease, on the account data after it
pub fn validate_health_after_decrease(data: &UserAccountData) -> Result<(), LendingError> {
    if data.total_debt_base.is_zero() {
        return Ok(());
    }
    if data.health_factor < health_factor_liquidation_threshold() {
        return Err(LendingError::HealthFactorLowerThanLiquidationThreshold);
    }
    if data.is_ltv_exceeded() {
        return Err(LendingError::LtvValidationFailed);
    }
    Ok(())
}

/// Repayment of `amount` against `user_debt`
pub fn validate_repay(
    reserve: &ReserveData,
    amount: U256,
    user_debt: U256,
) -> Result<(), LendingError> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount);
    }
    validate_usable(&reserve.configuration)?;
    if user_debt.is_zero() {
        return Err(LendingError::NoDebtOfSelectedType);
    }
    Ok(())
}

/// Toggle of the collateral flag of a reserve the user holds `balance` of
pub fn validate_set_use_as_collateral(
    reserve: &ReserveData,
    balance: U256,
) -> Result<(), LendingError> {
    if balance.is_zero() {
        return Err(LendingError::UnderlyingBalanceZero);
    }
    validate_usable(&reserve.configuration)
}

/// Inputs shared by auction and liquidation checks
#[derive(Clone, Copy, Debug)]
pub struct PositionState<'a> {
    /// Collateral reserve
    pub collateral_reserve: &'a ReserveData,
    /// The collateral unit is enabled as collateral
    pub is_collateral: bool,
    /// Health factor relevant to the collateral kind, wad
    pub health_factor: U256,
    /// Auction record of the collateral unit
    pub auction: Option<&'a AuctionRecord>,
}

/// Start of an auction
pub fn validate_start_auction(position: &PositionState) -> Result<(), LendingError> {
    let reserve = position.collateral_reserve;
    if reserve.auction_strategy.is_none() {
        return Err(LendingError::NotAuctionableAsset);
    }
    validate_usable(&reserve.configuration)?;
    if !position.is_collateral {
        return Err(LendingError::CollateralCannotBeLiquidated);
    }
    if position.health_factor >= health_factor_liquidation_threshold() {
        return Err(LendingError::HealthFactorAboveThreshold);
    }
    if position.auction.is_some() {
        return Err(LendingError::AlreadyAuctioned);
    }
    Ok(())
}

/// Cancellation of an auction
pub fn validate_end_auction(
    position: &PositionState,
    recovery_health_factor: U256,
) -> Result<(), LendingError> {
    if position.auction.is_none() {
        return Err(LendingError::AuctionNotStarted);
    }
    if position.health_factor < recovery_health_factor {
        return Err(LendingError::AuctionRecoveryHealthFactorNotReached);
    }
    Ok(())
}

/// Fungible or NFT liquidation
pub fn validate_liquidation(
    liquidator: Address,
    user: Address,
    position: &PositionState,
    debt_reserve: &ReserveData,
    user_debt: U256,
) -> Result<(), LendingError> {
    if liquidator == user {
        return Err(LendingError::LiquidatorIsBorrower);
    }
    validate_usable(&position.collateral_reserve.configuration)?;
    validate_usable(&debt_reserve.configuration)?;
    if debt_reserve.configuration.is_erc721() {
        return Err(LendingError::InvalidAssetType);
    }
    if position.health_factor >= health_factor_liquidation_threshold() {
        return Err(LendingError::HealthFactorAboveThreshold);
    }
    if !position.is_collateral {
        return Err(LendingError::CollateralCannotBeLiquidated);
    }
    if user_debt.is_zero() {
        return Err(LendingError::NoDebtOfSelectedType);
    }
    if position.collateral_reserve.auction_strategy.is_some() && position.auction.is_none() {
        return Err(LendingError::AuctionNotStarted);
    }
    Ok(())
}
