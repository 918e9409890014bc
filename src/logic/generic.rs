//! Account data and health factor calculation.

use crate::error::LendingError;
use crate::math::{
    common::{wad, PERCENTAGE_FACTOR},
    wad_div,
    wad_ray::{mul_div, mul_div_up, unit},
};
use crate::state::{ReserveData, UserConfiguration};
use odra::casper_types::U256;
use odra::prelude::*;

/// Health factor below which a position can be liquidated, wad
pub fn health_factor_liquidation_threshold() -> U256 {
    wad()
}

/// Read access to the pool state needed to value an account
pub trait AccountDataProvider {
    /// Number of listed reserves
    fn reserves_count(&self) -> u8;
    /// Asset and data of the reserve with `id`
    fn reserve_by_id(&self, id: u8) -> Option<(Address, ReserveData)>;
    /// Fungible asset price in base currency per whole token
    fn asset_price(&self, asset: Address) -> Result<U256, LendingError>;
    /// Price of a single NFT in base currency
    fn token_price(&self, collection: Address, token_id: U256) -> Result<U256, LendingError>;
    /// Scaled supply balance
    fn scaled_balance(&self, asset: Address, user: Address) -> U256;
    /// Scaled variable debt
    fn scaled_debt(&self, asset: Address, user: Address) -> U256;
    /// Token ids of `collection` the user has enabled as collateral
    fn collateral_token_ids(&self, collection: Address, user: Address) -> Vec<U256>;
    /// `(ltv, liquidation_threshold)` applied to one NFT
    fn token_config_params(
        &self,
        collection: Address,
        reserve: &ReserveData,
        token_id: U256,
    ) -> Result<(u32, u32), LendingError>;
    /// Current time, seconds
    fn now(&self) -> u64;
}

/// Balance change applied on top of the stored state, used to validate an
/// operation before it is written
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BalanceChange {
    /// Stored state as is
    None,
    /// Fungible collateral leaves the account
    CollateralDecrease {
        /// Reserve asset
        asset: Address,
        /// Underlying amount
        amount: U256,
    },
    /// NFTs leave the account
    TokensRemoved {
        /// Collection
        collection: Address,
        /// Removed token ids
        token_ids: Vec<U256>,
    },
    /// New debt is taken
    DebtIncrease {
        /// Reserve asset
        asset: Address,
        /// Underlying amount
        amount: U256,
    },
}

/// Inputs of `calculate_user_account_data`
#[derive(Clone, Debug)]
pub struct UserAccountParams {
    /// Account owner
    pub user: Address,
    /// Configuration to evaluate, possibly modified by the caller
    pub user_config: UserConfiguration,
    /// Pending change
    pub change: BalanceChange,
}

/// Aggregated position of an account, values in base currency
#[odra::odra_type]
pub struct UserAccountData {
    /// Collateral value
    pub total_collateral_base: U256,
    /// Debt value
    pub total_debt_base: U256,
    /// Additional debt the collateral can carry
    pub available_borrows_base: U256,
    /// Value weighted liquidation threshold, basis points
    pub current_liquidation_threshold: u32,
    /// Value weighted loan to value, basis points
    pub ltv: u32,
    /// Blended health factor, wad
    pub health_factor: U256,
    /// NFT only health factor, wad
    pub erc721_health_factor: U256,
    /// NFT collateral value
    pub total_erc721_collateral_base: U256,
}

impl UserAccountData {
    /// Ltv weighted collateral does not cover the debt
    pub fn is_ltv_exceeded(&self) -> bool {
        let borrowing_power =
            mul_div(self.total_collateral_base, U256::from(self.ltv), U256::from(PERCENTAGE_FACTOR))
                .unwrap_or(U256::MAX);
        !self.total_debt_base.is_zero() && borrowing_power < self.total_debt_base
    }
}

#[derive(Default)]
struct Totals {
    collateral: U256,
    debt: U256,
    ltv_weighted: U256,
    threshold_weighted: U256,
    fungible_threshold_weighted: U256,
    erc721_threshold_weighted: U256,
    erc721_collateral: U256,
}

impl Totals {
    fn add_collateral(
        &mut self,
        value: U256,
        ltv: u32,
        liquidation_threshold: u32,
        erc721: bool,
    ) -> Result<(), LendingError> {
        let by_ltv = value
            .checked_mul(U256::from(ltv))
            .ok_or(LendingError::MathOverflow)?;
        let by_threshold = value
            .checked_mul(U256::from(liquidation_threshold))
            .ok_or(LendingError::MathOverflow)?;
        self.collateral = add(self.collateral, value)?;
        self.ltv_weighted = add(self.ltv_weighted, by_ltv)?;
        self.threshold_weighted = add(self.threshold_weighted, by_threshold)?;
        if erc721 {
            self.erc721_collateral = add(self.erc721_collateral, value)?;
            self.erc721_threshold_weighted = add(self.erc721_threshold_weighted, by_threshold)?;
        } else {
            self.fungible_threshold_weighted =
                add(self.fungible_threshold_weighted, by_threshold)?;
        }
        Ok(())
    }
}

fn add(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_add(b).ok_or(LendingError::MathOverflow)
}

/// Values every reserve the user touches and derives both health factors.
///
/// The blended factor is `Σ(value · lt) / debt`. The NFT factor only counts
/// NFT collateral against the debt left uncovered by fungible collateral.
pub fn calculate_user_account_data<P: AccountDataProvider>(
    provider: &P,
    params: &UserAccountParams,
) -> Result<UserAccountData, LendingError> {
    let config = &params.user_config;
    let user = params.user;
    let now = provider.now();
    let mut totals = Totals::default();

    for id in 0..provider.reserves_count() {
        if config.remaining_from(id).is_zero() {
            break;
        }
        if !config.is_using_as_collateral_or_borrowing(id) {
            continue;
        }
        let (asset, reserve) = match provider.reserve_by_id(id) {
            Some(entry) => entry,
            None => continue,
        };
        let rc = &reserve.configuration;

        if rc.is_erc721() {
            if !config.is_using_as_collateral(id) {
                continue;
            }
            let removed: &[U256] = match &params.change {
                BalanceChange::TokensRemoved {
                    collection,
                    token_ids,
                } if *collection == asset => token_ids,
                _ => &[],
            };
            for token_id in provider.collateral_token_ids(asset, user) {
                if removed.contains(&token_id) {
                    continue;
                }
                let value = provider.token_price(asset, token_id)?;
                let (ltv, threshold) = provider.token_config_params(asset, &reserve, token_id)?;
                totals.add_collateral(value, ltv, threshold, true)?;
            }
            continue;
        }

        let price = provider.asset_price(asset)?;
        let token_unit = unit(rc.decimals);

        if config.is_using_as_collateral(id) && rc.liquidation_threshold != 0 {
            let mut balance = reserve
                .normalized_income(now)?
                .try_mul_amount(provider.scaled_balance(asset, user))?;
            if let BalanceChange::CollateralDecrease { asset: a, amount } = &params.change {
                if *a == asset {
                    balance = balance.saturating_sub(*amount);
                }
            }
            let value = mul_div(balance, price, token_unit)?;
            totals.add_collateral(value, rc.ltv, rc.liquidation_threshold, false)?;
        }

        if config.is_borrowing(id) {
            let mut debt = reserve
                .normalized_variable_debt(now)?
                .try_mul_amount(provider.scaled_debt(asset, user))?;
            if let BalanceChange::DebtIncrease { asset: a, amount } = &params.change {
                if *a == asset {
                    debt = add(debt, *amount)?;
                }
            }
            totals.debt = add(totals.debt, mul_div_up(debt, price, token_unit)?)?;
        }
    }

    // a borrow of an asset the user never touched still counts
    if let BalanceChange::DebtIncrease { asset, amount } = &params.change {
        if let Some((_, reserve)) = (0..provider.reserves_count())
            .filter_map(|id| provider.reserve_by_id(id))
            .find(|(a, r)| a == asset && !config.is_borrowing(r.id))
        {
            let price = provider.asset_price(*asset)?;
            let value = mul_div_up(*amount, price, unit(reserve.configuration.decimals))?;
            totals.debt = add(totals.debt, value)?;
        }
    }

    let data = account_data_from_totals(&totals)?;
    log::debug!(
        "account {:?}: collateral {}, debt {}, health factor {}, erc721 health factor {}",
        user,
        data.total_collateral_base,
        data.total_debt_base,
        data.health_factor,
        data.erc721_health_factor
    );
    Ok(data)
}

fn account_data_from_totals(totals: &Totals) -> Result<UserAccountData, LendingError> {
    let percentage = U256::from(PERCENTAGE_FACTOR);
    let (ltv, threshold) = if totals.collateral.is_zero() {
        (0, 0)
    } else {
        (
            (totals.ltv_weighted / totals.collateral).low_u32(),
            (totals.threshold_weighted / totals.collateral).low_u32(),
        )
    };

    let health_factor = if totals.debt.is_zero() {
        U256::MAX
    } else {
        wad_div(totals.threshold_weighted / percentage, totals.debt)?
    };

    let fungible_cover = totals.fungible_threshold_weighted / percentage;
    let erc721_health_factor = if totals.debt <= fungible_cover {
        U256::MAX
    } else {
        wad_div(
            totals.erc721_threshold_weighted / percentage,
            totals.debt - fungible_cover,
        )?
    };

    let borrowing_power = totals.ltv_weighted / percentage;
    Ok(UserAccountData {
        total_collateral_base: totals.collateral,
        total_debt_base: totals.debt,
        available_borrows_base: borrowing_power.saturating_sub(totals.debt),
        current_liquidation_threshold: threshold,
        ltv,
        health_factor,
        erc721_health_factor,
        total_erc721_collateral_base: totals.erc721_collateral,
    })
}
