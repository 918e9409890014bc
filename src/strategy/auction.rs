//! Dutch auction price multiplier curves.
//!
//! A multiplier is a pure function of the auction start, the current time and
//! the strategy parameters. It starts at `max_price_multiplier`, decays once
//! per elapsed tick and never goes below `min_price_multiplier`.

use crate::error::LendingError;
use crate::math::{exp::exp_wad, exp::ln_wad, wad_div, wad_mul, Wad};
use odra::casper_types::U256;

/// Decay curve of an auction strategy
#[odra::odra_type]
#[derive(Copy)]
pub enum AuctionCurve {
    /// Constant decrement per tick
    Linear,
    /// Exponential decay down to `min_exp_price_multiplier`, then linear
    Exponential,
}

/// Auction curve parameters, multipliers and steps in wad
#[odra::odra_type]
pub struct AuctionStrategyParams {
    /// Multiplier at the start of the auction
    pub max_price_multiplier: U256,
    /// Multiplier at which the exponential phase hands over to the linear one
    pub min_exp_price_multiplier: U256,
    /// Floor of the multiplier
    pub min_price_multiplier: U256,
    /// Linear decrement per tick
    pub step_linear: U256,
    /// Exponential decay rate per tick
    pub step_exp: U256,
    /// Seconds per tick
    pub tick_length: u64,
}

/// Auction strategy attached to an auctionable reserve
#[odra::odra_type]
pub struct AuctionStrategy {
    /// Curve variant
    pub curve: AuctionCurve,
    /// Curve parameters
    pub params: AuctionStrategyParams,
}

/// Capability shared by all auction curves
pub trait AuctionPricing {
    /// Price multiplier of an auction started at `auction_start` observed at `now`
    fn price_multiplier(&self, auction_start: u64, now: u64) -> Result<Wad, LendingError>;

    /// Seconds per tick
    fn tick_length(&self) -> u64;
}

impl AuctionStrategy {
    /// Linear curve
    pub fn linear(params: AuctionStrategyParams) -> Self {
        Self {
            curve: AuctionCurve::Linear,
            params,
        }
    }

    /// Exponential-then-linear curve
    pub fn exponential(params: AuctionStrategyParams) -> Self {
        Self {
            curve: AuctionCurve::Exponential,
            params,
        }
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<(), LendingError> {
        let p = &self.params;
        if p.tick_length == 0
            || p.max_price_multiplier.is_zero()
            || p.min_price_multiplier > p.min_exp_price_multiplier
            || p.min_exp_price_multiplier > p.max_price_multiplier
        {
            return Err(LendingError::InvalidConfig);
        }
        if let AuctionCurve::Exponential = self.curve {
            if p.step_exp.is_zero() || p.min_exp_price_multiplier.is_zero() {
                return Err(LendingError::InvalidConfig);
            }
        }
        Ok(())
    }

    /// Whole ticks elapsed between `auction_start` and `now`
    pub fn elapsed_ticks(&self, auction_start: u64, now: u64) -> u64 {
        now.saturating_sub(auction_start) / self.params.tick_length.max(1)
    }

    /// Multiplier after a number of whole ticks
    pub fn price_multiplier_by_ticks(&self, ticks: u64) -> Result<Wad, LendingError> {
        let p = &self.params;
        if ticks == 0 {
            return Ok(Wad(p.max_price_multiplier));
        }
        let value = match self.curve {
            AuctionCurve::Linear => self.linear_multiplier(ticks)?,
            AuctionCurve::Exponential => self.exponential_multiplier(ticks)?,
        };
        Ok(Wad(value
            .max(p.min_price_multiplier)
            .min(p.max_price_multiplier)))
    }

    fn linear_multiplier(&self, ticks: u64) -> Result<U256, LendingError> {
        let p = &self.params;
        let decrement = p
            .step_linear
            .checked_mul(U256::from(ticks))
            .ok_or(LendingError::MathOverflow)?;
        match p.min_price_multiplier.checked_add(decrement) {
            Some(floor_plus_decrement) if floor_plus_decrement < p.max_price_multiplier => {
                Ok(p.max_price_multiplier - decrement)
            }
            _ => Ok(p.min_price_multiplier),
        }
    }

    fn exponential_multiplier(&self, ticks: u64) -> Result<U256, LendingError> {
        let p = &self.params;
        let ticks = Wad::try_from_units(ticks)?.0;
        let ticks_min_exp = wad_div(
            ln_wad(wad_div(p.max_price_multiplier, p.min_exp_price_multiplier)?)?,
            p.step_exp,
        )?;
        if ticks <= ticks_min_exp {
            return wad_div(p.max_price_multiplier, exp_wad(wad_mul(p.step_exp, ticks)?)?);
        }

        let price_min_exp_effective = wad_div(
            p.max_price_multiplier,
            exp_wad(wad_mul(p.step_exp, ticks_min_exp)?)?,
        )?;
        let delta = wad_mul(ticks - ticks_min_exp, p.step_linear)?;
        match p.min_price_multiplier.checked_add(delta) {
            Some(floor_plus_delta) if price_min_exp_effective > floor_plus_delta => {
                Ok(price_min_exp_effective - delta)
            }
            _ => Ok(p.min_price_multiplier),
        }
    }
}

impl AuctionPricing for AuctionStrategy {
    fn price_multiplier(&self, auction_start: u64, now: u64) -> Result<Wad, LendingError> {
        self.price_multiplier_by_ticks(self.elapsed_ticks(auction_start, now))
    }

    fn tick_length(&self) -> u64 {
        self.params.tick_length
    }
}
