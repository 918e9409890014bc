//! Per-token risk parameters for NFT collections whose tokens wrap other assets
//! (LP positions and other fractional NFTs).

use crate::error::LendingError;
use crate::math::{common::PERCENTAGE_FACTOR, wad_ray::mul_div, wad_ray::unit};
use odra::casper_types::U256;
use odra::prelude::{Address, Vec};

/// One underlying asset of a wrapped position
#[odra::odra_type]
pub struct PositionConstituent {
    /// Underlying asset
    pub asset: Address,
    /// Amount of `asset` in native units
    pub amount: U256,
}

/// Contract that can decompose a token of the collection into its underlying assets
#[odra::external_contract]
pub trait PositionSource {
    /// Underlying assets of `token_id`
    fn position_constituents(&self, token_id: U256) -> Vec<PositionConstituent>;
}

/// Dynamic configuration attached to an NFT reserve
#[odra::odra_type]
pub struct DynamicConfigStrategy {
    /// Position source queried for constituents
    pub position_source: Address,
}

/// A valued constituent together with the risk parameters of its reserve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstituentValuation {
    /// Value in base currency
    pub value: U256,
    /// Loan to value of the constituent's reserve
    pub ltv: u32,
    /// Liquidation threshold of the constituent's reserve
    pub liquidation_threshold: u32,
}

impl ConstituentValuation {
    /// Values `amount` native units at a wad `price` per whole token
    pub fn new(
        amount: U256,
        price: U256,
        decimals: u8,
        ltv: u32,
        liquidation_threshold: u32,
    ) -> Result<Self, LendingError> {
        Ok(Self {
            value: mul_div(amount, price, unit(decimals))?,
            ltv,
            liquidation_threshold,
        })
    }
}

/// Value weighted `(ltv, liquidation_threshold)` of a position.
///
/// Returns `None` when the position is worthless, the caller then falls back
/// to the collection's own configuration.
pub fn blend_config_params(
    constituents: &[ConstituentValuation],
) -> Result<Option<(u32, u32)>, LendingError> {
    let mut total_value = U256::zero();
    let mut weighted_ltv = U256::zero();
    let mut weighted_threshold = U256::zero();
    for c in constituents {
        total_value = total_value
            .checked_add(c.value)
            .ok_or(LendingError::MathOverflow)?;
        weighted_ltv = c
            .value
            .checked_mul(U256::from(c.ltv))
            .and_then(|v| v.checked_add(weighted_ltv))
            .ok_or(LendingError::MathOverflow)?;
        weighted_threshold = c
            .value
            .checked_mul(U256::from(c.liquidation_threshold))
            .and_then(|v| v.checked_add(weighted_threshold))
            .ok_or(LendingError::MathOverflow)?;
    }
    if total_value.is_zero() {
        return Ok(None);
    }

    let cap = U256::from(PERCENTAGE_FACTOR);
    let ltv = (weighted_ltv / total_value).min(cap).low_u32();
    let threshold = (weighted_threshold / total_value).min(cap).low_u32();
    Ok(Some((ltv, threshold)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::common::WAD;

    fn valued(value: u64, ltv: u32, liquidation_threshold: u32) -> ConstituentValuation {
        ConstituentValuation {
            value: U256::from(value),
            ltv,
            liquidation_threshold,
        }
    }

    #[test]
    fn equal_values_average_the_params() {
        let blended =
            blend_config_params(&[valued(100, 6_000, 7_000), valued(100, 8_000, 9_000)]).unwrap();
        assert_eq!(blended, Some((7_000, 8_000)));
    }

    #[test]
    fn larger_constituent_dominates() {
        let blended =
            blend_config_params(&[valued(300, 8_000, 8_500), valued(100, 0, 0)]).unwrap();
        assert_eq!(blended, Some((6_000, 6_375)));
    }

    #[test]
    fn worthless_position_has_no_params() {
        assert_eq!(blend_config_params(&[]).unwrap(), None);
        assert_eq!(blend_config_params(&[valued(0, 8_000, 8_500)]).unwrap(), None);
    }

    #[test]
    fn valuation_scales_by_decimals() {
        // 2.5 tokens of a 6 decimal asset at price 4
        let v = ConstituentValuation::new(
            U256::from(2_500_000u64),
            U256::from(4 * WAD),
            6,
            7_000,
            8_000,
        )
        .unwrap();
        assert_eq!(v.value, U256::from(10 * WAD));
    }
}
