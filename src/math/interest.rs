//! Interest accumulation over elapsed seconds.

use crate::error::LendingError;
use crate::math::common::*;
use crate::math::{wad_ray::ray_mul, Ray};
use odra::casper_types::U256;

/// Simple interest factor `1 + rate * dt / year`, in ray
pub fn calculate_linear_interest(
    rate: Ray,
    last_update_timestamp: u64,
    current_timestamp: u64,
) -> Result<Ray, LendingError> {
    let elapsed = current_timestamp
        .checked_sub(last_update_timestamp)
        .ok_or(LendingError::MathOverflow)?;
    let accrued = rate
        .0
        .checked_mul(U256::from(elapsed))
        .ok_or(LendingError::MathOverflow)?
        / U256::from(SECONDS_PER_YEAR);
    Ok(Ray(ray().checked_add(accrued).ok_or(LendingError::MathOverflow)?))
}

/// Compound interest factor approximated by the first three terms of the
/// binomial expansion of `(1 + rate / year)^dt`, in ray
pub fn calculate_compounded_interest(
    rate: Ray,
    last_update_timestamp: u64,
    current_timestamp: u64,
) -> Result<Ray, LendingError> {
    let exp = current_timestamp
        .checked_sub(last_update_timestamp)
        .ok_or(LendingError::MathOverflow)?;
    if exp == 0 {
        return Ok(Ray::one());
    }

    let exp_minus_one = U256::from(exp - 1);
    let exp_minus_two = U256::from(exp.saturating_sub(2));
    let exp = U256::from(exp);
    let year = U256::from(SECONDS_PER_YEAR);

    let base_power_two = ray_mul(rate.0, rate.0)? / (year * year);
    let base_power_three = ray_mul(base_power_two, rate.0)? / year;

    let second_term = exp
        .checked_mul(exp_minus_one)
        .and_then(|v| v.checked_mul(base_power_two))
        .ok_or(LendingError::MathOverflow)?
        / 2;
    let third_term = exp
        .checked_mul(exp_minus_one)
        .and_then(|v| v.checked_mul(exp_minus_two))
        .and_then(|v| v.checked_mul(base_power_three))
        .ok_or(LendingError::MathOverflow)?
        / 6;
    let first_term = rate
        .0
        .checked_mul(exp)
        .ok_or(LendingError::MathOverflow)?
        / year;

    let total = ray()
        .checked_add(first_term)
        .and_then(|v| v.checked_add(second_term))
        .and_then(|v| v.checked_add(third_term))
        .ok_or(LendingError::MathOverflow)?;
    Ok(Ray(total))
}
