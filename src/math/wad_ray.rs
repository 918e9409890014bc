//! Wad (18 decimals) and ray (27 decimals) arithmetic on raw `U256` values.
//!
//! Every product is computed with a checked multiplication, so a result that
//! would not fit in 256 bits fails with `MathOverflow` before the division
//! happens. Results are rounded half up.

use crate::error::LendingError;
use crate::math::common::*;
use odra::casper_types::{U128, U256};

fn mul_div_half_up(a: U256, b: U256, scale: U256) -> Result<U256, LendingError> {
    if a.is_zero() || b.is_zero() {
        return Ok(U256::zero());
    }
    let half = scale / 2;
    a.checked_mul(b)
        .and_then(|product| product.checked_add(half))
        .map(|product| product / scale)
        .ok_or(LendingError::MathOverflow)
}

fn div_half_up(a: U256, b: U256, scale: U256) -> Result<U256, LendingError> {
    if b.is_zero() {
        return Err(LendingError::MathOverflow);
    }
    let half = b / 2;
    a.checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(half))
        .map(|scaled| scaled / b)
        .ok_or(LendingError::MathOverflow)
}

/// `a * b / RAY`, rounded half up
pub fn ray_mul(a: U256, b: U256) -> Result<U256, LendingError> {
    mul_div_half_up(a, b, ray())
}

/// `a * RAY / b`, rounded half up
pub fn ray_div(a: U256, b: U256) -> Result<U256, LendingError> {
    div_half_up(a, b, ray())
}

/// `a * b / WAD`, rounded half up
pub fn wad_mul(a: U256, b: U256) -> Result<U256, LendingError> {
    mul_div_half_up(a, b, wad())
}

/// `a * WAD / b`, rounded half up
pub fn wad_div(a: U256, b: U256) -> Result<U256, LendingError> {
    div_half_up(a, b, wad())
}

/// Converts a wad into a ray
pub fn wad_to_ray(a: U256) -> Result<U256, LendingError> {
    a.checked_mul(U256::from(WAD_RAY_RATIO))
        .ok_or(LendingError::MathOverflow)
}

/// Converts a ray into a wad, rounded half up
pub fn ray_to_wad(a: U256) -> Result<U256, LendingError> {
    let ratio = U256::from(WAD_RAY_RATIO);
    a.checked_add(ratio / 2)
        .map(|rounded| rounded / ratio)
        .ok_or(LendingError::MathOverflow)
}

/// `a * b / c` rounded down, with the product checked for overflow
pub fn mul_div(a: U256, b: U256, c: U256) -> Result<U256, LendingError> {
    if c.is_zero() {
        return Err(LendingError::MathOverflow);
    }
    a.checked_mul(b)
        .map(|product| product / c)
        .ok_or(LendingError::MathOverflow)
}

/// `a * b / c` rounded up, with the product checked for overflow
pub fn mul_div_up(a: U256, b: U256, c: U256) -> Result<U256, LendingError> {
    if c.is_zero() {
        return Err(LendingError::MathOverflow);
    }
    let product = a.checked_mul(b).ok_or(LendingError::MathOverflow)?;
    let quotient = product / c;
    if (product % c).is_zero() {
        Ok(quotient)
    } else {
        quotient
            .checked_add(U256::one())
            .ok_or(LendingError::MathOverflow)
    }
}

/// `10^decimals` as `U256`
pub fn unit(decimals: u8) -> U256 {
    U256::exp10(decimals as usize)
}

/// Narrows a value into its 128-bit storage slot
pub fn to_u128_storage(value: U256) -> Result<U128, LendingError> {
    if value > U256::from(u128::MAX) {
        return Err(LendingError::MathOverflow);
    }
    Ok(U128::from(value.low_u128()))
}

/// Widens a 128-bit storage value
pub fn from_u128_storage(value: U128) -> U256 {
    U256::from(value.as_u128())
}
