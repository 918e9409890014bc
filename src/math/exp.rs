//! Fixed-point natural exponent and logarithm in wad precision.
//!
//! Series are evaluated at ray precision and rounded back to wad. Every step
//! is checked and reports `MathOverflow` instead of wrapping.

use crate::error::LendingError;
use crate::math::common::*;
use crate::math::wad_ray::{ray_div, ray_mul, ray_to_wad, wad_to_ray};
use odra::casper_types::U256;

/// ln(2) in ray precision
const LN2_RAY: u128 = 693_147_180_559_945_309_417_232_121;

/// Upper bound on series terms, both series converge well before it
const MAX_TERMS: u64 = 96;

fn add(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_add(b).ok_or(LendingError::MathOverflow)
}

fn sub(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_sub(b).ok_or(LendingError::MathOverflow)
}

fn mul(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_mul(b).ok_or(LendingError::MathOverflow)
}

fn div(a: U256, b: U256) -> Result<U256, LendingError> {
    a.checked_div(b).ok_or(LendingError::MathOverflow)
}

/// `e^x` for a non negative wad `x`
pub fn exp_wad(x: U256) -> Result<U256, LendingError> {
    let x_ray = wad_to_ray(x)?;
    let ln2 = U256::from(LN2_RAY);
    // e^x = 2^k * e^r with r in [0, ln 2)
    let k = div(x_ray, ln2)?;
    let r = sub(x_ray, mul(k, ln2)?)?;

    let mut sum = ray();
    let mut term = ray();
    for n in 1..MAX_TERMS {
        term = div(div(mul(term, r)?, ray())?, U256::from(n))?;
        if term.is_zero() {
            break;
        }
        sum = add(sum, term)?;
    }

    if k.bits() > 16 || sum.bits() + k.low_u64() as usize > 256 {
        return Err(LendingError::MathOverflow);
    }
    ray_to_wad(sum << k.low_u64() as usize)
}

/// `ln(x)` for a wad `x >= 1`
pub fn ln_wad(x: U256) -> Result<U256, LendingError> {
    if x < wad() {
        return Err(LendingError::MathOverflow);
    }
    let mut m = wad_to_ray(x)?;
    let two = mul(ray(), U256::from(2))?;
    // ln(x) = k * ln 2 + ln(m) with m in [1, 2)
    let mut k = 0u64;
    while m >= two {
        m >>= 1;
        k += 1;
    }

    // ln(m) = 2 * atanh(z), z = (m - 1) / (m + 1)
    let z = ray_div(sub(m, ray())?, add(m, ray())?)?;
    let z_squared = ray_mul(z, z)?;
    let mut series = U256::zero();
    let mut power = z;
    for n in (1..2 * MAX_TERMS).step_by(2) {
        let term = div(power, U256::from(n))?;
        if term.is_zero() {
            break;
        }
        series = add(series, term)?;
        power = ray_mul(power, z_squared)?;
    }

    let whole = mul(U256::from(LN2_RAY), U256::from(k))?;
    ray_to_wad(add(whole, mul(series, U256::from(2))?)?)
}
