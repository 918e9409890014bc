//! Basis point percentage math, 10_000 = 100%.

use crate::error::LendingError;
use crate::math::common::{HALF_PERCENTAGE_FACTOR, PERCENTAGE_FACTOR};
use odra::casper_types::U256;

/// `value * percentage / 10_000`, rounded half up
pub fn percent_mul(value: U256, percentage: u32) -> Result<U256, LendingError> {
    if value.is_zero() || percentage == 0 {
        return Ok(U256::zero());
    }
    value
        .checked_mul(U256::from(percentage))
        .and_then(|product| product.checked_add(U256::from(HALF_PERCENTAGE_FACTOR)))
        .map(|product| product / U256::from(PERCENTAGE_FACTOR))
        .ok_or(LendingError::MathOverflow)
}

/// `value * 10_000 / percentage`, rounded half up
pub fn percent_div(value: U256, percentage: u32) -> Result<U256, LendingError> {
    if percentage == 0 {
        return Err(LendingError::MathOverflow);
    }
    let divisor = U256::from(percentage);
    value
        .checked_mul(U256::from(PERCENTAGE_FACTOR))
        .and_then(|product| product.checked_add(divisor / 2))
        .map(|product| product / divisor)
        .ok_or(LendingError::MathOverflow)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percent_mul_rounds_half_up() {
        assert_eq!(percent_mul(U256::from(1_000u32), 8_500).unwrap(), U256::from(850u32));
        // 3 * 50% = 1.5 -> 2
        assert_eq!(percent_mul(U256::from(3u8), 5_000).unwrap(), U256::from(2u8));
        assert_eq!(percent_mul(U256::from(3u8), 0).unwrap(), U256::zero());
    }

    #[test]
    fn percent_div_inverts_percent_mul() {
        let amount = U256::from(1_050u32);
        assert_eq!(percent_div(amount, 10_500).unwrap(), U256::from(1_000u32));
        assert_eq!(percent_div(amount, 0), Err(LendingError::MathOverflow));
    }

    #[test]
    fn percent_overflow_is_detected() {
        assert_eq!(percent_mul(U256::MAX, 2), Err(LendingError::MathOverflow));
        assert_eq!(percent_div(U256::MAX, 2), Err(LendingError::MathOverflow));
    }
}
