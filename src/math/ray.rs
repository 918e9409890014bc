//! Ray type for reserve indices and interest rates

use {
    crate::{
        error::LendingError,
        math::{common::*, wad_ray, TryAdd, TryDiv, TryMul, TrySub, Wad},
    },
    alloc::{format, string::ToString},
    core::fmt,
    odra::casper_types::{U128, U256},
};

/// Index or rate scaled by 10^27
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct Ray(pub U256);

impl Ray {
    /// One (the initial index)
    pub fn one() -> Self {
        Self(ray())
    }

    /// Zero
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Create from a raw scaled value
    pub fn from_scaled_val(scaled_val: U256) -> Self {
        Self(scaled_val)
    }

    /// Create from a 128-bit storage slot
    pub fn from_storage(value: U128) -> Self {
        Self(wad_ray::from_u128_storage(value))
    }

    /// Narrow into a 128-bit storage slot, failing on overflow
    pub fn try_to_storage(&self) -> Result<U128, LendingError> {
        wad_ray::to_u128_storage(self.0)
    }

    /// Raw scaled value
    pub fn to_scaled_val(&self) -> U256 {
        self.0
    }

    /// Is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Scale a plain token amount by this ray: `amount * self / RAY`
    pub fn try_mul_amount(&self, amount: U256) -> Result<U256, LendingError> {
        wad_ray::ray_mul(amount, self.0)
    }

    /// Divide a plain token amount by this ray: `amount * RAY / self`
    pub fn try_div_amount(&self, amount: U256) -> Result<U256, LendingError> {
        wad_ray::ray_div(amount, self.0)
    }

    /// Convert into wad precision
    pub fn try_to_wad(&self) -> Result<Wad, LendingError> {
        Ok(Wad(wad_ray::ray_to_wad(self.0)?))
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scaled_val = self.0.to_string();
        if scaled_val.len() <= RAY_DECIMALS {
            let padding = "0".repeat(RAY_DECIMALS - scaled_val.len());
            scaled_val = format!("0.{}{}", padding, scaled_val);
        } else {
            scaled_val.insert(scaled_val.len() - RAY_DECIMALS, '.');
        }
        f.write_str(&scaled_val)
    }
}

impl TryAdd for Ray {
    fn try_add(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(self.0.checked_add(rhs.0).ok_or(LendingError::MathOverflow)?))
    }
}

impl TrySub for Ray {
    fn try_sub(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(self.0.checked_sub(rhs.0).ok_or(LendingError::MathOverflow)?))
    }
}

impl TryDiv<u64> for Ray {
    fn try_div(self, rhs: u64) -> Result<Self, LendingError> {
        Ok(Self(
            self.0
                .checked_div(U256::from(rhs))
                .ok_or(LendingError::MathOverflow)?,
        ))
    }
}

impl TryDiv<Ray> for Ray {
    fn try_div(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(wad_ray::ray_div(self.0, rhs.0)?))
    }
}

impl TryMul<u64> for Ray {
    fn try_mul(self, rhs: u64) -> Result<Self, LendingError> {
        Ok(Self(
            self.0
                .checked_mul(U256::from(rhs))
                .ok_or(LendingError::MathOverflow)?,
        ))
    }
}

impl TryMul<Ray> for Ray {
    fn try_mul(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(wad_ray::ray_mul(self.0, rhs.0)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ray_display() {
        assert_eq!(Ray::one().to_string(), "1.000000000000000000000000000");
        let five_percent = Ray(U256::from(RAY / 20));
        assert_eq!(five_percent.to_string(), "0.050000000000000000000000000");
    }

    #[test]
    fn test_ray_storage_roundtrip_bounds() {
        let index = Ray(U256::from(RAY) * 3);
        assert_eq!(Ray::from_storage(index.try_to_storage().unwrap()), index);
        let too_wide = Ray(U256::from(u128::MAX) + U256::one());
        assert_eq!(too_wide.try_to_storage(), Err(LendingError::MathOverflow));
    }

    #[test]
    fn test_ray_mul_amount() {
        let index = Ray(U256::from(RAY + RAY / 10));
        assert_eq!(index.try_mul_amount(U256::from(100u8)).unwrap(), U256::from(110u8));
        assert_eq!(index.try_div_amount(U256::from(110u8)).unwrap(), U256::from(100u8));
    }
}
