//! Wad type for prices, health factors and auction multipliers

#![allow(clippy::manual_range_contains)]

use {
    crate::{
        error::LendingError,
        math::{common::*, wad_ray, TryAdd, TryDiv, TryMul, TrySub},
    },
    alloc::{string::ToString, vec},
    core::fmt,
    odra::casper_types::U256,
};

/// Large decimal values, precise to 18 digits
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord)]
pub struct Wad(pub U256);

impl Wad {
    /// One
    pub fn one() -> Self {
        Self(wad())
    }

    /// Zero
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Largest representable value, used as the health factor of a debt free account
    pub fn max() -> Self {
        Self(U256::MAX)
    }

    /// Create from a raw scaled value
    pub fn from_scaled_val(scaled_val: U256) -> Self {
        Self(scaled_val)
    }

    /// Raw scaled value
    pub fn to_scaled_val(&self) -> U256 {
        self.0
    }

    /// Create from a whole number of units
    pub fn try_from_units(units: u64) -> Result<Self, LendingError> {
        Ok(Self(
            wad()
                .checked_mul(U256::from(units))
                .ok_or(LendingError::MathOverflow)?,
        ))
    }

    /// Round down to whole units
    pub fn floor_units(&self) -> U256 {
        self.0 / wad()
    }

    /// Is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scaled_val = self.0.to_string();
        if scaled_val.len() <= WAD_DECIMALS {
            scaled_val.insert_str(0, &vec!["0"; WAD_DECIMALS - scaled_val.len()].join(""));
            scaled_val.insert_str(0, "0.");
        } else {
            scaled_val.insert(scaled_val.len() - WAD_DECIMALS, '.');
        }
        f.write_str(&scaled_val)
    }
}

impl TryAdd for Wad {
    fn try_add(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(self.0.checked_add(rhs.0).ok_or(LendingError::MathOverflow)?))
    }
}

impl TrySub for Wad {
    fn try_sub(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(self.0.checked_sub(rhs.0).ok_or(LendingError::MathOverflow)?))
    }
}

impl TryDiv<u64> for Wad {
    fn try_div(self, rhs: u64) -> Result<Self, LendingError> {
        Ok(Self(
            self.0
                .checked_div(U256::from(rhs))
                .ok_or(LendingError::MathOverflow)?,
        ))
    }
}

impl TryDiv<Wad> for Wad {
    fn try_div(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(wad_ray::wad_div(self.0, rhs.0)?))
    }
}

impl TryMul<u64> for Wad {
    fn try_mul(self, rhs: u64) -> Result<Self, LendingError> {
        Ok(Self(
            self.0
                .checked_mul(U256::from(rhs))
                .ok_or(LendingError::MathOverflow)?,
        ))
    }
}

impl TryMul<Wad> for Wad {
    fn try_mul(self, rhs: Self) -> Result<Self, LendingError> {
        Ok(Self(wad_ray::wad_mul(self.0, rhs.0)?))
    }
}
