//! Shared scalers and arithmetic traits for the fixed-point types.

use crate::error::LendingError;
use odra::casper_types::U256;

/// Decimals of a wad
pub const WAD_DECIMALS: usize = 18;
/// Decimals of a ray
pub const RAY_DECIMALS: usize = 27;
/// Identity in wad precision
pub const WAD: u128 = 1_000_000_000_000_000_000;
/// Half of the wad identity
pub const HALF_WAD: u128 = 500_000_000_000_000_000;
/// Identity in ray precision
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;
/// Half of the ray identity
pub const HALF_RAY: u128 = 500_000_000_000_000_000_000_000_000;
/// Ratio between ray and wad
pub const WAD_RAY_RATIO: u128 = 1_000_000_000;
/// 100% in basis points
pub const PERCENTAGE_FACTOR: u32 = 10_000;
/// Half of 100% in basis points
pub const HALF_PERCENTAGE_FACTOR: u32 = 5_000;
/// Seconds in a 365 day year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Wad identity as `U256`
pub fn wad() -> U256 {
    U256::from(WAD)
}

/// Ray identity as `U256`
pub fn ray() -> U256 {
    U256::from(RAY)
}

/// Try to subtract, return an error on underflow
pub trait TrySub: Sized {
    /// Subtract
    fn try_sub(self, rhs: Self) -> Result<Self, LendingError>;
}

/// Try to add, return an error on overflow
pub trait TryAdd: Sized {
    /// Add
    fn try_add(self, rhs: Self) -> Result<Self, LendingError>;
}

/// Try to divide, return an error on overflow or divide by zero
pub trait TryDiv<RHS>: Sized {
    /// Divide
    fn try_div(self, rhs: RHS) -> Result<Self, LendingError>;
}

/// Try to multiply, return an error on overflow
pub trait TryMul<RHS>: Sized {
    /// Multiply
    fn try_mul(self, rhs: RHS) -> Result<Self, LendingError>;
}

impl TryAdd for U256 {
    fn try_add(self, rhs: Self) -> Result<Self, LendingError> {
        self.checked_add(rhs).ok_or(LendingError::MathOverflow)
    }
}

impl TrySub for U256 {
    fn try_sub(self, rhs: Self) -> Result<Self, LendingError> {
        self.checked_sub(rhs).ok_or(LendingError::MathOverflow)
    }
}
