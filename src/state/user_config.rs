//! Per-user bitmap of borrowed and collateral reserves.
//!
//! Reserve `i` owns bit `2i` (borrowing) and bit `2i + 1` (used as collateral).

use crate::error::LendingError;
use crate::state::reserve::MAX_RESERVES_COUNT;
use odra::casper_types::U256;

/// User configuration bitmap
#[odra::odra_type]
#[derive(Copy)]
pub struct UserConfiguration {
    /// Raw bits
    pub data: U256,
}

impl UserConfiguration {
    /// Configuration with no bit set
    pub fn empty() -> Self {
        Self { data: U256::zero() }
    }

    fn check_id(reserve_id: u8) -> Result<usize, LendingError> {
        if reserve_id >= MAX_RESERVES_COUNT {
            return Err(LendingError::NoMoreReservesAllowed);
        }
        Ok(reserve_id as usize * 2)
    }

    fn set_bit(&mut self, bit: usize, value: bool) {
        let mask = U256::one() << bit;
        if value {
            self.data = self.data | mask;
        } else {
            self.data = self.data & !mask;
        }
    }

    /// Marks the user as borrowing the reserve
    pub fn set_borrowing(&mut self, reserve_id: u8, borrowing: bool) -> Result<(), LendingError> {
        let bit = Self::check_id(reserve_id)?;
        self.set_bit(bit, borrowing);
        Ok(())
    }

    /// Marks the reserve as collateral of the user
    pub fn set_using_as_collateral(
        &mut self,
        reserve_id: u8,
        using_as_collateral: bool,
    ) -> Result<(), LendingError> {
        let bit = Self::check_id(reserve_id)?;
        self.set_bit(bit + 1, using_as_collateral);
        Ok(())
    }

    /// Borrowing the reserve
    pub fn is_borrowing(&self, reserve_id: u8) -> bool {
        reserve_id < MAX_RESERVES_COUNT && self.data.bit(reserve_id as usize * 2)
    }

    /// Using the reserve as collateral
    pub fn is_using_as_collateral(&self, reserve_id: u8) -> bool {
        reserve_id < MAX_RESERVES_COUNT && self.data.bit(reserve_id as usize * 2 + 1)
    }

    /// Borrowing or using the reserve as collateral
    pub fn is_using_as_collateral_or_borrowing(&self, reserve_id: u8) -> bool {
        self.is_borrowing(reserve_id) || self.is_using_as_collateral(reserve_id)
    }

    /// Borrowing any reserve
    pub fn is_borrowing_any(&self) -> bool {
        !(self.data & borrowing_mask()).is_zero()
    }

    /// No bit set
    pub fn is_empty(&self) -> bool {
        self.data.is_zero()
    }

    /// Bits of reserves with id `reserve_id` and above
    pub fn remaining_from(&self, reserve_id: u8) -> U256 {
        let shift = reserve_id as usize * 2;
        if shift >= 256 {
            U256::zero()
        } else {
            self.data >> shift
        }
    }
}

/// Every borrowing bit
fn borrowing_mask() -> U256 {
    // 0b0101...01
    let mut mask = U256::zero();
    for i in 0..MAX_RESERVES_COUNT as usize {
        mask = mask | (U256::one() << (i * 2));
    }
    mask
}
