//! Auction records and the pool's recovery policy.

use crate::strategy::AuctionStrategy;
use odra::casper_types::U256;
use odra::prelude::Address;

/// What happens to an auction once the borrower is healthy again
#[odra::odra_type]
#[derive(Copy)]
pub enum AuctionRecoveryPolicy {
    /// The record stays until `end_auction` is called or the unit is seized
    ExplicitEnd,
    /// A settlement that lifts the health factor to the recovery threshold also ends the auction
    EndOnRecovery,
}

/// Snapshot taken when an auction starts
#[odra::odra_type]
#[derive(Copy)]
pub struct AuctionRecord {
    /// Start timestamp, seconds
    pub start_time: u64,
    /// Tick length of the strategy at start, seconds
    pub tick_length: u64,
}

impl AuctionRecord {
    /// Starts an auction at `now` for `strategy`
    pub fn start(now: u64, strategy: &AuctionStrategy) -> Self {
        Self {
            start_time: now,
            tick_length: strategy.params.tick_length,
        }
    }
}

/// Public view of a running auction
#[odra::odra_type]
pub struct AuctionData {
    /// Borrower
    pub user: Address,
    /// Collateral asset
    pub asset: Address,
    /// Token id for NFT collateral
    pub token_id: Option<U256>,
    /// Start timestamp, seconds
    pub start_time: u64,
    /// Tick length, seconds
    pub tick_length: u64,
    /// Current price multiplier, wad
    pub current_price_multiplier: U256,
}
