//! Price oracle consumed by the pool.

use odra::casper_types::U256;
use odra::prelude::*;

/// Prices in base currency, wad
#[odra::external_contract]
pub trait PriceOracle {
    /// Price of one whole token of `asset`
    fn get_asset_price(&self, asset: Address) -> U256;
    /// Price of a single NFT of `collection`
    fn get_token_price(&self, collection: Address, token_id: U256) -> U256;
}
