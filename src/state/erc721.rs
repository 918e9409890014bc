//! Supplied NFT positions.

use odra::casper_types::U256;
use odra::prelude::Address;

/// A token held by the pool on behalf of its owner
#[odra::odra_type]
pub struct Erc721Position {
    /// Supplier
    pub owner: Address,
    /// Counted as collateral
    pub is_collateral: bool,
}

/// One token of a `supply_erc721` call
#[odra::odra_type]
pub struct Erc721SupplyParams {
    /// Token id
    pub token_id: U256,
    /// Enable the token as collateral
    pub use_as_collateral: bool,
}
