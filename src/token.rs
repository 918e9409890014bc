//! Token contracts the pool moves assets through.

use odra::casper_types::U256;
use odra::prelude::*;

/// Fungible token
#[odra::external_contract]
pub trait FungibleToken {
    /// Moves `amount` from the caller to `recipient`
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    /// Moves `amount` from `owner` to `recipient` on the caller's allowance
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
}

/// NFT collection
#[odra::external_contract]
pub trait NonFungibleToken {
    /// Current owner of `token_id`
    fn owner_of(&self, token_id: U256) -> Address;
    /// Moves `token_id` from `from` to `to`
    fn transfer_from(&mut self, from: Address, to: Address, token_id: U256) -> bool;
}
