use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::LendingError;

/// Minimal NFT collection with operator approvals
#[odra::module(errors = LendingError)]
pub struct MockNft {
    owners: Mapping<U256, Option<Address>>,
    operators: Mapping<(Address, Address), bool>,
}

#[odra::module]
impl MockNft {
    pub fn mint(&mut self, to: Address, token_id: U256) {
        self.owners.set(&token_id, Some(to));
    }

    pub fn set_approval_for_all(&mut self, operator: Address, approved: bool) {
        let owner = self.env().caller();
        self.operators.set(&(owner, operator), approved);
    }

    pub fn owner_of(&self, token_id: U256) -> Address {
        match self.owners.get(&token_id).flatten() {
            Some(owner) => owner,
            None => self.env().revert(LendingError::NotTokenOwner),
        }
    }

    pub fn transfer_from(&mut self, from: Address, to: Address, token_id: U256) -> bool {
        let caller = self.env().caller();
        if self.owners.get(&token_id).flatten() != Some(from) {
            return false;
        }
        if caller != from && !self.operators.get(&(from, caller)).unwrap_or(false) {
            return false;
        }
        self.owners.set(&token_id, Some(to));
        true
    }
}
