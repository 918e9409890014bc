use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::processor::LendingPoolContractRef;

/// Minimal fungible token, optionally calling back into the pool on transfer
#[odra::module(events = [Transfer])]
pub struct MockFungibleToken {
    symbol: Var<String>,
    decimals: Var<u8>,
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    reenter_pool: Var<Option<Address>>,
}

#[odra::module]
impl MockFungibleToken {
    pub fn init(&mut self, symbol: String, decimals: u8) {
        self.symbol.set(symbol);
        self.decimals.set(decimals);
    }

    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
    }

    /// Makes the next outgoing transfer call `withdraw` on `pool`
    pub fn arm_reentrancy(&mut self, pool: Address) {
        self.reenter_pool.set(Some(pool));
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        if !self.move_balance(sender, recipient, amount) {
            return false;
        }
        if let Some(pool) = self.reenter_pool.get().flatten() {
            self.reenter_pool.set(None);
            let token = self.env().self_address();
            LendingPoolContractRef::new(self.env(), pool).withdraw(token, amount, token);
        }
        true
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return false;
        }
        if !self.move_balance(owner, recipient, amount) {
            return false;
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        true
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }
}

impl MockFungibleToken {
    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return false;
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
        self.env().emit_event(Transfer { from, to, amount });
        true
    }
}

#[odra::event]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}
