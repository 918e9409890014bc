use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::LendingError;

/// Admin fed price oracle
#[odra::module(events = [PriceUpdated], errors = LendingError)]
pub struct MockPriceOracle {
    admin: Var<Address>,
    asset_prices: Mapping<Address, U256>,
    // per token prices override the collection floor
    token_prices: Mapping<(Address, U256), U256>,
    floor_prices: Mapping<Address, U256>,
}

#[odra::module]
impl MockPriceOracle {
    /// Initialize the oracle with the account allowed to feed prices
    pub fn init(&mut self, admin: Address) {
        self.admin.set(admin);
    }

    /// Set the price of a fungible asset, wad per whole token
    pub fn set_asset_price(&mut self, asset: Address, price: U256) {
        self.only_admin();
        self.asset_prices.set(&asset, price);
        self.env().emit_event(PriceUpdated {
            asset,
            token_id: None,
            price,
        });
    }

    /// Set the floor price of a collection
    pub fn set_floor_price(&mut self, collection: Address, price: U256) {
        self.only_admin();
        self.floor_prices.set(&collection, price);
        self.env().emit_event(PriceUpdated {
            asset: collection,
            token_id: None,
            price,
        });
    }

    /// Set the price of a single NFT
    pub fn set_token_price(&mut self, collection: Address, token_id: U256, price: U256) {
        self.only_admin();
        self.token_prices.set(&(collection, token_id), price);
        self.env().emit_event(PriceUpdated {
            asset: collection,
            token_id: Some(token_id),
            price,
        });
    }

    /// Price of a fungible asset, zero when unknown
    pub fn get_asset_price(&self, asset: Address) -> U256 {
        self.asset_prices.get(&asset).unwrap_or_default()
    }

    /// Price of an NFT, the collection floor when the token has no own price
    pub fn get_token_price(&self, collection: Address, token_id: U256) -> U256 {
        self.token_prices
            .get(&(collection, token_id))
            .or_else(|| self.floor_prices.get(&collection))
            .unwrap_or_default()
    }
}

impl MockPriceOracle {
    fn only_admin(&self) {
        if self.admin.get() != Some(self.env().caller()) {
            self.env().revert(LendingError::CallerNotAdmin);
        }
    }
}

#[odra::event]
pub struct PriceUpdated {
    pub asset: Address,
    pub token_id: Option<U256>,
    pub price: U256,
}
