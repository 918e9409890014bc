use odra::casper_types::U256;
use odra::prelude::*;

use crate::strategy::PositionConstituent;

/// Position NFT source whose constituents are set directly
#[odra::module]
pub struct MockPositionManager {
    positions: Mapping<U256, Vec<PositionConstituent>>,
}

#[odra::module]
impl MockPositionManager {
    pub fn set_position(&mut self, token_id: U256, constituents: Vec<PositionConstituent>) {
        self.positions.set(&token_id, constituents);
    }

    pub fn position_constituents(&self, token_id: U256) -> Vec<PositionConstituent> {
        self.positions.get(&token_id).unwrap_or_default()
    }
}
