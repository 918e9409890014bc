//! Events emitted by the lending pool.

use odra::casper_types::U256;
use odra::prelude::*;

/// Fungible supply
#[odra::event]
pub struct Supply {
    pub reserve: Address,
    pub user: Address,
    pub on_behalf_of: Address,
    pub amount: U256,
}

/// Fungible withdrawal
#[odra::event]
pub struct Withdraw {
    pub reserve: Address,
    pub user: Address,
    pub to: Address,
    pub amount: U256,
}

#[odra::event]
pub struct Borrow {
    pub reserve: Address,
    pub user: Address,
    pub on_behalf_of: Address,
    pub amount: U256,
    pub borrow_rate: U256,
}

#[odra::event]
pub struct Repay {
    pub reserve: Address,
    pub user: Address,
    pub repayer: Address,
    pub amount: U256,
}

/// Indices and rates after a reserve update
#[odra::event]
pub struct ReserveDataUpdated {
    pub reserve: Address,
    pub liquidity_rate: U256,
    pub variable_borrow_rate: U256,
    pub liquidity_index: U256,
    pub variable_borrow_index: U256,
}

/// NFTs supplied in one call
#[odra::event]
pub struct SupplyErc721 {
    pub reserve: Address,
    pub user: Address,
    pub on_behalf_of: Address,
    pub token_ids: Vec<U256>,
}

#[odra::event]
pub struct WithdrawErc721 {
    pub reserve: Address,
    pub user: Address,
    pub to: Address,
    pub token_ids: Vec<U256>,
}

#[odra::event]
pub struct CollateralToggled {
    pub reserve: Address,
    pub user: Address,
    pub token_id: Option<U256>,
    pub enabled: bool,
}

#[odra::event]
pub struct AuctionStarted {
    pub user: Address,
    pub collateral_asset: Address,
    pub token_id: Option<U256>,
    pub start_time: u64,
}

#[odra::event]
pub struct AuctionEnded {
    pub user: Address,
    pub collateral_asset: Address,
    pub token_id: Option<U256>,
}

/// Fungible collateral seized
#[odra::event]
pub struct LiquidationCall {
    pub collateral_asset: Address,
    pub debt_asset: Address,
    pub user: Address,
    pub debt_to_cover: U256,
    pub liquidated_collateral_amount: U256,
    pub liquidator: Address,
    pub receive_ptoken: bool,
}

/// NFT seized
#[odra::event]
pub struct LiquidateErc721 {
    pub collateral_asset: Address,
    pub liquidation_asset: Address,
    pub user: Address,
    pub token_id: U256,
    pub liquidation_amount: U256,
    pub debt_repaid: U256,
    pub liquidator: Address,
    pub receive_ntoken: bool,
}

#[odra::event]
pub struct MintedToTreasury {
    pub reserve: Address,
    pub amount_minted: U256,
}

/// Admin reserve update
#[odra::event]
pub struct ReserveConfigured {
    pub asset: Address,
    pub id: u8,
}
