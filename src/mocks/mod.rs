//! Test doubles for the contracts the pool talks to.

pub mod fungible_token;
pub mod nft;
pub mod position_manager;
pub mod price_oracle;

pub use fungible_token::MockFungibleToken;
pub use nft::MockNft;
pub use position_manager::MockPositionManager;
pub use price_oracle::MockPriceOracle;
