//! Strategies selected per reserve: interest rates, auction pricing and
//! dynamic NFT configuration.

pub mod auction;
pub mod dynamic_config;
pub mod interest_rate;

pub use auction::{AuctionCurve, AuctionPricing, AuctionStrategy, AuctionStrategyParams};
pub use dynamic_config::{DynamicConfigStrategy, PositionConstituent};
pub use interest_rate::{InterestRateModel, InterestRateStrategy, RateStrategyKind};
