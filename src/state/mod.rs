//! Persistent state records of the pool

pub mod auction;
pub mod erc721;
pub mod reserve;
pub mod user_config;

pub use auction::*;
pub use erc721::*;
pub use reserve::*;
pub use user_config::*;
