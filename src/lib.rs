#![allow(clippy::arithmetic_side_effects)]
#![warn(missing_docs)]
#![cfg_attr(target_arch = "wasm32", no_std)]

//! NFT collateral lending pool for the casper blockchain.

extern crate alloc;

pub mod error;
pub mod events;
pub mod logic;
pub mod math;
#[allow(missing_docs)]
pub mod mocks;
pub mod oracle;
pub mod processor;
pub mod state;
pub mod strategy;
pub mod token;

#[cfg(test)]
mod tests;
