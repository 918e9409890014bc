//! Pure pool logic: account valuation, validation and liquidation math.

pub mod generic;
pub mod liquidation;
pub mod validation;

pub use generic::{calculate_user_account_data, AccountDataProvider, BalanceChange, UserAccountData, UserAccountParams};
