//! Error types

use core::fmt;
use odra::prelude::*;

/// Errors that may be returned by the lending pool.
#[odra::odra_error]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LendingError {
    // 0
    /// Input amount is invalid
    InvalidAmount = 0,
    /// Input config value is invalid
    InvalidConfig = 1,
    /// Math operation overflow
    MathOverflow = 2,
    /// Caller is not the pool admin
    CallerNotAdmin = 3,
    /// Another operation is already in progress
    ReentrancyDetected = 4,

    // 10
    /// Reserve is already initialized
    ReserveAlreadyInitialized = 10,
    /// Asset is not listed
    ReserveNotListed = 11,
    /// Reserve is not active
    ReserveInactive = 12,
    /// Reserve is frozen
    ReserveFrozen = 13,
    /// Reserve is paused
    ReservePaused = 14,

    // 15
    /// Borrowing is not enabled on the reserve
    BorrowingNotEnabled = 15,
    /// Supply cap exceeded
    SupplyCapExceeded = 16,
    /// Borrow cap exceeded
    BorrowCapExceeded = 17,
    /// Maximum number of reserves reached
    NoMoreReservesAllowed = 18,
    /// Operation not supported for the reserve asset type
    InvalidAssetType = 19,

    // 20
    /// Insufficient liquidity available
    InsufficientLiquidity = 20,
    /// User balance is lower than the requested amount
    NotEnoughAvailableUserBalance = 21,
    /// User does not have debt in the reserve
    NoDebtOfSelectedType = 22,
    /// User has no balance in the reserve
    UnderlyingBalanceZero = 23,
    /// Collateral balance is zero
    CollateralBalanceIsZero = 24,

    // 25
    /// Collateral cannot cover the new borrow
    CollateralCannotCoverNewBorrow = 25,
    /// Health factor would drop below the liquidation threshold
    HealthFactorLowerThanLiquidationThreshold = 26,
    /// Loan to value bound violated
    LtvValidationFailed = 27,
    /// Oracle returned an invalid price
    InvalidOraclePrice = 28,
    /// Token transfer failed
    TokenTransferFailed = 29,

    // 30
    /// Caller does not own the token
    NotTokenOwner = 30,
    /// Token is already supplied to the pool
    TokenAlreadySupplied = 31,
    /// Token is not supplied to the pool
    TokenNotSupplied = 32,

    // 40
    /// Asset is not configured for auctions
    NotAuctionableAsset = 40,
    /// Health factor is not below the threshold
    HealthFactorAboveThreshold = 41,
    /// An auction is already running for the collateral unit
    AlreadyAuctioned = 42,
    /// No auction is running for the collateral unit
    AuctionNotStarted = 43,
    /// Collateral unit is being auctioned
    AuctionInProgress = 44,

    // 45
    /// Liquidator cannot liquidate its own position
    LiquidatorIsBorrower = 45,
    /// Partial liquidation is not allowed for the collateral
    PartialLiquidationNotAllowed = 46,
    /// Collateral is not enabled for the user
    CollateralCannotBeLiquidated = 47,
    /// Health factor has not recovered enough to end the auction
    AuctionRecoveryHealthFactorNotReached = 48,
}

/// Broad failure classes used by callers to decide how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fixed-point value exceeded its width
    ArithmeticOverflow,
    /// Operation not valid in the current state
    InvalidState,
    /// Caller is not allowed to perform the operation
    Authorization,
    /// Amount exceeds what is available
    InsufficientBalance,
    /// Asset or reserve misconfigured or not usable
    Configuration,
}

impl LendingError {
    /// Human readable message
    pub fn message(&self) -> &str {
        match self {
            LendingError::InvalidAmount => "Input amount is invalid",
            LendingError::InvalidConfig => "Input config value is invalid",
            LendingError::MathOverflow => "Math operation overflow",
            LendingError::CallerNotAdmin => "Caller is not the pool admin",
            LendingError::ReentrancyDetected => "Another operation is in progress",
            LendingError::ReserveAlreadyInitialized => "Reserve is already initialized",
            LendingError::ReserveNotListed => "Asset is not listed",
            LendingError::ReserveInactive => "Reserve is not active",
            LendingError::ReserveFrozen => "Reserve is frozen",
            LendingError::ReservePaused => "Reserve is paused",
            LendingError::BorrowingNotEnabled => "Borrowing is not enabled",
            LendingError::SupplyCapExceeded => "Supply cap exceeded",
            LendingError::BorrowCapExceeded => "Borrow cap exceeded",
            LendingError::NoMoreReservesAllowed => "Maximum number of reserves reached",
            LendingError::InvalidAssetType => "Operation not supported for this asset type",
            LendingError::InsufficientLiquidity => "Insufficient liquidity available",
            LendingError::NotEnoughAvailableUserBalance => "User balance is not enough",
            LendingError::NoDebtOfSelectedType => "User has no debt in the reserve",
            LendingError::UnderlyingBalanceZero => "User has no balance in the reserve",
            LendingError::CollateralBalanceIsZero => "Collateral balance is zero",
            LendingError::CollateralCannotCoverNewBorrow => "Collateral cannot cover new borrow",
            LendingError::HealthFactorLowerThanLiquidationThreshold => {
                "Health factor is lower than the liquidation threshold"
            }
            LendingError::LtvValidationFailed => "Loan to value validation failed",
            LendingError::InvalidOraclePrice => "Oracle price is invalid",
            LendingError::TokenTransferFailed => "Token transfer failed",
            LendingError::NotTokenOwner => "Caller is not the token owner",
            LendingError::TokenAlreadySupplied => "Token is already supplied",
            LendingError::TokenNotSupplied => "Token is not supplied",
            LendingError::NotAuctionableAsset => "Asset is not auctionable",
            LendingError::HealthFactorAboveThreshold => "Health factor is not below the threshold",
            LendingError::AlreadyAuctioned => "Collateral is already auctioned",
            LendingError::AuctionNotStarted => "Auction has not started",
            LendingError::AuctionInProgress => "Collateral is being auctioned",
            LendingError::LiquidatorIsBorrower => "Liquidator cannot be the borrower",
            LendingError::PartialLiquidationNotAllowed => "Partial liquidation is not allowed",
            LendingError::CollateralCannotBeLiquidated => "Collateral cannot be liquidated",
            LendingError::AuctionRecoveryHealthFactorNotReached => {
                "Health factor has not reached the auction recovery threshold"
            }
        }
    }

    /// Failure class of the error
    pub fn kind(&self) -> ErrorKind {
        use LendingError::*;
        match self {
            MathOverflow => ErrorKind::ArithmeticOverflow,
            ReentrancyDetected
            | ReserveAlreadyInitialized
            | HealthFactorAboveThreshold
            | AlreadyAuctioned
            | AuctionNotStarted
            | AuctionInProgress
            | TokenAlreadySupplied
            | TokenNotSupplied
            | TokenTransferFailed
            | AuctionRecoveryHealthFactorNotReached => ErrorKind::InvalidState,
            CallerNotAdmin | NotTokenOwner | LiquidatorIsBorrower => ErrorKind::Authorization,
            InsufficientLiquidity
            | NotEnoughAvailableUserBalance
            | NoDebtOfSelectedType
            | UnderlyingBalanceZero
            | CollateralBalanceIsZero
            | CollateralCannotCoverNewBorrow
            | HealthFactorLowerThanLiquidationThreshold
            | LtvValidationFailed
            | PartialLiquidationNotAllowed
            | SupplyCapExceeded
            | BorrowCapExceeded => ErrorKind::InsufficientBalance,
            InvalidAmount
            | InvalidConfig
            | ReserveNotListed
            | ReserveInactive
            | ReserveFrozen
            | ReservePaused
            | BorrowingNotEnabled
            | NoMoreReservesAllowed
            | InvalidAssetType
            | InvalidOraclePrice
            | NotAuctionableAsset
            | CollateralCannotBeLiquidated => ErrorKind::Configuration,
        }
    }
}

impl fmt::Display for LendingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
