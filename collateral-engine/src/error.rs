//! Error types for the engine

use crate::types::{AccountId, AssetId};
use primitive_types::U256;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Zero amount passed to an operation
    #[error("Amount must be more than zero")]
    MustBeMoreThanZero,

    /// Asset is not a registered collateral type
    #[error("Token not allowed as collateral: {0}")]
    NotAllowedToken(AssetId),

    /// Registry inputs of different length
    #[error("Length mismatch: {assets} assets, {feeds} price feeds, {movers} asset movers")]
    LengthMismatch {
        /// Number of assets
        assets: usize,
        /// Number of price feeds
        feeds: usize,
        /// Number of asset movers
        movers: usize,
    },

    /// Same asset registered twice
    #[error("Collateral registered twice: {0}")]
    DuplicateCollateral(AssetId),

    /// External asset transfer reported failure
    #[error("Transfer of {asset} from {from} to {to} failed")]
    TransferFailed {
        /// Asset (collateral or synthetic)
        asset: AssetId,
        /// Source account
        from: AccountId,
        /// Destination account
        to: AccountId,
    },

    /// Synthetic token refused to mint
    #[error("Synthetic mint failed")]
    MintFailed,

    /// Synthetic token refused to burn
    #[error("Synthetic burn failed")]
    BurnFailed,

    /// Health factor below the minimum (carries the computed ratio)
    #[error("Health factor too low: {0}")]
    LowHealthFactor(U256),

    /// Liquidation attempted on a solvent account
    #[error("Health factor is ok, account cannot be liquidated")]
    HealthFactorOk,

    /// Mutating operation entered while another one is in progress
    #[error("Reentrant call blocked")]
    ReentrancyBlocked,

    /// Oracle round older than the staleness bound, or inconsistent
    #[error("Stale price for {asset}: {reason}")]
    StalePrice {
        /// Collateral asset
        asset: AssetId,
        /// What made the round unusable
        reason: String,
    },

    /// Oracle answered with a zero or negative price
    #[error("Invalid price for {asset}: {answer}")]
    InvalidPrice {
        /// Collateral asset
        asset: AssetId,
        /// Raw feed answer
        answer: i128,
    },

    /// Price feed call failed
    #[error("Oracle unavailable for {asset}: {reason}")]
    OracleUnavailable {
        /// Collateral asset
        asset: AssetId,
        /// Feed error message
        reason: String,
    },

    /// Arithmetic fault (overflow, underflow on insufficient balance, division by zero)
    #[error("Arithmetic fault: {0}")]
    Arithmetic(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error taxonomy used for metrics and caller retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any state mutation; retry with valid input
    InputValidation,
    /// Transfer, mint or burn refused by a collaborator
    Collaborator,
    /// Health factor below minimum
    Solvency,
    /// Liquidation of a solvent account
    LiquidationPrecondition,
    /// Nested call into a guarded operation
    Reentrancy,
    /// Price feed stale, corrupt or unreachable
    Oracle,
    /// Overflow, underflow or division by zero
    ArithmeticFault,
    /// Bad configuration or construction input
    Configuration,
}

impl ErrorCategory {
    /// Label used in metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InputValidation => "input_validation",
            ErrorCategory::Collaborator => "collaborator",
            ErrorCategory::Solvency => "solvency",
            ErrorCategory::LiquidationPrecondition => "liquidation_precondition",
            ErrorCategory::Reentrancy => "reentrancy",
            ErrorCategory::Oracle => "oracle",
            ErrorCategory::ArithmeticFault => "arithmetic_fault",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl Error {
    /// Taxonomy bucket of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MustBeMoreThanZero
            | Error::NotAllowedToken(_)
            | Error::LengthMismatch { .. } => ErrorCategory::InputValidation,
            Error::TransferFailed { .. } | Error::MintFailed | Error::BurnFailed => {
                ErrorCategory::Collaborator
            }
            Error::LowHealthFactor(_) => ErrorCategory::Solvency,
            Error::HealthFactorOk => ErrorCategory::LiquidationPrecondition,
            Error::ReentrancyBlocked => ErrorCategory::Reentrancy,
            Error::StalePrice { .. }
            | Error::InvalidPrice { .. }
            | Error::OracleUnavailable { .. } => ErrorCategory::Oracle,
            Error::Arithmetic(_) => ErrorCategory::ArithmeticFault,
            Error::DuplicateCollateral(_) | Error::Config(_) | Error::Io(_) => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Faults the caller cannot fix by resubmitting the same request
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Arithmetic(_) | Error::ReentrancyBlocked)
    }
}
