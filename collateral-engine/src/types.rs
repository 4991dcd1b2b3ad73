//! Core types for the engine
//!
//! Amounts, USD values and health factors are `U256` in 18-decimal fixed point.

use chrono::{DateTime, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier (caller identity)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collateral asset identifier (token symbol or address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Create new asset ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// Collateral moved into custody and credited
    CollateralDeposited = 1,
    /// Collateral debited and moved out of custody
    CollateralRedeemed = 2,
}

/// Append-only observability record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Type of event
    pub kind: EventKind,

    /// Account whose collateral balance changed
    pub account: AccountId,

    /// Other side of the transfer: custody on deposit, recipient on redemption
    pub counterparty: AccountId,

    /// Collateral asset
    pub asset: AssetId,

    /// Amount moved
    pub amount: U256,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,
}

/// Debt and collateral value of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Outstanding synthetic debt
    pub total_debt: U256,

    /// Collateral value in USD (18 decimals)
    pub collateral_value_usd: U256,
}

/// Per-asset balance line in an [`AccountSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPosition {
    /// Collateral asset
    pub asset: AssetId,

    /// Deposited amount
    pub amount: U256,

    /// Value of `amount` in USD (18 decimals)
    pub value_usd: U256,
}

/// Full view of an account, suitable for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account
    pub account: AccountId,

    /// Collateral positions in registration order (zero balances included)
    pub positions: Vec<CollateralPosition>,

    /// Debt and total collateral value
    pub info: AccountInfo,

    /// Raw health factor (18 decimals, `U256::MAX` when debt is zero)
    pub health_factor: U256,

    /// Health factor as a decimal; `None` when unbounded
    pub health_factor_decimal: Option<Decimal>,

    /// Snapshot time
    pub taken_at: DateTime<Utc>,
}

impl AccountSnapshot {
    /// Check if the account may be liquidated under the given minimum
    pub fn is_liquidatable(&self, min_health_factor: U256) -> bool {
        self.health_factor < min_health_factor
    }
}
