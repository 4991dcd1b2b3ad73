//! Collateral Engine
//!
//! Accounting and risk core of an over-collateralized synthetic-asset issuer.
//! Accounts lock registered collateral assets, mint a single debt-tracked
//! synthetic unit against them, and can be liquidated by third parties once
//! their collateral value falls too far.
//!
//! # Architecture
//!
//! - **Oracle Adapter**: wraps one price feed per collateral type, rejects stale rounds
//! - **Ledger**: per-account collateral and debt balances with a rollback journal
//! - **Health Factor**: pure solvency ratio over (debt, collateral value)
//! - **Liquidation**: debt repayment + collateral seizure + bonus for insolvent accounts
//! - **Reentrancy Guard**: one mutating operation at a time, nested entry fails
//!
//! # Invariants
//!
//! - Solvency: every account with debt keeps `health_factor >= min_health_factor`
//!   after every successful mutating operation
//! - Atomicity: a failed operation leaves no ledger mutation and no event behind
//! - Liquidation strictly improves the target's health factor
//!
//! # Example
//!
//! ```no_run
//! use collateral_engine::{AccountId, AssetId, CollateralEngine};
//!
//! fn run(engine: &CollateralEngine) -> collateral_engine::Result<()> {
//!     let alice = AccountId::new("alice");
//!     let weth = AssetId::new("WETH");
//!     let ten = collateral_engine::math::precision() * 10u64;
//!
//!     engine.deposit_and_mint(&alice, &weth, ten, ten * 100u64)?;
//!     println!("health factor: {}", engine.health_factor(&alice)?);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod math;
pub mod error;
pub mod config;
pub mod oracle;
pub mod collaborators;
pub mod registry;
pub mod ledger;
pub mod health;
pub mod guard;
pub mod engine;
pub mod liquidation;
pub mod metrics;

// Re-exports
pub use error::{Error, ErrorCategory, Result};
pub use types::{AccountId, AccountInfo, AccountSnapshot, AssetId, EngineEvent, EventKind};
pub use config::Config;
pub use oracle::{Clock, OracleAdapter, PriceFeed, RoundData, SystemClock};
pub use collaborators::{AssetMover, SyntheticToken};
pub use registry::{CollateralType, SystemRegistry};
pub use engine::CollateralEngine;
pub use liquidation::LiquidationOutcome;
pub use primitive_types::U256;
