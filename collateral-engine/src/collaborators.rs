//! External collaborator interfaces
//!
//! The engine never touches asset or synthetic-token balances directly. It
//! asks these capabilities to move value and treats a `false` result exactly
//! like a fault.

use crate::types::AccountId;
use primitive_types::U256;

/// Moves one collateral asset in and out of custody
pub trait AssetMover: Send + Sync {
    /// Pull `amount` from `from` into `to` (custody)
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: U256) -> bool;

    /// Push `amount` out of custody to `to`
    fn transfer(&self, to: &AccountId, amount: U256) -> bool;
}

/// Synthetic unit issued against collateral
///
/// Mint and burn are owner-only capabilities held by the engine.
pub trait SyntheticToken: Send + Sync {
    /// Asset identifier of the synthetic unit
    fn symbol(&self) -> String;

    /// Mint `amount` to `to`
    fn mint(&self, to: &AccountId, amount: U256) -> bool;

    /// Burn `amount` from the engine's own custody balance
    fn burn(&self, amount: U256) -> bool;

    /// Push `amount` out of the engine's custody balance to `to`
    fn transfer(&self, to: &AccountId, amount: U256) -> bool;

    /// Pull `amount` from `from` into `to`
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: U256) -> bool;
}
