//! Fixed-point constants and checked arithmetic
//!
//! Every value the engine computes is an unsigned 256-bit integer scaled by
//! [`PRECISION`]. Overflow, underflow and division by zero are arithmetic
//! faults: they abort the operation, they are never clamped.

use crate::{Error, Result};
use primitive_types::U256;
use rust_decimal::Decimal;
use std::panic::Location;

/// 18-decimal fixed-point unit
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Decimal places of the internal fixed-point representation
pub const PRECISION_DECIMALS: u8 = 18;

/// Share of collateral value counted towards solvency (out of `LIQUIDATION_PRECISION`)
pub const LIQUIDATION_THRESHOLD: u64 = 50;

/// Collateral bonus paid to liquidators (out of `LIQUIDATION_PRECISION`)
pub const LIQUIDATION_BONUS: u64 = 10;

/// Denominator for threshold and bonus
pub const LIQUIDATION_PRECISION: u64 = 100;

/// Minimum solvent health factor (1.0)
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

/// Default maximum age of an oracle round (3 hours)
pub const STALE_AFTER_SECS: u64 = 3 * 60 * 60;

/// `PRECISION` as `U256`
pub fn precision() -> U256 {
    U256::from(PRECISION)
}

/// Scale that lifts a feed's native precision to 18 decimals (`10^(18 - decimals)`)
pub fn feed_scale(decimals: u8) -> Result<U256> {
    if decimals > PRECISION_DECIMALS {
        return Err(Error::Config(format!(
            "Feed precision {} exceeds internal precision {}",
            decimals, PRECISION_DECIMALS
        )));
    }
    Ok(U256::exp10(usize::from(PRECISION_DECIMALS - decimals)))
}

/// Render a fixed-point value as a decimal with 18 places
///
/// Returns `None` when the value exceeds what `Decimal` can hold.
pub fn to_decimal(value: U256) -> Option<Decimal> {
    if value > U256::from(u128::MAX) {
        return None;
    }
    let raw = i128::try_from(value.as_u128()).ok()?;
    Decimal::try_from_i128_with_scale(raw, u32::from(PRECISION_DECIMALS)).ok()
}

/// Checked arithmetic that reports the faulting call site
pub trait SafeMath: Sized {
    /// Addition, failing on overflow
    fn safe_add(self, rhs: Self) -> Result<Self>;
    /// Subtraction, failing on underflow
    fn safe_sub(self, rhs: Self) -> Result<Self>;
    /// Multiplication, failing on overflow
    fn safe_mul(self, rhs: Self) -> Result<Self>;
    /// Truncating division, failing on a zero divisor
    fn safe_div(self, rhs: Self) -> Result<Self>;
}

#[track_caller]
fn fault(kind: &'static str) -> Error {
    let caller = Location::caller();
    tracing::error!("Math {} at {}:{}", kind, caller.file(), caller.line());
    Error::Arithmetic(kind)
}

impl SafeMath for U256 {
    #[track_caller]
    #[inline(always)]
    fn safe_add(self, rhs: U256) -> Result<U256> {
        match self.checked_add(rhs) {
            Some(result) => Ok(result),
            None => Err(fault("overflow")),
        }
    }

    #[track_caller]
    #[inline(always)]
    fn safe_sub(self, rhs: U256) -> Result<U256> {
        match self.checked_sub(rhs) {
            Some(result) => Ok(result),
            None => Err(fault("underflow")),
        }
    }

    #[track_caller]
    #[inline(always)]
    fn safe_mul(self, rhs: U256) -> Result<U256> {
        match self.checked_mul(rhs) {
            Some(result) => Ok(result),
            None => Err(fault("overflow")),
        }
    }

    #[track_caller]
    #[inline(always)]
    fn safe_div(self, rhs: U256) -> Result<U256> {
        match self.checked_div(rhs) {
            Some(result) => Ok(result),
            None => Err(fault("division by zero")),
        }
    }
}
