//! Health factor engine
//!
//! ```text
//! adjusted      = collateral_usd * threshold / liquidation_precision
//! health_factor = adjusted * 1e18 / debt
//! ```
//!
//! Both divisions truncate toward zero. Zero debt is unbounded solvency and
//! reports `U256::MAX`.

use crate::config::RiskConfig;
use crate::math::{self, SafeMath};
use crate::{Error, Result};
use primitive_types::U256;

/// Solvency parameters in fixed-point form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParams {
    /// Share of collateral value counted towards solvency
    pub liquidation_threshold: U256,

    /// Liquidator bonus share
    pub liquidation_bonus: U256,

    /// Denominator for threshold and bonus
    pub liquidation_precision: U256,

    /// Minimum solvent health factor
    pub min_health_factor: U256,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self::from(&RiskConfig::default())
    }
}

impl From<&RiskConfig> for RiskParams {
    fn from(config: &RiskConfig) -> Self {
        Self {
            liquidation_threshold: U256::from(config.liquidation_threshold),
            liquidation_bonus: U256::from(config.liquidation_bonus),
            liquidation_precision: U256::from(config.liquidation_precision),
            min_health_factor: U256::from(config.min_health_factor),
        }
    }
}

/// Health factor of a position
pub fn health_factor(total_debt: U256, collateral_usd: U256, params: &RiskParams) -> Result<U256> {
    if total_debt.is_zero() {
        return Ok(U256::MAX);
    }

    let adjusted = collateral_usd
        .safe_mul(params.liquidation_threshold)?
        .safe_div(params.liquidation_precision)?;

    adjusted.safe_mul(math::precision())?.safe_div(total_debt)
}

/// Whether a health factor meets the minimum
pub fn is_solvent(health_factor: U256, params: &RiskParams) -> bool {
    health_factor >= params.min_health_factor
}

/// Fail with [`Error::LowHealthFactor`] below the minimum
pub fn ensure_solvent(health_factor: U256, params: &RiskParams) -> Result<()> {
    if is_solvent(health_factor, params) {
        Ok(())
    } else {
        Err(Error::LowHealthFactor(health_factor))
    }
}
