//! Liquidation engine
//!
//! A third party repays part of an insolvent account's debt with its own
//! synthetic units and receives the equivalent collateral plus a bonus:
//!
//! ```text
//! token_amount = debt_to_cover * 1e18 / price_scaled
//! bonus        = token_amount * liquidation_bonus / liquidation_precision
//! seized       = token_amount + bonus
//! ```
//!
//! The liquidation must strictly raise the target's health factor and must
//! leave the liquidator solvent.
//!
//! Once an account's collateral is worth no more than `debt * (1 + bonus)`,
//! no liquidation can raise its health factor (or the seizure exceeds the
//! remaining collateral), so every attempt aborts. Such positions carry no
//! liquidation incentive and stay open; this is accepted behaviour.

use crate::engine::{ensure_positive, CollateralEngine};
use crate::health;
use crate::math::{self, SafeMath};
use crate::types::{AccountId, AssetId};
use crate::{Error, Result};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Result of a successful liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// Liquidated account
    pub target: AccountId,

    /// Account that repaid the debt and received collateral
    pub liquidator: AccountId,

    /// Seized collateral asset
    pub asset: AssetId,

    /// Debt repaid (synthetic units)
    pub debt_covered: U256,

    /// Collateral equivalent of `debt_covered`
    pub token_amount: U256,

    /// Bonus collateral paid on top
    pub bonus: U256,

    /// Total collateral transferred to the liquidator
    pub total_seized: U256,

    /// Target health factor before
    pub start_health_factor: U256,

    /// Target health factor after
    pub end_health_factor: U256,
}

impl CollateralEngine {
    /// Repay `debt_to_cover` of `target`'s debt and seize `asset` collateral
    pub fn liquidate(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        target: &AccountId,
        debt_to_cover: U256,
    ) -> Result<LiquidationOutcome> {
        self.execute("liquidate", |op| {
            ensure_positive(debt_to_cover)?;
            let oracle = self.price_feed(asset)?;
            let params = *self.risk_params();

            let start_health_factor = self.health_factor(target)?;
            if health::is_solvent(start_health_factor, &params) {
                return Err(Error::HealthFactorOk);
            }

            let token_amount = oracle.token_amount_from_usd(debt_to_cover)?;
            let bonus = token_amount
                .safe_mul(params.liquidation_bonus)?
                .safe_div(params.liquidation_precision)?;
            let total_seized = token_amount.safe_add(bonus)?;

            // Pull and burn the liquidator's units before any collateral leaves custody
            self.burn_effects(op, debt_to_cover, target, caller)?;
            self.redeem_effects(op, asset, total_seized, target, caller)?;

            let end_health_factor = self.health_factor(target)?;
            if end_health_factor <= start_health_factor {
                return Err(Error::LowHealthFactor(end_health_factor));
            }

            self.assert_solvent(caller)?;

            tracing::debug!(
                "Liquidating {}: {} debt covered by {}, {} {} seized, health factor {} -> {}",
                target,
                debt_to_cover,
                caller,
                total_seized,
                asset,
                display_ratio(start_health_factor),
                display_ratio(end_health_factor)
            );

            Ok(LiquidationOutcome {
                target: target.clone(),
                liquidator: caller.clone(),
                asset: asset.clone(),
                debt_covered: debt_to_cover,
                token_amount,
                bonus,
                total_seized,
                start_health_factor,
                end_health_factor,
            })
        })
    }
}

fn display_ratio(value: U256) -> String {
    match math::to_decimal(value) {
        Some(ratio) => ratio.normalize().to_string(),
        None => "max".to_string(),
    }
}
