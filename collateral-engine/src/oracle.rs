//! Price oracle adapter
//!
//! Wraps an external round-based price feed for one collateral type. The
//! adapter never caches: every valuation reads the latest round and rejects it
//! when it is stale, inconsistent or non-positive.
//!
//! Feed answers carry the feed's own precision (8 decimals for most USD
//! pairs). They are lifted to 18 decimals before use:
//!
//! ```text
//! price_scaled = answer * 10^(18 - decimals)
//! usd_value    = price_scaled * amount / 1e18
//! token_amount = usd * 1e18 / price_scaled
//! ```

use crate::math::{self, SafeMath};
use crate::types::AssetId;
use crate::{Error, Result};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One round of a price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    /// Round identifier
    pub round_id: u128,

    /// Price at the feed's native precision
    pub answer: i128,

    /// Round start (unix seconds)
    pub started_at: u64,

    /// Last update (unix seconds, 0 if the round never completed)
    pub updated_at: u64,

    /// Round in which the answer was computed
    pub answered_in_round: u128,
}

/// Failure reported by a price feed
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FeedError(pub String);

/// External price feed
pub trait PriceFeed: Send + Sync {
    /// Decimal places of `answer`
    fn decimals(&self) -> u8;

    /// Human readable pair name
    fn description(&self) -> String;

    /// Latest round
    fn latest_round_data(&self) -> std::result::Result<RoundData, FeedError>;
}

/// Time source for staleness checks
pub trait Clock: Send + Sync {
    /// Current unix time in seconds
    fn now(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Validated price at 18 decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    /// Raw answer at feed precision
    pub answer: U256,

    /// Answer lifted to 18 decimals
    pub scaled: U256,

    /// Round update time
    pub updated_at: u64,
}

/// Staleness-checking wrapper around one price feed
#[derive(Clone)]
pub struct OracleAdapter {
    asset: AssetId,
    feed: Arc<dyn PriceFeed>,
    clock: Arc<dyn Clock>,
    stale_after_secs: u64,
    scale: U256,
}

impl fmt::Debug for OracleAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleAdapter")
            .field("asset", &self.asset)
            .field("feed", &self.feed.description())
            .field("stale_after_secs", &self.stale_after_secs)
            .field("scale", &self.scale)
            .finish()
    }
}

impl OracleAdapter {
    /// Create adapter; fails if the feed is more precise than 18 decimals
    pub fn new(
        asset: AssetId,
        feed: Arc<dyn PriceFeed>,
        clock: Arc<dyn Clock>,
        stale_after_secs: u64,
    ) -> Result<Self> {
        let scale = math::feed_scale(feed.decimals())?;
        Ok(Self {
            asset,
            feed,
            clock,
            stale_after_secs,
            scale,
        })
    }

    /// Asset priced by this adapter
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Underlying feed
    pub fn feed(&self) -> &Arc<dyn PriceFeed> {
        &self.feed
    }

    /// Multiplier from feed precision to 18 decimals
    pub fn scale(&self) -> U256 {
        self.scale
    }

    /// Maximum tolerated round age (seconds)
    pub fn stale_after_secs(&self) -> u64 {
        self.stale_after_secs
    }

    /// Latest price, rejecting stale or corrupt rounds
    pub fn latest_price(&self) -> Result<Price> {
        let round = self
            .feed
            .latest_round_data()
            .map_err(|e| Error::OracleUnavailable {
                asset: self.asset.clone(),
                reason: e.to_string(),
            })?;

        self.check_round(&round)?;

        if round.answer <= 0 {
            return Err(Error::InvalidPrice {
                asset: self.asset.clone(),
                answer: round.answer,
            });
        }

        let answer = U256::from(round.answer.unsigned_abs());
        let scaled = answer.safe_mul(self.scale)?;

        Ok(Price {
            answer,
            scaled,
            updated_at: round.updated_at,
        })
    }

    /// USD value (18 decimals) of `amount` collateral units
    pub fn usd_value(&self, amount: U256) -> Result<U256> {
        let price = self.latest_price()?;
        let value = price.scaled.safe_mul(amount)?.safe_div(math::precision())?;
        tracing::debug!(asset = %self.asset, %amount, %value, "Valued collateral");
        Ok(value)
    }

    /// Collateral units worth `usd_amount` (18 decimals)
    pub fn token_amount_from_usd(&self, usd_amount: U256) -> Result<U256> {
        let price = self.latest_price()?;
        usd_amount.safe_mul(math::precision())?.safe_div(price.scaled)
    }

    fn check_round(&self, round: &RoundData) -> Result<()> {
        if round.updated_at == 0 {
            return Err(self.stale("round not complete".to_string()));
        }

        if round.answered_in_round < round.round_id {
            return Err(self.stale(format!(
                "answered in round {} before round {}",
                round.answered_in_round, round.round_id
            )));
        }

        let age = self.clock.now().saturating_sub(round.updated_at);
        if age > self.stale_after_secs {
            return Err(self.stale(format!(
                "age {}s exceeds {}s",
                age, self.stale_after_secs
            )));
        }

        Ok(())
    }

    fn stale(&self, reason: String) -> Error {
        tracing::warn!(asset = %self.asset, %reason, "Rejected oracle round");
        Error::StalePrice {
            asset: self.asset.clone(),
            reason,
        }
    }
}
