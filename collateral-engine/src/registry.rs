//! Immutable registry of collateral types
//!
//! Built once from parallel lists of assets, price feeds and asset movers;
//! never mutated afterwards, so it is shared by reference without locking.

use crate::collaborators::{AssetMover, SyntheticToken};
use crate::config::Config;
use crate::oracle::{Clock, OracleAdapter, PriceFeed};
use crate::types::AssetId;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A depositable collateral asset with its price feed and transfer capability
#[derive(Clone)]
pub struct CollateralType {
    asset: AssetId,
    oracle: OracleAdapter,
    mover: Arc<dyn AssetMover>,
}

impl CollateralType {
    /// Asset identifier
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Oracle adapter for this asset
    pub fn oracle(&self) -> &OracleAdapter {
        &self.oracle
    }

    /// Transfer capability for this asset
    pub fn mover(&self) -> &Arc<dyn AssetMover> {
        &self.mover
    }
}

impl fmt::Debug for CollateralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollateralType")
            .field("asset", &self.asset)
            .field("oracle", &self.oracle)
            .finish_non_exhaustive()
    }
}

/// Registered collateral types, in registration order, plus the synthetic token
pub struct SystemRegistry {
    collateral: Vec<CollateralType>,
    index: HashMap<AssetId, usize>,
    synthetic: Arc<dyn SyntheticToken>,
}

impl fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("collateral", &self.collateral)
            .field("synthetic", &self.synthetic.symbol())
            .finish()
    }
}

impl SystemRegistry {
    /// Build the registry
    ///
    /// `assets[i]` is priced by `feeds[i]` and moved by `movers[i]`.
    pub fn new(
        assets: Vec<AssetId>,
        feeds: Vec<Arc<dyn PriceFeed>>,
        movers: Vec<Arc<dyn AssetMover>>,
        synthetic: Arc<dyn SyntheticToken>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Result<Self> {
        if assets.len() != feeds.len() || assets.len() != movers.len() {
            return Err(Error::LengthMismatch {
                assets: assets.len(),
                feeds: feeds.len(),
                movers: movers.len(),
            });
        }

        let mut collateral = Vec::with_capacity(assets.len());
        let mut index = HashMap::with_capacity(assets.len());

        for ((asset, feed), mover) in assets.into_iter().zip(feeds).zip(movers) {
            if index.contains_key(&asset) {
                return Err(Error::DuplicateCollateral(asset));
            }

            let oracle = OracleAdapter::new(
                asset.clone(),
                feed,
                clock.clone(),
                config.oracle.stale_after_secs,
            )?;

            index.insert(asset.clone(), collateral.len());
            collateral.push(CollateralType {
                asset,
                oracle,
                mover,
            });
        }

        tracing::info!(
            "Registered {} collateral types for {}",
            collateral.len(),
            synthetic.symbol()
        );

        Ok(Self {
            collateral,
            index,
            synthetic,
        })
    }

    /// Look up a registered collateral type
    pub fn get(&self, asset: &AssetId) -> Result<&CollateralType> {
        self.index
            .get(asset)
            .map(|&i| &self.collateral[i])
            .ok_or_else(|| Error::NotAllowedToken(asset.clone()))
    }

    /// All collateral types in registration order
    pub fn collateral_types(&self) -> &[CollateralType] {
        &self.collateral
    }

    /// Asset identifiers in registration order
    pub fn assets(&self) -> Vec<AssetId> {
        self.collateral.iter().map(|c| c.asset.clone()).collect()
    }

    /// Synthetic token handle
    pub fn synthetic(&self) -> &Arc<dyn SyntheticToken> {
        &self.synthetic
    }
}
