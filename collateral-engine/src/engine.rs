//! Operation orchestration
//!
//! Every public mutating operation runs through `CollateralEngine::execute`:
//!
//! 1. Acquire the reentrancy guard
//! 2. Validate input
//! 3. Apply ledger effects through a journaled [`LedgerTx`] and check solvency
//! 4. Perform the queued collaborator interactions in order
//! 5. Commit, or drop the transaction (rolling back every effect) on the first error
//!
//! Collaborators are only called in step 4, after all checks have passed, and
//! the ledger lock is never held while they run. Operations queue pulls before
//! pushes and mints. When an interaction fails, the ones that already
//! succeeded are reversed newest first before the error is returned:
//!
//! ```text
//! PullCollateral  <-> PushCollateral
//! PullSynthetic   <-> PushSynthetic
//! MintSynthetic    -> PullSynthetic + BurnSynthetic
//! BurnSynthetic    -> MintSynthetic (to custody)
//! ```

use crate::collaborators::SyntheticToken;
use crate::config::Config;
use crate::guard::ReentrancyGuard;
use crate::health::{self, RiskParams};
use crate::ledger::{Ledger, LedgerTx};
use crate::math::{self, SafeMath};
use crate::metrics::Metrics;
use crate::oracle::OracleAdapter;
use crate::registry::SystemRegistry;
use crate::types::{
    AccountId, AccountInfo, AccountSnapshot, AssetId, CollateralPosition, EngineEvent, EventKind,
};
use crate::{Error, Result};
use chrono::Utc;
use primitive_types::U256;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Collaborator call queued by an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Interaction {
    /// Pull collateral from an account into custody
    PullCollateral {
        asset: AssetId,
        from: AccountId,
        amount: U256,
    },
    /// Push collateral out of custody
    PushCollateral {
        asset: AssetId,
        to: AccountId,
        amount: U256,
    },
    /// Mint synthetic units
    MintSynthetic { to: AccountId, amount: U256 },
    /// Pull synthetic units into custody
    PullSynthetic { from: AccountId, amount: U256 },
    /// Push synthetic units out of custody
    PushSynthetic { to: AccountId, amount: U256 },
    /// Burn synthetic units held in custody
    BurnSynthetic { amount: U256 },
}

impl Interaction {
    /// Interactions that undo this one once it has succeeded
    pub(crate) fn reversal(&self, custody: &AccountId) -> Vec<Interaction> {
        match self {
            Interaction::PullCollateral {
                asset,
                from,
                amount,
            } => vec![Interaction::PushCollateral {
                asset: asset.clone(),
                to: from.clone(),
                amount: *amount,
            }],
            Interaction::PushCollateral { asset, to, amount } => {
                vec![Interaction::PullCollateral {
                    asset: asset.clone(),
                    from: to.clone(),
                    amount: *amount,
                }]
            }
            Interaction::MintSynthetic { to, amount } => vec![
                Interaction::PullSynthetic {
                    from: to.clone(),
                    amount: *amount,
                },
                Interaction::BurnSynthetic { amount: *amount },
            ],
            Interaction::PullSynthetic { from, amount } => vec![Interaction::PushSynthetic {
                to: from.clone(),
                amount: *amount,
            }],
            Interaction::PushSynthetic { to, amount } => vec![Interaction::PullSynthetic {
                from: to.clone(),
                amount: *amount,
            }],
            Interaction::BurnSynthetic { amount } => vec![Interaction::MintSynthetic {
                to: custody.clone(),
                amount: *amount,
            }],
        }
    }
}

/// In-flight operation: ledger effects plus pending interactions
#[derive(Debug)]
pub(crate) struct Operation<'a> {
    pub(crate) tx: LedgerTx<'a>,
    pub(crate) interactions: Vec<Interaction>,
}

/// Collateral and debt engine
pub struct CollateralEngine {
    registry: SystemRegistry,
    params: RiskParams,
    custody: AccountId,
    config: Config,
    ledger: Ledger,
    guard: ReentrancyGuard,
    metrics: Metrics,
}

impl fmt::Debug for CollateralEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollateralEngine")
            .field("registry", &self.registry)
            .field("params", &self.params)
            .field("custody", &self.custody)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

pub(crate) fn ensure_positive(amount: U256) -> Result<()> {
    if amount.is_zero() {
        return Err(Error::MustBeMoreThanZero);
    }
    Ok(())
}

impl CollateralEngine {
    /// Create engine over an immutable registry
    pub fn new(registry: SystemRegistry, config: Config) -> Result<Self> {
        config.validate()?;

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        tracing::info!(
            "Starting {} with {} collateral types",
            config.service_name,
            registry.collateral_types().len()
        );

        Ok(Self {
            params: RiskParams::from(&config.risk),
            custody: AccountId::new(config.custody_account.clone()),
            registry,
            config,
            ledger: Ledger::new(),
            guard: ReentrancyGuard::new(),
            metrics,
        })
    }

    // ---------------------------------------------------------------------
    // Mutating operations
    // ---------------------------------------------------------------------

    /// Lock `amount` of `asset` as collateral for `caller`
    pub fn deposit_collateral(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<()> {
        self.execute("deposit_collateral", |op| {
            ensure_positive(amount)?;
            self.registry.get(asset)?;
            self.deposit_effects(op, caller, asset, amount)
        })
    }

    /// Mint `amount` of synthetic debt to `caller`
    pub fn mint_debt(&self, caller: &AccountId, amount: U256) -> Result<()> {
        self.execute("mint_debt", |op| {
            ensure_positive(amount)?;
            self.mint_effects(op, caller, amount)
        })
    }

    /// Deposit collateral and mint debt in one atomic operation
    pub fn deposit_and_mint(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        collateral_amount: U256,
        debt_amount: U256,
    ) -> Result<()> {
        self.execute("deposit_and_mint", |op| {
            ensure_positive(collateral_amount)?;
            ensure_positive(debt_amount)?;
            self.registry.get(asset)?;
            self.deposit_effects(op, caller, asset, collateral_amount)?;
            self.mint_effects(op, caller, debt_amount)
        })
    }

    /// Withdraw `amount` of `asset` back to `caller`
    pub fn redeem_collateral(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<()> {
        self.execute("redeem_collateral", |op| {
            ensure_positive(amount)?;
            self.registry.get(asset)?;
            self.redeem_effects(op, asset, amount, caller, caller)?;
            self.assert_solvent(caller)
        })
    }

    /// Repay `amount` of `caller`'s debt with `caller`'s synthetic units
    pub fn burn_debt(&self, caller: &AccountId, amount: U256) -> Result<()> {
        self.execute("burn_debt", |op| {
            ensure_positive(amount)?;
            self.burn_effects(op, amount, caller, caller)?;
            self.assert_solvent(caller)
        })
    }

    /// Burn debt, then redeem collateral, in one atomic operation
    pub fn redeem_for_debt(
        &self,
        caller: &AccountId,
        asset: &AssetId,
        collateral_amount: U256,
        debt_amount: U256,
    ) -> Result<()> {
        self.execute("redeem_for_debt", |op| {
            ensure_positive(collateral_amount)?;
            ensure_positive(debt_amount)?;
            self.registry.get(asset)?;
            self.burn_effects(op, debt_amount, caller, caller)?;
            self.redeem_effects(op, asset, collateral_amount, caller, caller)?;
            self.assert_solvent(caller)
        })
    }

    // ---------------------------------------------------------------------
    // Orchestration
    // ---------------------------------------------------------------------

    /// Run one guarded, all-or-nothing operation and record its outcome
    pub(crate) fn execute<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&mut Operation<'_>) -> Result<T>,
    ) -> Result<T> {
        let result = self.run(body);

        match &result {
            Ok(_) => {
                self.metrics.record_success(operation);
                tracing::info!(operation, "Operation committed");
            }
            Err(e) => {
                self.metrics.record_failure(operation, e.category());
                tracing::warn!(operation, error = %e, "Operation aborted");
            }
        }

        result
    }

    fn run<T>(&self, body: impl FnOnce(&mut Operation<'_>) -> Result<T>) -> Result<T> {
        let _token = self.guard.enter()?;

        let mut op = Operation {
            tx: self.ledger.begin(),
            interactions: Vec::new(),
        };

        let value = body(&mut op)?;

        for (done, interaction) in op.interactions.iter().enumerate() {
            if let Err(e) = self.perform(interaction) {
                self.compensate(&op.interactions[..done]);
                return Err(e);
            }
        }

        op.tx.commit();
        Ok(value)
    }

    /// Reverse completed interactions, newest first
    fn compensate(&self, completed: &[Interaction]) {
        for interaction in completed.iter().rev() {
            for step in interaction.reversal(&self.custody) {
                if let Err(e) = self.perform(&step) {
                    tracing::error!(?interaction, error = %e, "Failed to reverse interaction");
                    break;
                }
            }
        }
    }

    fn perform(&self, interaction: &Interaction) -> Result<()> {
        let synthetic = self.registry.synthetic();

        match interaction {
            Interaction::PullCollateral {
                asset,
                from,
                amount,
            } => {
                let mover = self.registry.get(asset)?.mover();
                if !mover.transfer_from(from, &self.custody, *amount) {
                    return Err(Error::TransferFailed {
                        asset: asset.clone(),
                        from: from.clone(),
                        to: self.custody.clone(),
                    });
                }
            }
            Interaction::PushCollateral { asset, to, amount } => {
                let mover = self.registry.get(asset)?.mover();
                if !mover.transfer(to, *amount) {
                    return Err(Error::TransferFailed {
                        asset: asset.clone(),
                        from: self.custody.clone(),
                        to: to.clone(),
                    });
                }
            }
            Interaction::MintSynthetic { to, amount } => {
                if !synthetic.mint(to, *amount) {
                    return Err(Error::MintFailed);
                }
            }
            Interaction::PullSynthetic { from, amount } => {
                if !synthetic.transfer_from(from, &self.custody, *amount) {
                    return Err(Error::TransferFailed {
                        asset: AssetId::new(synthetic.symbol()),
                        from: from.clone(),
                        to: self.custody.clone(),
                    });
                }
            }
            Interaction::PushSynthetic { to, amount } => {
                if !synthetic.transfer(to, *amount) {
                    return Err(Error::TransferFailed {
                        asset: AssetId::new(synthetic.symbol()),
                        from: self.custody.clone(),
                        to: to.clone(),
                    });
                }
            }
            Interaction::BurnSynthetic { amount } => {
                if !synthetic.burn(*amount) {
                    return Err(Error::BurnFailed);
                }
            }
        }

        Ok(())
    }

    pub(crate) fn deposit_effects(
        &self,
        op: &mut Operation<'_>,
        account: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<()> {
        op.tx.credit_collateral(account, asset, amount)?;
        op.tx.record_event(self.event(
            EventKind::CollateralDeposited,
            account,
            &self.custody,
            asset,
            amount,
        ));
        op.interactions.push(Interaction::PullCollateral {
            asset: asset.clone(),
            from: account.clone(),
            amount,
        });

        tracing::debug!("Deposited {} {} for {}", amount, asset, account);
        Ok(())
    }

    pub(crate) fn mint_effects(
        &self,
        op: &mut Operation<'_>,
        account: &AccountId,
        amount: U256,
    ) -> Result<()> {
        let debt = op.tx.credit_debt(account, amount)?;
        self.assert_solvent(account)?;
        op.interactions.push(Interaction::MintSynthetic {
            to: account.clone(),
            amount,
        });

        tracing::debug!("Minted {} for {} (debt now {})", amount, account, debt);
        Ok(())
    }

    pub(crate) fn redeem_effects(
        &self,
        op: &mut Operation<'_>,
        asset: &AssetId,
        amount: U256,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<()> {
        op.tx.debit_collateral(from, asset, amount)?;
        op.tx.record_event(self.event(EventKind::CollateralRedeemed, from, to, asset, amount));
        op.interactions.push(Interaction::PushCollateral {
            asset: asset.clone(),
            to: to.clone(),
            amount,
        });

        tracing::debug!("Redeemed {} {} from {} to {}", amount, asset, from, to);
        Ok(())
    }

    pub(crate) fn burn_effects(
        &self,
        op: &mut Operation<'_>,
        amount: U256,
        on_behalf_of: &AccountId,
        payer: &AccountId,
    ) -> Result<()> {
        let debt = op.tx.debit_debt(on_behalf_of, amount)?;
        op.interactions.push(Interaction::PullSynthetic {
            from: payer.clone(),
            amount,
        });
        op.interactions.push(Interaction::BurnSynthetic { amount });

        tracing::debug!(
            "Burned {} of {}'s debt paid by {} (debt now {})",
            amount,
            on_behalf_of,
            payer,
            debt
        );
        Ok(())
    }

    /// Fail with [`Error::LowHealthFactor`] if `account` is below the minimum
    pub(crate) fn assert_solvent(&self, account: &AccountId) -> Result<()> {
        let health_factor = self.health_factor(account)?;
        health::ensure_solvent(health_factor, &self.params)
    }

    fn event(
        &self,
        kind: EventKind,
        account: &AccountId,
        counterparty: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> EngineEvent {
        EngineEvent {
            event_id: Uuid::now_v7(),
            kind,
            account: account.clone(),
            counterparty: counterparty.clone(),
            asset: asset.clone(),
            amount,
            timestamp: Utc::now(),
        }
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    /// Health factor of `account` from current ledger state
    ///
    /// Accounts without debt report `U256::MAX` without consulting the oracle.
    pub fn health_factor(&self, account: &AccountId) -> Result<U256> {
        let debt = self.ledger.debt_of(account);
        if debt.is_zero() {
            return Ok(U256::MAX);
        }
        let collateral_usd = self.collateral_value_usd(account)?;
        health::health_factor(debt, collateral_usd, &self.params)
    }

    /// Health factor for arbitrary debt and collateral value
    pub fn calculate_health_factor(&self, total_debt: U256, collateral_usd: U256) -> Result<U256> {
        health::health_factor(total_debt, collateral_usd, &self.params)
    }

    /// Total USD value of `account`'s collateral over every registered type
    pub fn collateral_value_usd(&self, account: &AccountId) -> Result<U256> {
        self.registry
            .collateral_types()
            .iter()
            .try_fold(U256::zero(), |total, collateral| {
                let amount = self.ledger.collateral_of(account, collateral.asset());
                total.safe_add(collateral.oracle().usd_value(amount)?)
            })
    }

    /// USD value of `amount` units of `asset`
    pub fn usd_value(&self, asset: &AssetId, amount: U256) -> Result<U256> {
        self.registry.get(asset)?.oracle().usd_value(amount)
    }

    /// Units of `asset` worth `usd_amount`
    pub fn token_amount_from_usd(&self, asset: &AssetId, usd_amount: U256) -> Result<U256> {
        self.registry.get(asset)?.oracle().token_amount_from_usd(usd_amount)
    }

    /// Debt and collateral value of `account`
    pub fn account_info(&self, account: &AccountId) -> Result<AccountInfo> {
        Ok(AccountInfo {
            total_debt: self.ledger.debt_of(account),
            collateral_value_usd: self.collateral_value_usd(account)?,
        })
    }

    /// Per-asset balances, values and health factor of `account`
    pub fn account_snapshot(&self, account: &AccountId) -> Result<AccountSnapshot> {
        let mut positions = Vec::with_capacity(self.registry.collateral_types().len());
        let mut collateral_value_usd = U256::zero();

        for collateral in self.registry.collateral_types() {
            let amount = self.ledger.collateral_of(account, collateral.asset());
            let value_usd = collateral.oracle().usd_value(amount)?;
            collateral_value_usd = collateral_value_usd.safe_add(value_usd)?;
            positions.push(CollateralPosition {
                asset: collateral.asset().clone(),
                amount,
                value_usd,
            });
        }

        let total_debt = self.ledger.debt_of(account);
        let health_factor = health::health_factor(total_debt, collateral_value_usd, &self.params)?;

        Ok(AccountSnapshot {
            account: account.clone(),
            positions,
            info: AccountInfo {
                total_debt,
                collateral_value_usd,
            },
            health_factor,
            health_factor_decimal: math::to_decimal(health_factor),
            taken_at: Utc::now(),
        })
    }

    /// Deposited amount of `asset` for `account`
    pub fn collateral_balance(&self, account: &AccountId, asset: &AssetId) -> U256 {
        self.ledger.collateral_of(account, asset)
    }

    /// Outstanding debt of `account`
    pub fn debt_of(&self, account: &AccountId) -> U256 {
        self.ledger.debt_of(account)
    }

    /// Event log
    pub fn events(&self) -> Vec<EngineEvent> {
        self.ledger.events()
    }

    /// Registered collateral assets in registration order
    pub fn collateral_assets(&self) -> Vec<AssetId> {
        self.registry.assets()
    }

    /// Oracle adapter for `asset`
    pub fn price_feed(&self, asset: &AssetId) -> Result<&OracleAdapter> {
        Ok(self.registry.get(asset)?.oracle())
    }

    /// Synthetic token handle
    pub fn synthetic_token(&self) -> &Arc<dyn SyntheticToken> {
        self.registry.synthetic()
    }

    /// Custody account
    pub fn custody_account(&self) -> &AccountId {
        &self.custody
    }

    /// Registry
    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Solvency parameters
    pub fn risk_params(&self) -> &RiskParams {
        &self.params
    }

    /// Fixed-point unit (1e18)
    pub fn precision(&self) -> U256 {
        math::precision()
    }

    /// Liquidation threshold
    pub fn liquidation_threshold(&self) -> U256 {
        self.params.liquidation_threshold
    }

    /// Liquidation bonus
    pub fn liquidation_bonus(&self) -> U256 {
        self.params.liquidation_bonus
    }

    /// Denominator for threshold and bonus
    pub fn liquidation_precision(&self) -> U256 {
        self.params.liquidation_precision
    }

    /// Minimum solvent health factor
    pub fn min_health_factor(&self) -> U256 {
        self.params.min_health_factor
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
