//! Collateral and debt ledger
//!
//! Per-account collateral balances (one entry per asset, absent = zero) and
//! per-account debt, plus the append-only event log.
//!
//! All writes go through a [`LedgerTx`], which journals the previous value of
//! every entry it touches. Dropping a transaction without committing replays
//! the journal backwards, so a failed operation leaves nothing behind. The
//! state lock is only held for the duration of a single read or write, never
//! across a collaborator call.

use crate::math::SafeMath;
use crate::types::{AccountId, AssetId, EngineEvent};
use crate::Result;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct LedgerState {
    collateral: HashMap<AccountId, HashMap<AssetId, U256>>,
    debt: HashMap<AccountId, U256>,
    events: Vec<EngineEvent>,
}

/// Previous value of a touched entry
#[derive(Debug)]
enum Undo {
    Collateral {
        account: AccountId,
        asset: AssetId,
        previous: Option<U256>,
    },
    Debt {
        account: AccountId,
        previous: Option<U256>,
    },
    Event,
}

/// Shared ledger state
#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a journaled write transaction
    pub fn begin(&self) -> LedgerTx<'_> {
        LedgerTx {
            ledger: self,
            journal: Vec::new(),
            committed: false,
        }
    }

    /// Deposited amount of `asset` for `account`
    pub fn collateral_of(&self, account: &AccountId, asset: &AssetId) -> U256 {
        self.state
            .lock()
            .collateral
            .get(account)
            .and_then(|balances| balances.get(asset))
            .copied()
            .unwrap_or_default()
    }

    /// Outstanding debt of `account`
    pub fn debt_of(&self, account: &AccountId) -> U256 {
        self.state
            .lock()
            .debt
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Copy of the event log
    pub fn events(&self) -> Vec<EngineEvent> {
        self.state.lock().events.clone()
    }

    fn rollback(&self, journal: Vec<Undo>) {
        let mut state = self.state.lock();
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Collateral {
                    account,
                    asset,
                    previous,
                } => {
                    let balances = state.collateral.entry(account).or_default();
                    match previous {
                        Some(amount) => {
                            balances.insert(asset, amount);
                        }
                        None => {
                            balances.remove(&asset);
                        }
                    }
                }
                Undo::Debt { account, previous } => match previous {
                    Some(amount) => {
                        state.debt.insert(account, amount);
                    }
                    None => {
                        state.debt.remove(&account);
                    }
                },
                Undo::Event => {
                    state.events.pop();
                }
            }
        }
    }
}

/// Journaled write transaction; rolls back on drop unless committed
#[derive(Debug)]
pub struct LedgerTx<'a> {
    ledger: &'a Ledger,
    journal: Vec<Undo>,
    committed: bool,
}

impl LedgerTx<'_> {
    /// Increase collateral balance
    pub fn credit_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<U256> {
        self.update_collateral(account, asset, |balance| balance.safe_add(amount))
    }

    /// Decrease collateral balance; insufficient balance is an arithmetic fault
    pub fn debit_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: U256,
    ) -> Result<U256> {
        self.update_collateral(account, asset, |balance| balance.safe_sub(amount))
    }

    /// Increase debt
    pub fn credit_debt(&mut self, account: &AccountId, amount: U256) -> Result<U256> {
        self.update_debt(account, |debt| debt.safe_add(amount))
    }

    /// Decrease debt; repaying more than is owed is an arithmetic fault
    pub fn debit_debt(&mut self, account: &AccountId, amount: U256) -> Result<U256> {
        self.update_debt(account, |debt| debt.safe_sub(amount))
    }

    /// Append an event to the log
    pub fn record_event(&mut self, event: EngineEvent) {
        self.ledger.state.lock().events.push(event);
        self.journal.push(Undo::Event);
    }

    /// Keep every mutation
    pub fn commit(mut self) {
        self.committed = true;
        self.journal.clear();
    }

    fn update_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        apply: impl FnOnce(U256) -> Result<U256>,
    ) -> Result<U256> {
        let mut state = self.ledger.state.lock();
        let previous = state
            .collateral
            .get(account)
            .and_then(|balances| balances.get(asset))
            .copied();
        let updated = apply(previous.unwrap_or_default())?;

        state
            .collateral
            .entry(account.clone())
            .or_default()
            .insert(asset.clone(), updated);
        self.journal.push(Undo::Collateral {
            account: account.clone(),
            asset: asset.clone(),
            previous,
        });
        Ok(updated)
    }

    fn update_debt(
        &mut self,
        account: &AccountId,
        apply: impl FnOnce(U256) -> Result<U256>,
    ) -> Result<U256> {
        let mut state = self.ledger.state.lock();
        let previous = state.debt.get(account).copied();
        let updated = apply(previous.unwrap_or_default())?;

        state.debt.insert(account.clone(), updated);
        self.journal.push(Undo::Debt {
            account: account.clone(),
            previous,
        });
        Ok(updated)
    }
}

impl Drop for LedgerTx<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.journal.is_empty() {
            tracing::debug!("Rolling back {} ledger mutations", self.journal.len());
            self.ledger.rollback(std::mem::take(&mut self.journal));
        }
    }
}
