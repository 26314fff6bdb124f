// Copyright (c) 2024 Botho Foundation

//! Seam to the native-currency ledger.
//!
//! The engine never holds balances itself. It reads circulating and locked
//! supply when pricing an epoch, and submits mints and transfers as a single
//! batch that the ledger applies atomically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::AccountName;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Insufficient funds in {account}: balance {balance}, needed {needed}")]
    InsufficientFunds {
        account: AccountName,
        balance: u64,
        needed: u64,
    },

    #[error("Supply overflow issuing {0}")]
    SupplyOverflow(u64),

    #[error("Currency ledger unavailable: {0}")]
    Unavailable(String),
}

/// One step of a currency batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyOp {
    /// Mint new supply into `to`.
    Issue { to: AccountName, amount: u64 },
    /// Move existing supply.
    Transfer {
        from: AccountName,
        to: AccountName,
        amount: u64,
    },
}

pub trait CurrencyLedger {
    /// Supply in circulation, in minor units.
    fn circulating_supply(&self) -> u64;

    /// Supply currently locked, in minor units.
    fn locked_supply(&self) -> u64;

    fn balance(&self, account: &AccountName) -> u64;

    /// Apply every operation or none of them.
    fn apply(&mut self, ops: &[CurrencyOp]) -> Result<(), CurrencyError>;
}

/// In-process currency ledger used by the CLI and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCurrency {
    balances: BTreeMap<AccountName, u64>,
    supply: u64,
    locked: u64,
}

impl LocalCurrency {
    /// A ledger whose entire supply sits in `holder`.
    pub fn with_supply(holder: AccountName, supply: u64) -> Self {
        let mut balances = BTreeMap::new();
        if supply > 0 {
            balances.insert(holder, supply);
        }
        Self {
            balances,
            supply,
            locked: 0,
        }
    }

    /// Record how much supply is locked. Capped at the circulating supply.
    pub fn set_locked(&mut self, locked: u64) {
        self.locked = locked.min(self.supply);
    }

    pub fn balances(&self) -> impl Iterator<Item = (&AccountName, &u64)> {
        self.balances.iter()
    }
}

impl CurrencyLedger for LocalCurrency {
    fn circulating_supply(&self) -> u64 {
        self.supply
    }

    fn locked_supply(&self) -> u64 {
        self.locked
    }

    fn balance(&self, account: &AccountName) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn apply(&mut self, ops: &[CurrencyOp]) -> Result<(), CurrencyError> {
        let mut balances = self.balances.clone();
        let mut supply = self.supply;

        for op in ops {
            match op {
                CurrencyOp::Issue { to, amount } => {
                    supply = supply
                        .checked_add(*amount)
                        .ok_or(CurrencyError::SupplyOverflow(*amount))?;
                    let balance = balances.entry(to.clone()).or_insert(0);
                    *balance = balance
                        .checked_add(*amount)
                        .ok_or(CurrencyError::SupplyOverflow(*amount))?;
                }
                CurrencyOp::Transfer { from, to, amount } => {
                    let available = balances.get(from).copied().unwrap_or(0);
                    if available < *amount {
                        return Err(CurrencyError::InsufficientFunds {
                            account: from.clone(),
                            balance: available,
                            needed: *amount,
                        });
                    }
                    balances.insert(from.clone(), available - amount);
                    // Cannot overflow: total balances never exceed supply
                    *balances.entry(to.clone()).or_insert(0) += amount;
                }
            }
        }

        balances.retain(|_, balance| *balance > 0);
        self.balances = balances;
        self.supply = supply;
        Ok(())
    }
}
