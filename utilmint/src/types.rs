// Copyright (c) 2024 Botho Foundation

//! Identifiers and the per-epoch usage record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use um_inflation_curve::SECONDS_PER_EPOCH;

/// Longest accepted account identifier.
pub const MAX_ACCOUNT_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountNameError {
    #[error("Account name is empty")]
    Empty,

    #[error("Account name exceeds {MAX_ACCOUNT_NAME_LEN} characters: {0}")]
    TooLong(String),

    #[error("Account name contains whitespace: {0:?}")]
    Whitespace(String),
}

/// Identifier of a reporter, participant or holding account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Result<Self, AccountNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AccountNameError::Empty);
        }
        if name.chars().count() > MAX_ACCOUNT_NAME_LEN {
            return Err(AccountNameError::TooLong(name));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(AccountNameError::Whitespace(name));
        }
        Ok(Self(name))
    }

    /// Wrap a literal that is known to be valid.
    pub(crate) fn literal(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid account literal {name:?}");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountName {
    type Err = AccountNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountName {
    type Error = AccountNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

/// Network usage for one epoch, with the inflation derived from it.
///
/// Row 0 is written by initialization with every measurement zero; every
/// later row is appended by an accepted report and never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Dense, strictly increasing key.
    pub sequence: u64,
    /// Epochs since initialization.
    pub epoch_count: u32,
    /// Start of the epoch, in seconds.
    pub timestamp: u32,

    pub raw_processing_units: u64,
    /// Reported in 8-byte words.
    pub raw_bandwidth_units: u64,
    /// Locked supply observed when the report was accepted.
    pub locked_supply: u64,

    pub processing_ratio: f32,
    pub bandwidth_ratio: f32,
    pub ma_processing: f32,
    pub ma_bandwidth: f32,
    pub ema_processing: f32,
    pub ema_bandwidth: f32,

    /// Annual rate.
    pub inflation_rate: f32,
    /// `(1 + inflation_rate)^(1/365) - 1`.
    pub daily_inflation: f64,
    pub operator_daily: f32,
    pub reserve_daily: f32,
    pub rebate_daily: f32,

    pub pool_operator_amount: u64,
    pub pool_reserve_amount: u64,
    pub pool_rebate_amount: u64,
}

impl UsageSnapshot {
    /// The epoch-0 row.
    pub fn genesis(timestamp: u32) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    /// Combined EMA utilization that drives the curve.
    pub fn total_ema(&self) -> f32 {
        self.ema_processing + self.ema_bandwidth
    }

    /// Total minted for the epoch.
    pub fn pool_total(&self) -> u64 {
        self.pool_operator_amount
            .saturating_add(self.pool_reserve_amount)
            .saturating_add(self.pool_rebate_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_name_validation() {
        assert!(AccountName::new("oracle.one").is_ok());
        assert_eq!(AccountName::new(""), Err(AccountNameError::Empty));
        assert!(matches!(
            AccountName::new("two words"),
            Err(AccountNameError::Whitespace(_))
        ));
        assert!(matches!(
            AccountName::new("x".repeat(65)),
            Err(AccountNameError::TooLong(_))
        ));
        assert!(AccountName::new("x".repeat(64)).is_ok());
    }

    #[test]
    fn test_account_name_serde_rejects_invalid() {
        let name: AccountName = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(name.as_str(), "alice");
        assert!(serde_json::from_str::<AccountName>("\"\"").is_err());
    }

    #[test]
    fn test_genesis_snapshot() {
        let genesis = UsageSnapshot::genesis(1_700_000_000);
        assert_eq!(genesis.sequence, 0);
        assert_eq!(genesis.epoch_count, 0);
        assert_eq!(genesis.total_ema(), 0.0);
        assert_eq!(genesis.pool_total(), 0);
    }
}
