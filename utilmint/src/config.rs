// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use um_inflation_curve::{Capacity, CurveParams};

use crate::currency::LocalCurrency;
use crate::engine::{EngineConfig, HoldingAccounts};
use crate::types::AccountName;

/// Main configuration for utilmint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Account allowed to initialize, manage sources and change settings
    #[serde(default = "default_admin")]
    pub admin: AccountName,

    /// Holding accounts that receive each epoch's emission
    #[serde(default = "default_accounts")]
    pub accounts: HoldingAccounts,

    /// Network capacity used to turn raw usage into ratios
    #[serde(default)]
    pub capacity: Capacity,

    /// Inflation curve constants
    #[serde(default)]
    pub curve: CurveParams,

    /// Local currency ledger seeded by `init`
    #[serde(default)]
    pub currency: CurrencyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Holder of the initial supply
    #[serde(default = "default_treasury")]
    pub treasury: AccountName,

    /// Circulating supply at genesis, in base units
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u64,

    /// Portion of the supply locked at genesis
    #[serde(default)]
    pub locked_supply: u64,
}

fn default_admin() -> AccountName {
    AccountName::literal("admin")
}

fn default_accounts() -> HoldingAccounts {
    HoldingAccounts {
        issuer: AccountName::literal("utilmint.issuer"),
        operator: AccountName::literal("utilmint.ops"),
        reserve: AccountName::literal("utilmint.reserve"),
        rebate: AccountName::literal("utilmint.rebate"),
    }
}

fn default_treasury() -> AccountName {
    AccountName::literal("utilmint.treasury")
}

/// 1 billion tokens at 4 decimals.
fn default_initial_supply() -> u64 {
    10_000_000_000_000
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            treasury: default_treasury(),
            initial_supply: default_initial_supply(),
            locked_supply: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            accounts: default_accounts(),
            capacity: Capacity::default(),
            curve: CurveParams::default(),
            currency: CurrencyConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// The engine's view of this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            admin: self.admin.clone(),
            accounts: self.accounts.clone(),
            capacity: self.capacity.clone(),
            curve: self.curve.clone(),
        }
    }

    /// Fresh currency ledger holding the configured genesis supply.
    pub fn genesis_currency(&self) -> LocalCurrency {
        let mut currency =
            LocalCurrency::with_supply(self.currency.treasury.clone(), self.currency.initial_supply);
        currency.set_locked(self.currency.locked_supply);
        currency
    }
}

/// Get the default data directory path
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".utilmint")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Get the engine database path from config file path
pub fn store_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or(config_path)
        .join("engine")
}
