// Copyright (c) 2024 Botho Foundation

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use super::{format_timestamp, now, Session};
use crate::config::Config;
use crate::request::Request;
use crate::types::{AccountName, SECONDS_PER_EPOCH};

/// Run the init command
///
/// Writes a default config if none exists, seeds the local currency ledger
/// and records epoch 0 starting at `start` (default: the current UTC day).
pub fn run(config_path: &Path, caller: Option<&AccountName>, start: Option<u32>) -> Result<()> {
    if !Config::exists(config_path) {
        Config::default().save(config_path)?;
        info!("Config written to {}", config_path.display());
        println!("Config saved to: {}", config_path.display());
    }

    let session = Session::open(config_path)?;
    let state = session
        .store
        .load_state()
        .context("Failed to load engine state")?;
    if !state.history.is_empty() {
        bail!(
            "Engine at {} is already initialized\nUse a different --config path or delete the existing data.",
            config_path.display()
        );
    }

    if session
        .store
        .load_currency()
        .context("Failed to load currency ledger")?
        .is_none()
    {
        session
            .store
            .commit(&state, &session.config.genesis_currency())
            .context("Failed to seed currency ledger")?;
        info!(
            supply = session.config.currency.initial_supply,
            treasury = %session.config.currency.treasury,
            "Currency ledger seeded"
        );
    }

    let start = match start {
        Some(start) => start,
        None => start_of_day(now()?),
    };
    let outcome = session.execute(caller, &Request::Initialize { start })?;
    super::print_outcome(&outcome);

    println!("\nNext steps:");
    println!("  1. Run 'utilmint source add <account>' to authorize a reporter");
    println!(
        "  2. Report the first epoch after {}",
        format_timestamp(start.saturating_add(2 * SECONDS_PER_EPOCH))
    );

    Ok(())
}

/// Midnight UTC of the day containing `timestamp`.
fn start_of_day(timestamp: u32) -> u32 {
    timestamp - timestamp % SECONDS_PER_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(1_700_000_000), 1_699_920_000);
        assert_eq!(start_of_day(1_699_920_000), 1_699_920_000);
    }
}
