// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use std::path::Path;

use super::{format_timestamp, Session};

/// Print the most recent `limit` usage snapshots, newest first
pub fn run(config_path: &Path, limit: usize, json: bool) -> Result<()> {
    let session = Session::open(config_path)?;
    let state = session
        .store
        .load_state()
        .context("Failed to load engine state")?;

    let snapshots: Vec<_> = state.history.window(limit).collect();

    if json {
        let output =
            serde_json::to_string_pretty(&snapshots).context("Failed to serialize history")?;
        println!("{}", output);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("No usage history. Run 'utilmint init' first.");
        return Ok(());
    }

    println!(
        "{:>6}  {:<23}  {:>10}  {:>10}  {:>10}  {:>10}  {:>9}  {:>14}",
        "epoch", "start", "cpu", "net", "ema cpu", "ema net", "rate %", "minted"
    );
    for snapshot in snapshots {
        println!(
            "{:>6}  {:<23}  {:>10.6}  {:>10.6}  {:>10.6}  {:>10.6}  {:>9.4}  {:>14}",
            snapshot.epoch_count,
            format_timestamp(snapshot.timestamp),
            snapshot.processing_ratio,
            snapshot.bandwidth_ratio,
            snapshot.ema_processing,
            snapshot.ema_bandwidth,
            snapshot.inflation_rate as f64 * 100.0,
            snapshot.pool_total()
        );
    }

    Ok(())
}
