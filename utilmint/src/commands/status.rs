// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use std::path::Path;

use super::{format_timestamp, Session};
use crate::currency::CurrencyLedger;
use crate::history::next_epoch;
use crate::metrics;

/// Show engine status, or Prometheus metrics with `metrics`
pub fn run(config_path: &Path, show_metrics: bool) -> Result<()> {
    let session = Session::open(config_path)?;
    let state = session
        .store
        .load_state()
        .context("Failed to load engine state")?;
    let currency = session
        .store
        .load_currency()
        .context("Failed to load currency ledger")?
        .unwrap_or_default();

    if show_metrics {
        metrics::init_metrics();
        metrics::observe_state(&state);
        let output = metrics::encode().context("Failed to encode metrics")?;
        print!("{}", output);
        return Ok(());
    }

    println!();
    println!("=== utilmint Status ===");
    println!();
    println!("History:");
    match state.history.latest() {
        Ok(latest) => {
            println!("  Snapshots: {}", state.history.len());
            println!(
                "  Latest epoch: {} ({})",
                latest.epoch_count,
                format_timestamp(latest.timestamp)
            );
            println!(
                "  EMA utilization: processing {:.6}, bandwidth {:.6}",
                latest.ema_processing, latest.ema_bandwidth
            );
            println!(
                "  Inflation rate: {:.4}%",
                latest.inflation_rate as f64 * 100.0
            );
            println!(
                "  Pools: operator {}, reserve {}, rebate {}",
                latest.pool_operator_amount, latest.pool_reserve_amount, latest.pool_rebate_amount
            );
            if let Ok(next) = next_epoch(latest.timestamp) {
                println!("  Next report: epoch {}", format_timestamp(next));
            }
        }
        Err(_) => println!("  (Not initialized - run 'utilmint init')"),
    }
    println!();
    println!("Period:");
    println!("  Phase: {}", state.period.phase());
    println!(
        "  Paused: {}",
        if state.period.paused { "yes" } else { "no" }
    );
    println!("  Drag limit: {}", state.period.drag_limit);
    if state.period.is_locked {
        println!(
            "  Allocated: {:.4}% (processing {}, bandwidth {})",
            state.period.allocated_percent_total,
            state.period.allocated_processing,
            state.period.allocated_bandwidth
        );
    }
    match state.period.last_emission {
        Some(timestamp) => println!("  Last emission: {}", format_timestamp(timestamp)),
        None => println!("  Last emission: none"),
    }
    println!();
    println!("Distribution:");
    println!("  Pending claims: {}", state.claims.len());
    println!("  Pending rebates: {}", state.claims.total_accrued());
    println!("  Forfeited rebates: {}", state.period.forfeited_rebate);
    println!();
    println!("Sources:");
    if state.sources.is_empty() {
        println!("  (none)");
    }
    for source in state.sources.iter() {
        println!("  {}", source);
    }
    println!();
    println!("Currency:");
    println!("  Circulating supply: {}", currency.circulating_supply());
    println!("  Locked supply: {}", currency.locked_supply());
    let accounts = &session.config.accounts;
    for (label, account) in [
        ("Operator", &accounts.operator),
        ("Reserve", &accounts.reserve),
        ("Rebate", &accounts.rebate),
    ] {
        println!("  {} ({}): {}", label, account, currency.balance(account));
    }
    println!();

    Ok(())
}
