// Copyright (c) 2024 Botho Foundation

//! Epoch flow: report, allocate, close, claim and settings.

use anyhow::{Context, Result};
use std::path::Path;

use super::{print_outcome, Session};
use crate::history::next_epoch;
use crate::request::{Allocation, Request, UsageReport};
use crate::types::AccountName;

/// Arguments shared by the usage-carrying commands.
pub struct Usage {
    pub processing_units: u64,
    pub bandwidth_units: u64,
    pub timestamp: Option<u32>,
}

/// Submit an epoch usage report. Defaults to the epoch after the latest.
pub fn report(
    config_path: &Path,
    caller: Option<&AccountName>,
    source: AccountName,
    usage: Usage,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let timestamp = match usage.timestamp {
        Some(timestamp) => timestamp,
        None => next_epoch(latest_timestamp(&session)?)?,
    };

    let request = Request::SubmitReport(UsageReport {
        source,
        processing_units: usage.processing_units,
        bandwidth_units: usage.bandwidth_units,
        timestamp,
    });
    let outcome = session.execute(caller, &request)?;
    print_outcome(&outcome);
    Ok(())
}

/// Record a participant's usage within the open epoch.
pub fn allocate(
    config_path: &Path,
    caller: Option<&AccountName>,
    source: AccountName,
    participant: AccountName,
    usage: Usage,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let timestamp = match usage.timestamp {
        Some(timestamp) => timestamp,
        None => latest_timestamp(&session)?,
    };

    let request = Request::Allocate(Allocation {
        source,
        participant,
        processing_units: usage.processing_units,
        bandwidth_units: usage.bandwidth_units,
        timestamp,
    });
    let outcome = session.execute(caller, &request)?;
    print_outcome(&outcome);
    Ok(())
}

/// Close the open epoch and mint its pools.
pub fn close(
    config_path: &Path,
    caller: Option<&AccountName>,
    source: AccountName,
    timestamp: Option<u32>,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let timestamp = match timestamp {
        Some(timestamp) => timestamp,
        None => latest_timestamp(&session)?,
    };

    let outcome = session.execute(caller, &Request::ClosePeriod { source, timestamp })?;
    print_outcome(&outcome);
    Ok(())
}

/// Withdraw a participant's accrued rebate.
pub fn claim(
    config_path: &Path,
    caller: Option<&AccountName>,
    participant: AccountName,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let outcome = session.execute(caller, &Request::Claim { participant })?;
    print_outcome(&outcome);
    Ok(())
}

/// Change the pause flag and drag limit. Unset values keep their current
/// setting.
pub fn set_config(
    config_path: &Path,
    caller: Option<&AccountName>,
    paused: Option<bool>,
    drag_limit: Option<u32>,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let period = session
        .store
        .load_state()
        .context("Failed to load engine state")?
        .period;

    let request = Request::SetConfig {
        paused: paused.unwrap_or(period.paused),
        drag_limit: drag_limit.unwrap_or(period.drag_limit),
    };
    let outcome = session.execute(caller, &request)?;
    print_outcome(&outcome);
    Ok(())
}

fn latest_timestamp(session: &Session) -> Result<u32> {
    let state = session
        .store
        .load_state()
        .context("Failed to load engine state")?;
    let latest = state
        .history
        .latest()
        .context("No usage history. Run 'utilmint init' first.")?;
    Ok(latest.timestamp)
}
