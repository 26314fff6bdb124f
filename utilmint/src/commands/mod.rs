// Copyright (c) 2024 Botho Foundation

//! CLI command implementations.
//!
//! These modules implement the user-facing CLI commands and legitimately
//! use stdout for output.

#![allow(clippy::print_stdout)]

pub mod apply;
pub mod history;
pub mod init;
pub mod period;
pub mod source;
pub mod status;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::Path;
use tracing::warn;

use crate::config::{store_path_from_config, Config};
use crate::engine::ResourceEngine;
use crate::request::{Outcome, Request};
use crate::storage::EngineStore;
use crate::types::AccountName;

/// Loaded configuration, engine and store for one command.
pub struct Session {
    pub config: Config,
    pub engine: ResourceEngine,
    pub store: EngineStore,
}

impl Session {
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = Config::load(config_path)
            .context("No config found. Run 'utilmint init' first.")?;
        let store_path = store_path_from_config(config_path);
        let store = EngineStore::open(&store_path)
            .with_context(|| format!("Failed to open engine store at {}", store_path.display()))?;
        let engine = ResourceEngine::new(config.engine_config());
        Ok(Self {
            config,
            engine,
            store,
        })
    }

    /// Execute one request in its own store transaction.
    ///
    /// Without an explicit `caller` the request is sent by the account it
    /// names, or by the admin for administrative requests.
    pub fn execute(&self, caller: Option<&AccountName>, request: &Request) -> Result<Outcome> {
        let caller = caller
            .cloned()
            .unwrap_or_else(|| default_caller(request, &self.config.admin));
        let now = now()?;

        let result = self.store.transact(|state, currency| {
            self.engine.execute(state, currency, &caller, request, now)
        });

        result.map_err(|e| {
            warn!(action = request.action(), kind = e.kind(), "Request rejected");
            anyhow!(e).context(format!("{} rejected", request.action()))
        })
    }
}

/// The account a request is naturally sent by.
pub fn default_caller(request: &Request, admin: &AccountName) -> AccountName {
    match request {
        Request::SubmitReport(report) => report.source.clone(),
        Request::Allocate(allocation) => allocation.source.clone(),
        Request::ClosePeriod { source, .. } => source.clone(),
        Request::Claim { participant } => participant.clone(),
        Request::SetConfig { .. }
        | Request::Initialize { .. }
        | Request::AddSource { .. }
        | Request::RemoveSource { .. } => admin.clone(),
    }
}

/// Current time as engine seconds.
pub fn now() -> Result<u32> {
    u32::try_from(Utc::now().timestamp()).context("System clock is outside the supported range")
}

/// Parse integer seconds, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`, all UTC.
pub fn parse_timestamp(input: &str) -> Result<u32> {
    let seconds = if let Ok(seconds) = input.parse::<i64>() {
        seconds
    } else if let Ok(datetime) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        datetime.and_utc().timestamp()
    } else if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Invalid date: {input}"))?
            .and_utc()
            .timestamp()
    } else {
        bail!("Invalid timestamp {input:?}: expected seconds or YYYY-MM-DDTHH:MM:SS");
    };

    u32::try_from(seconds).with_context(|| format!("Timestamp {input:?} is out of range"))
}

pub fn format_timestamp(timestamp: u32) -> String {
    DateTime::from_timestamp(i64::from(timestamp), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Print an accepted request's outcome.
pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::ReportAccepted {
            sequence,
            timestamp,
            inflation_rate,
            pools,
        } => {
            println!(
                "Report accepted: epoch {} ({})",
                sequence,
                format_timestamp(*timestamp)
            );
            println!("  Inflation rate: {:.4}%", *inflation_rate as f64 * 100.0);
            println!("  Operator pool:  {}", pools.operator);
            println!("  Reserve pool:   {}", pools.reserve);
            println!("  Rebate pool:    {}", pools.rebate);
        }
        Outcome::Allocated {
            participant,
            accrued_rebate,
            allocated_percent_total,
        } => {
            println!("Allocated {} to {}", accrued_rebate, participant);
            println!("  Epoch allocated: {:.4}%", allocated_percent_total);
        }
        Outcome::PeriodClosed { timestamp, minted } => {
            println!("Epoch {} closed", format_timestamp(*timestamp));
            println!("  Minted: {}", minted.total());
        }
        Outcome::Claimed {
            participant,
            amount,
        } => {
            println!("{} claimed {}", participant, amount);
        }
        Outcome::ConfigUpdated { paused, drag_limit } => {
            println!("Configuration updated: paused={}, drag_limit={}", paused, drag_limit);
        }
        Outcome::Initialized { start } => {
            println!("Usage history initialized at {}", format_timestamp(*start));
        }
        Outcome::SourceAdded { account } => {
            println!("Source authorized: {}", account);
        }
        Outcome::SourceRemoved { account } => {
            println!("Source removed: {}", account);
        }
    }
}
