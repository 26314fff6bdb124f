// Copyright (c) 2024 Botho Foundation

//! utilmint - resource usage accounting and utilization-driven inflation.
//!
//! Authorized sources report each epoch's aggregate processing and bandwidth
//! usage. Every report prices the epoch on the inflation curve, splits the
//! emission into operator, reserve and rebate pools, and opens the epoch for
//! per-participant rebate allocations until it is closed and minted.

#![deny(clippy::print_stdout)]

pub mod claims;
pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod history;
pub mod metrics;
pub mod period;
pub mod request;
pub mod sources;
pub mod storage;
pub mod telemetry;
pub mod types;

// Re-export commands module for CLI binary
pub mod commands;

pub use claims::{AllocationClaim, DistributionLedger};
pub use currency::{CurrencyError, CurrencyLedger, CurrencyOp, LocalCurrency};
pub use engine::{EngineConfig, EngineState, HoldingAccounts, ResourceEngine};
pub use error::ResourceError;
pub use period::{CollectionPeriodState, Phase};
pub use request::{Allocation, Outcome, Request, UsageReport};
pub use storage::{EngineStore, StoreError};
pub use types::{AccountName, UsageSnapshot};
