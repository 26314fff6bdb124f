// Copyright (c) 2024 Botho Foundation
//
//! Common test utilities for engine integration tests.
//!
//! [`Harness`] owns an engine, its state and a local currency ledger, and
//! drives the epoch lifecycle with the natural caller for each request.
//!
//! # Example
//!
//! ```ignore
//! use common::{Harness, PROCESSING_1PCT, BANDWIDTH_1PCT};
//!
//! let mut harness = Harness::new();
//! harness.report(PROCESSING_1PCT, BANDWIDTH_1PCT).unwrap();
//! harness.close().unwrap();
//! ```

#![allow(dead_code)]

use um_inflation_curve::{Capacity, CurveParams};
use utilmint::{
    AccountName, Allocation, EngineConfig, EngineState, HoldingAccounts, LocalCurrency, Outcome,
    Request, ResourceEngine, ResourceError, UsageReport, UsageSnapshot,
};

// ============================================================================
// Constants
// ============================================================================

/// Start of epoch 0.
pub const START: u32 = 1_700_000_000;

/// One epoch in seconds.
pub const EPOCH: u32 = 86_400;

/// Genesis supply held by the treasury.
pub const SUPPLY: u64 = 10_000_000_000_000;

/// 1% of the default epoch processing capacity.
pub const PROCESSING_1PCT: u64 = 172_800_000;

/// 1% of the default epoch bandwidth capacity, in 8-byte words.
pub const BANDWIDTH_1PCT: u64 = 113_246_208;

/// Far enough in the future that every epoch has ended.
pub const LATE: u32 = u32::MAX;

// ============================================================================
// Harness
// ============================================================================

pub fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

pub fn engine_config() -> EngineConfig {
    EngineConfig {
        admin: name("admin"),
        accounts: HoldingAccounts {
            issuer: name("issuer"),
            operator: name("operators"),
            reserve: name("reserve"),
            rebate: name("rebates"),
        },
        capacity: Capacity::default(),
        curve: CurveParams::default(),
    }
}

pub struct Harness {
    pub engine: ResourceEngine,
    pub state: EngineState,
    pub currency: LocalCurrency,
    pub source: AccountName,
}

impl Harness {
    /// Initialized at [`START`] with `oracle` authorized.
    pub fn new() -> Self {
        let mut harness = Self {
            engine: ResourceEngine::new(engine_config()),
            state: EngineState::default(),
            currency: LocalCurrency::with_supply(name("treasury"), SUPPLY),
            source: name("oracle"),
        };
        harness
            .admin(Request::Initialize { start: START })
            .unwrap();
        harness
            .admin(Request::AddSource {
                account: name("oracle"),
            })
            .unwrap();
        harness
    }

    pub fn execute(
        &mut self,
        caller: &AccountName,
        request: Request,
    ) -> Result<Outcome, ResourceError> {
        self.engine.execute(
            &mut self.state,
            &mut self.currency,
            caller,
            &request,
            LATE,
        )
    }

    pub fn admin(&mut self, request: Request) -> Result<Outcome, ResourceError> {
        self.execute(&name("admin"), request)
    }

    pub fn set_drag_limit(&mut self, drag_limit: u32) -> Result<Outcome, ResourceError> {
        self.admin(Request::SetConfig {
            paused: false,
            drag_limit,
        })
    }

    pub fn latest(&self) -> &UsageSnapshot {
        self.state.history.latest().unwrap()
    }

    /// Timestamp the next report must carry.
    pub fn next_timestamp(&self) -> u32 {
        self.latest().timestamp + EPOCH
    }

    pub fn report(&mut self, processing: u64, bandwidth: u64) -> Result<Outcome, ResourceError> {
        let timestamp = self.next_timestamp();
        self.report_at(processing, bandwidth, timestamp)
    }

    pub fn report_at(
        &mut self,
        processing: u64,
        bandwidth: u64,
        timestamp: u32,
    ) -> Result<Outcome, ResourceError> {
        let source = self.source.clone();
        self.execute(
            &source,
            Request::SubmitReport(UsageReport {
                source: source.clone(),
                processing_units: processing,
                bandwidth_units: bandwidth,
                timestamp,
            }),
        )
    }

    /// Allocate against the reported epoch.
    pub fn allocate(
        &mut self,
        participant: &str,
        processing: u64,
        bandwidth: u64,
    ) -> Result<Outcome, ResourceError> {
        let source = self.source.clone();
        let timestamp = self.latest().timestamp;
        self.execute(
            &source,
            Request::Allocate(Allocation {
                source: source.clone(),
                participant: name(participant),
                processing_units: processing,
                bandwidth_units: bandwidth,
                timestamp,
            }),
        )
    }

    /// Close the reported epoch.
    pub fn close(&mut self) -> Result<Outcome, ResourceError> {
        let source = self.source.clone();
        let timestamp = self.latest().timestamp;
        self.execute(&source, Request::ClosePeriod { source: source.clone(), timestamp })
    }

    pub fn claim(&mut self, participant: &str) -> Result<Outcome, ResourceError> {
        let participant = name(participant);
        self.execute(
            &participant,
            Request::Claim {
                participant: participant.clone(),
            },
        )
    }

    /// Report, then close, one epoch of identical usage.
    pub fn run_epoch(&mut self, processing: u64, bandwidth: u64) {
        self.report(processing, bandwidth).unwrap();
        self.close().unwrap();
    }
}
