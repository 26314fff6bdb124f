// Copyright (c) 2024 Botho Foundation

//! Collection-period state: the open/reported gate and engine settings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ResourceError;

/// Default smoothing window in epochs.
pub const DEFAULT_DRAG_LIMIT: u32 = 2;

/// Smallest drag limit accepted by configuration.
pub const MIN_DRAG_LIMIT: u32 = 1;

/// Largest drag limit accepted by configuration.
pub const MAX_DRAG_LIMIT: u32 = 19;

/// Lifecycle phase of the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for the next epoch's report.
    Open,
    /// Report accepted; taking allocations until the period is closed.
    Reported,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Open => write!(f, "open"),
            Phase::Reported => write!(f, "reported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPeriodState {
    /// Set between an accepted report and the period close.
    pub is_locked: bool,

    /// Processing units allocated against the open snapshot.
    pub allocated_processing: u64,

    /// Bandwidth units allocated against the open snapshot.
    pub allocated_bandwidth: u64,

    /// Blended share of the open snapshot allocated so far, in percent.
    pub allocated_percent_total: f64,

    /// Moving-average window in epochs.
    pub drag_limit: u32,

    /// Blocks reports, allocations, closes and claims while set.
    pub paused: bool,

    /// Timestamp of the most recently closed epoch.
    pub last_emission: Option<u32>,

    /// Unclaimed rebate overwritten by a later epoch's allocation.
    pub forfeited_rebate: u64,
}

impl Default for CollectionPeriodState {
    fn default() -> Self {
        Self {
            is_locked: false,
            allocated_processing: 0,
            allocated_bandwidth: 0,
            allocated_percent_total: 0.0,
            drag_limit: DEFAULT_DRAG_LIMIT,
            paused: false,
            last_emission: None,
            forfeited_rebate: 0,
        }
    }
}

impl CollectionPeriodState {
    pub fn phase(&self) -> Phase {
        if self.is_locked {
            Phase::Reported
        } else {
            Phase::Open
        }
    }

    pub fn ensure_phase(&self, expected: Phase) -> Result<(), ResourceError> {
        let actual = self.phase();
        if actual != expected {
            return Err(ResourceError::PeriodStateMismatch { expected, actual });
        }
        Ok(())
    }

    pub fn ensure_running(&self) -> Result<(), ResourceError> {
        if self.paused {
            return Err(ResourceError::Paused);
        }
        Ok(())
    }

    /// Lock the period for a freshly accepted report.
    pub fn open_allocations(&mut self) {
        self.is_locked = true;
        self.allocated_processing = 0;
        self.allocated_bandwidth = 0;
        self.allocated_percent_total = 0.0;
    }

    /// Unlock after the period's pools have been minted.
    pub fn close(&mut self, timestamp: u32) {
        self.is_locked = false;
        self.last_emission = Some(timestamp);
    }

    /// Apply new settings after validating the drag limit.
    pub fn configure(&mut self, paused: bool, drag_limit: u32) -> Result<(), ResourceError> {
        validate_drag_limit(drag_limit)?;
        self.paused = paused;
        self.drag_limit = drag_limit;
        Ok(())
    }
}

pub fn validate_drag_limit(drag_limit: u32) -> Result<(), ResourceError> {
    if !(MIN_DRAG_LIMIT..=MAX_DRAG_LIMIT).contains(&drag_limit) {
        return Err(ResourceError::ConfigOutOfRange(drag_limit));
    }
    Ok(())
}
