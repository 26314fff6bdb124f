// Copyright (c) 2024 Botho Foundation

use thiserror::Error;

use crate::currency::CurrencyError;
use crate::period::Phase;
use crate::storage::StoreError;
use crate::types::AccountName;

/// Rejection of an engine request. A rejected request changes nothing.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized {
        caller: AccountName,
        action: &'static str,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Period is {actual}, expected {expected}")]
    PeriodStateMismatch { expected: Phase, actual: Phase },

    #[error("Allocation overflow: {0}")]
    AllocationOverflow(String),

    #[error("Duplicate allocation for {participant} at {timestamp}")]
    DuplicateAllocation {
        participant: AccountName,
        timestamp: u32,
    },

    #[error("Nothing to claim for {0}")]
    ZeroBalance(AccountName),

    #[error("Usage history is empty; initialize first")]
    EmptyLedger,

    #[error("Drag limit {0} out of range (1..=19)")]
    ConfigOutOfRange(u32),

    #[error("Usage history already initialized")]
    AlreadyInitialized,

    #[error("Snapshot sequence {actual} does not follow {expected}")]
    InvalidSequence { expected: u64, actual: u64 },

    #[error("Source already authorized: {0}")]
    SourceAlreadyAuthorized(AccountName),

    #[error("Source not found: {0}")]
    SourceNotFound(AccountName),

    #[error("Engine is paused")]
    Paused,

    #[error("Currency error: {0}")]
    Currency(#[from] CurrencyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ResourceError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::PeriodStateMismatch { .. } => "period_state_mismatch",
            Self::AllocationOverflow(_) => "allocation_overflow",
            Self::DuplicateAllocation { .. } => "duplicate_allocation",
            Self::ZeroBalance(_) => "zero_balance",
            Self::EmptyLedger => "empty_ledger",
            Self::ConfigOutOfRange(_) => "config_out_of_range",
            Self::AlreadyInitialized => "already_initialized",
            Self::InvalidSequence { .. } => "invalid_sequence",
            Self::SourceAlreadyAuthorized(_) => "source_already_authorized",
            Self::SourceNotFound(_) => "source_not_found",
            Self::Paused => "paused",
            Self::Currency(_) => "currency",
            Self::Store(_) => "store",
        }
    }
}
