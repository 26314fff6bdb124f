// Copyright (c) 2024 Botho Foundation

//! Engine requests and their outcomes.
//!
//! Requests are plain serde values tagged by `action`, so a batch can be fed
//! to the engine from JSON:
//!
//! ```json
//! [
//!   { "action": "submit_report", "source": "oracle", "processing_units": 172800000,
//!     "bandwidth_units": 113246208, "timestamp": 1700086400 },
//!   { "action": "close_period", "source": "oracle", "timestamp": 1700086400 }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use um_inflation_curve::PoolAmounts;

use crate::types::AccountName;

/// Aggregate usage for one completed epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub source: AccountName,
    pub processing_units: u64,
    /// 8-byte words.
    pub bandwidth_units: u64,
    pub timestamp: u32,
}

/// One participant's usage within the reported epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub source: AccountName,
    pub participant: AccountName,
    pub processing_units: u64,
    pub bandwidth_units: u64,
    pub timestamp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    SubmitReport(UsageReport),
    Allocate(Allocation),
    ClosePeriod {
        source: AccountName,
        timestamp: u32,
    },
    Claim {
        participant: AccountName,
    },
    SetConfig {
        paused: bool,
        drag_limit: u32,
    },
    Initialize {
        start: u32,
    },
    AddSource {
        account: AccountName,
    },
    RemoveSource {
        account: AccountName,
    },
}

impl Request {
    /// Stable label for metrics and logs.
    pub fn action(&self) -> &'static str {
        match self {
            Request::SubmitReport(_) => "submit_report",
            Request::Allocate(_) => "allocate",
            Request::ClosePeriod { .. } => "close_period",
            Request::Claim { .. } => "claim",
            Request::SetConfig { .. } => "set_config",
            Request::Initialize { .. } => "initialize",
            Request::AddSource { .. } => "add_source",
            Request::RemoveSource { .. } => "remove_source",
        }
    }
}

/// Result of an accepted request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    ReportAccepted {
        sequence: u64,
        timestamp: u32,
        inflation_rate: f32,
        pools: PoolAmounts,
    },
    Allocated {
        participant: AccountName,
        accrued_rebate: u64,
        allocated_percent_total: f64,
    },
    PeriodClosed {
        timestamp: u32,
        minted: PoolAmounts,
    },
    Claimed {
        participant: AccountName,
        amount: u64,
    },
    ConfigUpdated {
        paused: bool,
        drag_limit: u32,
    },
    Initialized {
        start: u32,
    },
    SourceAdded {
        account: AccountName,
    },
    SourceRemoved {
        account: AccountName,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let json = r#"{
            "action": "submit_report",
            "source": "oracle",
            "processing_units": 172800000,
            "bandwidth_units": 113246208,
            "timestamp": 86400
        }"#;
        let request: Request = serde_json::from_str(json).unwrap();
        match &request {
            Request::SubmitReport(report) => {
                assert_eq!(report.source.as_str(), "oracle");
                assert_eq!(report.processing_units, 172_800_000);
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(request.action(), "submit_report");

        let claim: Request =
            serde_json::from_str(r#"{ "action": "claim", "participant": "alice" }"#).unwrap();
        assert_eq!(claim.action(), "claim");
    }

    #[test]
    fn test_request_rejects_bad_account() {
        let json = r#"{ "action": "add_source", "account": "has space" }"#;
        assert!(serde_json::from_str::<Request>(json).is_err());
    }
}
