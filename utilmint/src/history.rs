// Copyright (c) 2024 Botho Foundation

//! Append-only ledger of per-epoch usage snapshots.

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::types::{UsageSnapshot, SECONDS_PER_EPOCH};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageLedger {
    snapshots: Vec<UsageSnapshot>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the epoch-0 row. Only valid on an empty ledger.
    pub fn initialize(&mut self, start: u32) -> Result<&UsageSnapshot, ResourceError> {
        if !self.snapshots.is_empty() {
            return Err(ResourceError::AlreadyInitialized);
        }
        self.snapshots.push(UsageSnapshot::genesis(start));
        self.latest()
    }

    /// Append the next epoch.
    ///
    /// The snapshot must carry the next sequence number and start exactly one
    /// epoch after the current tail.
    pub fn append(&mut self, snapshot: UsageSnapshot) -> Result<(), ResourceError> {
        let last = self.latest()?;

        let expected_sequence = last.sequence + 1;
        if snapshot.sequence != expected_sequence {
            return Err(ResourceError::InvalidSequence {
                expected: expected_sequence,
                actual: snapshot.sequence,
            });
        }

        let expected_timestamp = next_epoch(last.timestamp)?;
        if snapshot.timestamp != expected_timestamp {
            return Err(ResourceError::InvalidTimestamp(format!(
                "expected {expected_timestamp}, got {}",
                snapshot.timestamp
            )));
        }

        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Rebuild a ledger from stored rows, re-checking the chain.
    pub fn restore(
        snapshots: impl IntoIterator<Item = UsageSnapshot>,
    ) -> Result<Self, ResourceError> {
        let mut ledger = Self::new();
        for snapshot in snapshots {
            if ledger.is_empty() {
                if snapshot.sequence != 0 {
                    return Err(ResourceError::InvalidSequence {
                        expected: 0,
                        actual: snapshot.sequence,
                    });
                }
                ledger.snapshots.push(snapshot);
            } else {
                ledger.append(snapshot)?;
            }
        }
        Ok(ledger)
    }

    pub fn latest(&self) -> Result<&UsageSnapshot, ResourceError> {
        self.snapshots.last().ok_or(ResourceError::EmptyLedger)
    }

    /// The last `n` snapshots, newest first. Yields fewer when the ledger is
    /// shorter.
    pub fn window(&self, n: usize) -> impl Iterator<Item = &UsageSnapshot> + '_ {
        self.snapshots.iter().rev().take(n)
    }

    pub fn get(&self, sequence: u64) -> Option<&UsageSnapshot> {
        usize::try_from(sequence)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &UsageSnapshot> + '_ {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Timestamp of the epoch after `timestamp`.
pub fn next_epoch(timestamp: u32) -> Result<u32, ResourceError> {
    timestamp.checked_add(SECONDS_PER_EPOCH).ok_or_else(|| {
        ResourceError::InvalidTimestamp(format!("{timestamp} is the last representable epoch"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u32 = 1_700_000_000;

    fn snapshot(sequence: u64, timestamp: u32) -> UsageSnapshot {
        UsageSnapshot {
            sequence,
            epoch_count: sequence as u32,
            timestamp,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = UsageLedger::new();
        assert!(matches!(ledger.latest(), Err(ResourceError::EmptyLedger)));
        assert_eq!(ledger.window(3).count(), 0);

        let mut ledger = UsageLedger::new();
        let err = ledger.append(snapshot(1, START + SECONDS_PER_EPOCH)).unwrap_err();
        assert!(matches!(err, ResourceError::EmptyLedger));
    }

    #[test]
    fn test_initialize_once() {
        let mut ledger = UsageLedger::new();
        ledger.initialize(START).unwrap();
        assert_eq!(ledger.latest().unwrap().timestamp, START);

        assert!(matches!(
            ledger.initialize(START),
            Err(ResourceError::AlreadyInitialized)
        ));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_append_requires_next_epoch() {
        let mut ledger = UsageLedger::new();
        ledger.initialize(START).unwrap();

        let err = ledger
            .append(snapshot(1, START + 2 * SECONDS_PER_EPOCH))
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidTimestamp(_)));

        let err = ledger.append(snapshot(2, START + SECONDS_PER_EPOCH)).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidSequence { expected: 1, actual: 2 }));

        ledger.append(snapshot(1, START + SECONDS_PER_EPOCH)).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_window_is_newest_first_and_finite() {
        let mut ledger = UsageLedger::new();
        ledger.initialize(START).unwrap();
        for sequence in 1..=4 {
            let timestamp = START + sequence as u32 * SECONDS_PER_EPOCH;
            ledger.append(snapshot(sequence, timestamp)).unwrap();
        }

        let sequences: Vec<u64> = ledger.window(3).map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![4, 3, 2]);

        let all: Vec<u64> = ledger.window(10).map(|s| s.sequence).collect();
        assert_eq!(all, vec![4, 3, 2, 1, 0]);

        assert_eq!(ledger.window(0).count(), 0);
        assert_eq!(ledger.get(2).unwrap().sequence, 2);
        assert!(ledger.get(9).is_none());
    }
}
