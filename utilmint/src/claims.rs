// Copyright (c) 2024 Botho Foundation

//! Per-participant accrued rebates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::AccountName;

/// A participant's accrued, unwithdrawn share of one epoch's rebate pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationClaim {
    pub participant: AccountName,
    pub epoch_timestamp: u32,
    /// Minor units.
    pub accrued_rebate: u64,
}

/// At most one live claim per participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionLedger {
    claims: BTreeMap<AccountName, AllocationClaim>,
}

impl DistributionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, participant: &AccountName) -> Option<&AllocationClaim> {
        self.claims.get(participant)
    }

    /// Whether `participant` already holds a claim for the epoch at `timestamp`.
    pub fn has_claim_for(&self, participant: &AccountName, timestamp: u32) -> bool {
        self.claims
            .get(participant)
            .is_some_and(|claim| claim.epoch_timestamp == timestamp)
    }

    /// Store `claim`, returning the row it replaced.
    pub fn upsert(&mut self, claim: AllocationClaim) -> Option<AllocationClaim> {
        self.claims.insert(claim.participant.clone(), claim)
    }

    pub fn remove(&mut self, participant: &AccountName) -> Option<AllocationClaim> {
        self.claims.remove(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AllocationClaim> {
        self.claims.values()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Sum of all unwithdrawn rebates.
    pub fn total_accrued(&self) -> u64 {
        self.claims
            .values()
            .fold(0u64, |acc, claim| acc.saturating_add(claim.accrued_rebate))
    }
}

impl FromIterator<AllocationClaim> for DistributionLedger {
    fn from_iter<T: IntoIterator<Item = AllocationClaim>>(iter: T) -> Self {
        Self {
            claims: iter
                .into_iter()
                .map(|claim| (claim.participant.clone(), claim))
                .collect(),
        }
    }
}
