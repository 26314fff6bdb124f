// Copyright (c) 2024 Botho Foundation

//! Allocating the rebate pool, closing the period and paying out claims.
//!
//! ## Allocation formula
//!
//! A participant's share of an epoch is the mean of its per-dimension shares
//! (`units / reported_total`), taken over the dimensions whose reported total
//! is non-zero. The accrued rebate is that share of the epoch's rebate pool,
//! computed per dimension in integer arithmetic and rounded down, so the sum
//! of all accruals never exceeds the pool.
//!
//! A participant holds at most one claim. Allocating in a later epoch
//! replaces an unclaimed earlier claim and adds its amount to the forfeited
//! total, even when the new allocation carries zero units.

use tracing::{info, warn};
use um_inflation_curve::PoolAmounts;

use super::{EngineState, ResourceEngine};
use crate::claims::AllocationClaim;
use crate::currency::{CurrencyLedger, CurrencyOp};
use crate::error::ResourceError;
use crate::period::Phase;
use crate::request::Allocation;
use crate::types::{AccountName, UsageSnapshot};

impl ResourceEngine {
    /// Accrue `allocation.participant`'s share of the open epoch's rebate pool.
    pub fn allocate(
        &self,
        state: &mut EngineState,
        allocation: &Allocation,
    ) -> Result<AllocationClaim, ResourceError> {
        state.period.ensure_running()?;
        self.ensure_source(state, &allocation.source, "allocate")?;
        state.period.ensure_phase(Phase::Reported)?;

        let snapshot = state.history.latest()?;
        ensure_open_epoch(snapshot, allocation.timestamp)?;

        if state
            .claims
            .has_claim_for(&allocation.participant, allocation.timestamp)
        {
            return Err(ResourceError::DuplicateAllocation {
                participant: allocation.participant.clone(),
                timestamp: allocation.timestamp,
            });
        }

        let processing = cumulative(
            "processing",
            state.period.allocated_processing,
            allocation.processing_units,
            snapshot.raw_processing_units,
        )?;
        let bandwidth = cumulative(
            "bandwidth",
            state.period.allocated_bandwidth,
            allocation.bandwidth_units,
            snapshot.raw_bandwidth_units,
        )?;

        let percent_total = blended_share(
            processing,
            snapshot.raw_processing_units,
            bandwidth,
            snapshot.raw_bandwidth_units,
        ) * 100.0;
        if percent_total > 100.0 {
            return Err(ResourceError::AllocationOverflow(format!(
                "{percent_total:.6}% of epoch {} allocated",
                snapshot.timestamp
            )));
        }

        let claim = AllocationClaim {
            participant: allocation.participant.clone(),
            epoch_timestamp: allocation.timestamp,
            accrued_rebate: accrued_rebate(
                snapshot.pool_rebate_amount,
                allocation.processing_units,
                snapshot.raw_processing_units,
                allocation.bandwidth_units,
                snapshot.raw_bandwidth_units,
            ),
        };

        state.period.allocated_processing = processing;
        state.period.allocated_bandwidth = bandwidth;
        state.period.allocated_percent_total = percent_total;

        if let Some(previous) = state.claims.upsert(claim.clone()) {
            if previous.accrued_rebate > 0 {
                state.period.forfeited_rebate = state
                    .period
                    .forfeited_rebate
                    .saturating_add(previous.accrued_rebate);
                warn!(
                    participant = %previous.participant,
                    epoch = previous.epoch_timestamp,
                    amount = previous.accrued_rebate,
                    "Unclaimed rebate forfeited"
                );
            }
        }

        info!(
            participant = %claim.participant,
            accrued = claim.accrued_rebate,
            percent_total,
            "Allocation accepted"
        );

        Ok(claim)
    }

    /// Mint the open epoch's pools into their holding accounts and unlock.
    pub fn close_period<C: CurrencyLedger + ?Sized>(
        &self,
        state: &mut EngineState,
        currency: &mut C,
        source: &AccountName,
        timestamp: u32,
    ) -> Result<PoolAmounts, ResourceError> {
        state.period.ensure_running()?;
        self.ensure_source(state, source, "close periods")?;
        state.period.ensure_phase(Phase::Reported)?;

        let snapshot = state.history.latest()?;
        ensure_open_epoch(snapshot, timestamp)?;

        let minted = PoolAmounts {
            operator: snapshot.pool_operator_amount,
            reserve: snapshot.pool_reserve_amount,
            rebate: snapshot.pool_rebate_amount,
        };
        currency.apply(&self.emission_ops(&minted))?;

        state.period.close(timestamp);

        info!(
            timestamp,
            operator = minted.operator,
            reserve = minted.reserve,
            rebate = minted.rebate,
            "Period closed"
        );

        Ok(minted)
    }

    /// Pay out `participant`'s accrued rebate and delete the claim.
    pub fn claim<C: CurrencyLedger + ?Sized>(
        &self,
        state: &mut EngineState,
        currency: &mut C,
        participant: &AccountName,
    ) -> Result<u64, ResourceError> {
        state.period.ensure_running()?;
        // Pools for a reported epoch are not minted until close
        state.period.ensure_phase(Phase::Open)?;

        let amount = state
            .claims
            .get(participant)
            .map(|claim| claim.accrued_rebate)
            .unwrap_or(0);
        if amount == 0 {
            return Err(ResourceError::ZeroBalance(participant.clone()));
        }

        currency.apply(&[CurrencyOp::Transfer {
            from: self.config.accounts.rebate.clone(),
            to: participant.clone(),
            amount,
        }])?;

        state.claims.remove(participant);

        info!(participant = %participant, amount, "Rebate claimed");
        Ok(amount)
    }

    /// Issue the epoch total to the issuer, then route each pool onward.
    fn emission_ops(&self, minted: &PoolAmounts) -> Vec<CurrencyOp> {
        let total = minted.total();
        if total == 0 {
            return Vec::new();
        }

        let accounts = &self.config.accounts;
        let mut ops = vec![CurrencyOp::Issue {
            to: accounts.issuer.clone(),
            amount: total,
        }];
        for (account, amount) in [
            (&accounts.operator, minted.operator),
            (&accounts.reserve, minted.reserve),
            (&accounts.rebate, minted.rebate),
        ] {
            if amount > 0 {
                ops.push(CurrencyOp::Transfer {
                    from: accounts.issuer.clone(),
                    to: account.clone(),
                    amount,
                });
            }
        }
        ops
    }
}

fn ensure_open_epoch(snapshot: &UsageSnapshot, timestamp: u32) -> Result<(), ResourceError> {
    if timestamp != snapshot.timestamp {
        return Err(ResourceError::InvalidTimestamp(format!(
            "{timestamp} is not the open epoch {}",
            snapshot.timestamp
        )));
    }
    Ok(())
}

fn cumulative(
    dimension: &str,
    allocated: u64,
    units: u64,
    reported: u64,
) -> Result<u64, ResourceError> {
    allocated
        .checked_add(units)
        .filter(|total| *total <= reported)
        .ok_or_else(|| {
            ResourceError::AllocationOverflow(format!(
                "{dimension}: {allocated} allocated + {units} exceeds reported {reported}"
            ))
        })
}

/// Mean share across the dimensions with a non-zero reported total.
pub fn blended_share(
    processing_units: u64,
    processing_total: u64,
    bandwidth_units: u64,
    bandwidth_total: u64,
) -> f64 {
    let shares: Vec<f64> = [
        (processing_units, processing_total),
        (bandwidth_units, bandwidth_total),
    ]
    .into_iter()
    .filter(|(_, total)| *total > 0)
    .map(|(units, total)| units as f64 / total as f64)
    .collect();

    if shares.is_empty() {
        return 0.0;
    }
    shares.iter().sum::<f64>() / shares.len() as f64
}

/// Rebate for the given units, in minor units.
///
/// Units must not exceed their totals.
pub fn accrued_rebate(
    rebate_pool: u64,
    processing_units: u64,
    processing_total: u64,
    bandwidth_units: u64,
    bandwidth_total: u64,
) -> u64 {
    let parts: Vec<u128> = [
        (processing_units, processing_total),
        (bandwidth_units, bandwidth_total),
    ]
    .into_iter()
    .filter(|(_, total)| *total > 0)
    .map(|(units, total)| rebate_pool as u128 * units.min(total) as u128 / total as u128)
    .collect();

    if parts.is_empty() {
        return 0;
    }
    let accrued = parts.iter().sum::<u128>() / parts.len() as u128;
    u64::try_from(accrued).unwrap_or(rebate_pool)
}
