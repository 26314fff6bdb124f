// Copyright (c) 2024 Botho Foundation

//! Accepting an epoch's usage report and pricing its emission.

use tracing::{debug, info};
use um_inflation_curve::{inflation_rate, smooth, waterfall_split};

use super::{EngineState, ResourceEngine};
use crate::currency::CurrencyLedger;
use crate::error::ResourceError;
use crate::history::{next_epoch, UsageLedger};
use crate::period::Phase;
use crate::request::UsageReport;
use crate::types::{UsageSnapshot, SECONDS_PER_EPOCH};

impl ResourceEngine {
    /// Record usage for the epoch after the current tail and lock the period.
    ///
    /// The epoch must have fully elapsed: `timestamp + 86400 <= now`.
    pub fn submit_report<C: CurrencyLedger + ?Sized>(
        &self,
        state: &mut EngineState,
        currency: &C,
        report: &UsageReport,
        now: u32,
    ) -> Result<UsageSnapshot, ResourceError> {
        state.period.ensure_running()?;
        self.ensure_source(state, &report.source, "submit reports")?;
        state.period.ensure_phase(Phase::Open)?;

        let last = state.history.latest()?;
        let expected = next_epoch(last.timestamp)?;
        if report.timestamp != expected {
            return Err(ResourceError::InvalidTimestamp(format!(
                "report for {} does not follow epoch {} (expected {expected})",
                report.timestamp, last.timestamp
            )));
        }
        if report.timestamp as u64 + SECONDS_PER_EPOCH as u64 > now as u64 {
            return Err(ResourceError::InvalidTimestamp(format!(
                "epoch {} has not ended at {now}",
                report.timestamp
            )));
        }

        let snapshot = self.price_epoch(
            &state.history,
            state.period.drag_limit,
            report,
            currency.circulating_supply(),
            currency.locked_supply(),
        )?;

        state.history.append(snapshot.clone())?;
        state.period.open_allocations();

        info!(
            sequence = snapshot.sequence,
            timestamp = snapshot.timestamp,
            inflation = snapshot.inflation_rate,
            minted = snapshot.pool_total(),
            "Usage report accepted"
        );

        Ok(snapshot)
    }

    /// Build the snapshot for `report` on top of `history`.
    fn price_epoch(
        &self,
        history: &UsageLedger,
        drag_limit: u32,
        report: &UsageReport,
        circulating_supply: u64,
        locked_supply: u64,
    ) -> Result<UsageSnapshot, ResourceError> {
        let last = history.latest()?;
        let sequence = last.sequence + 1;
        let epoch_count = last.epoch_count.saturating_add(1);

        let capacity = &self.config.capacity;
        let processing_ratio = capacity.processing_ratio(report.processing_units);
        let bandwidth_ratio = capacity.bandwidth_ratio(report.bandwidth_units);

        let lookback = drag_limit.saturating_sub(1) as usize;
        let (processing_sum, bandwidth_sum) = history
            .window(lookback)
            .fold((0.0f32, 0.0f32), |(p, b), s| {
                (p + s.processing_ratio, b + s.bandwidth_ratio)
            });

        let processing = smooth(
            processing_sum,
            last.ema_processing,
            processing_ratio,
            epoch_count,
            sequence,
            drag_limit,
        );
        let bandwidth = smooth(
            bandwidth_sum,
            last.ema_bandwidth,
            bandwidth_ratio,
            epoch_count,
            sequence,
            drag_limit,
        );

        let curve = &self.config.curve;
        let total_ema = processing.ema + bandwidth.ema;
        let inflation = inflation_rate(total_ema, curve);

        let locked_ratio = if circulating_supply == 0 {
            0.0
        } else {
            (locked_supply as f64 / circulating_supply as f64) as f32
        };
        let split = waterfall_split(inflation, total_ema, locked_ratio, curve);
        let daily = split.daily();
        let amounts = daily.amounts(circulating_supply);

        debug!(
            processing_ratio,
            bandwidth_ratio,
            total_ema,
            locked_ratio,
            operator = split.operator,
            reserve = split.reserve,
            rebate = split.rebate,
            daily = daily.inflation,
            "Priced epoch"
        );

        Ok(UsageSnapshot {
            sequence,
            epoch_count,
            timestamp: report.timestamp,
            raw_processing_units: report.processing_units,
            raw_bandwidth_units: report.bandwidth_units,
            locked_supply,
            processing_ratio,
            bandwidth_ratio,
            ma_processing: processing.average,
            ma_bandwidth: bandwidth.average,
            ema_processing: processing.ema,
            ema_bandwidth: bandwidth.ema,
            inflation_rate: inflation,
            daily_inflation: daily.inflation,
            operator_daily: daily.operator,
            reserve_daily: daily.reserve,
            rebate_daily: daily.rebate,
            pool_operator_amount: amounts.operator,
            pool_reserve_amount: amounts.reserve,
            pool_rebate_amount: amounts.rebate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use super::*;

    const DAY: u32 = SECONDS_PER_EPOCH;

    fn report(timestamp: u32) -> UsageReport {
        UsageReport {
            source: name("oracle"),
            processing_units: 172_800_000,
            bandwidth_units: 113_246_208,
            timestamp,
        }
    }

    #[test]
    fn test_report_locks_period() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let currency = currency();

        let snapshot = engine
            .submit_report(&mut state, &currency, &report(START + DAY), START + 2 * DAY)
            .unwrap();

        assert_eq!(snapshot.sequence, 1);
        assert_eq!(snapshot.epoch_count, 1);
        assert_eq!(snapshot.processing_ratio, 0.01);
        assert_eq!(snapshot.bandwidth_ratio, 0.01);
        assert_eq!(state.period.phase(), Phase::Reported);
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_report_requires_elapsed_epoch() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let currency = currency();

        let err = engine
            .submit_report(&mut state, &currency, &report(START + DAY), START + 2 * DAY - 1)
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidTimestamp(_)));
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.period.phase(), Phase::Open);
    }

    #[test]
    fn test_report_rejects_gap_and_replay() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let currency = currency();
        let now = START + 10 * DAY;

        let err = engine
            .submit_report(&mut state, &currency, &report(START + 2 * DAY), now)
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidTimestamp(_)));

        let err = engine
            .submit_report(&mut state, &currency, &report(START), now)
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidTimestamp(_)));

        engine
            .submit_report(&mut state, &currency, &report(START + DAY), now)
            .unwrap();
        let err = engine
            .submit_report(&mut state, &currency, &report(START + DAY), now)
            .unwrap_err();
        assert!(matches!(err, ResourceError::PeriodStateMismatch { .. }));
    }

    #[test]
    fn test_report_requires_authorized_source() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let currency = currency();

        let mut rogue = report(START + DAY);
        rogue.source = name("rogue");
        let err = engine
            .submit_report(&mut state, &currency, &rogue, START + 5 * DAY)
            .unwrap_err();
        assert!(matches!(err, ResourceError::Unauthorized { .. }));
    }

    #[test]
    fn test_report_requires_initialized_history() {
        let engine = engine();
        let mut state = EngineState::default();
        engine
            .add_source(&mut state, &name("admin"), &name("oracle"))
            .unwrap();

        let err = engine
            .submit_report(&mut state, &currency(), &report(START + DAY), START + 5 * DAY)
            .unwrap_err();
        assert!(matches!(err, ResourceError::EmptyLedger));
    }

    #[test]
    fn test_paused_engine_rejects_reports() {
        let engine = engine();
        let mut state = ready_state(&engine);
        engine.set_config(&mut state, &name("admin"), true, 2).unwrap();

        let err = engine
            .submit_report(&mut state, &currency(), &report(START + DAY), START + 5 * DAY)
            .unwrap_err();
        assert!(matches!(err, ResourceError::Paused));
    }

    #[test]
    fn test_pools_sum_to_daily_inflation() {
        let engine = engine();
        let mut state = ready_state(&engine);
        let mut currency = currency();
        currency.set_locked(SUPPLY / 4);

        let snapshot = engine
            .submit_report(&mut state, &currency, &report(START + DAY), START + 2 * DAY)
            .unwrap();

        assert!(snapshot.inflation_rate > 0.0);
        assert!(snapshot.pool_reserve_amount > 0);
        assert_eq!(snapshot.locked_supply, currency.locked_supply());

        let expected = snapshot.daily_inflation * SUPPLY as f64;
        let minted = snapshot.pool_total() as f64;
        assert!((expected - minted).abs() / expected < 1e-5);
    }
}
