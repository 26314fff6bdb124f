// Copyright (c) 2024 Botho Foundation

//! Prometheus metrics for the engine.
//!
//! ## Metrics Exported
//!
//! - `utilmint_snapshot_count` - Usage snapshots recorded, epoch 0 included (gauge)
//! - `utilmint_inflation_rate` - Annual rate of the latest epoch (gauge)
//! - `utilmint_total_ema` - Combined EMA utilization of the latest epoch (gauge)
//! - `utilmint_period_locked` - 1 while a reported epoch awaits close (gauge)
//! - `utilmint_allocated_percent` - Share of the open epoch allocated so far (gauge)
//! - `utilmint_pending_rebates` - Accrued rebates not yet claimed (gauge)
//! - `utilmint_forfeited_rebate` - Rebates overwritten before being claimed (gauge)
//!
//! Every value is derived from persisted engine state, so a fresh process
//! reports the same figures as the one that wrote them.

use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntGauge, Registry, TextEncoder};
use std::sync::Once;
use tracing::debug;

use crate::engine::EngineState;

lazy_static! {
    /// Global Prometheus registry for all metrics.
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Gauges (current values)
    // ============================================================================

    pub static ref SNAPSHOT_COUNT: IntGauge = IntGauge::new(
        "utilmint_snapshot_count",
        "Usage snapshots recorded"
    ).expect("Failed to create snapshot_count metric");

    pub static ref INFLATION_RATE: Gauge = Gauge::new(
        "utilmint_inflation_rate",
        "Annual inflation rate of the latest epoch"
    ).expect("Failed to create inflation_rate metric");

    pub static ref TOTAL_EMA: Gauge = Gauge::new(
        "utilmint_total_ema",
        "Combined EMA utilization of the latest epoch"
    ).expect("Failed to create total_ema metric");

    pub static ref PERIOD_LOCKED: IntGauge = IntGauge::new(
        "utilmint_period_locked",
        "1 while a reported epoch awaits close"
    ).expect("Failed to create period_locked metric");

    pub static ref ALLOCATED_PERCENT: Gauge = Gauge::new(
        "utilmint_allocated_percent",
        "Share of the open epoch allocated so far, in percent"
    ).expect("Failed to create allocated_percent metric");

    pub static ref PENDING_REBATES: IntGauge = IntGauge::new(
        "utilmint_pending_rebates",
        "Accrued rebates not yet claimed"
    ).expect("Failed to create pending_rebates metric");

    pub static ref FORFEITED_REBATE: IntGauge = IntGauge::new(
        "utilmint_forfeited_rebate",
        "Rebates overwritten before being claimed"
    ).expect("Failed to create forfeited_rebate metric");
}

static INIT: Once = Once::new();

/// Register all metrics with the global registry. Safe to call more than once.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(SNAPSHOT_COUNT.clone()))
            .expect("Failed to register snapshot_count");
        REGISTRY
            .register(Box::new(INFLATION_RATE.clone()))
            .expect("Failed to register inflation_rate");
        REGISTRY
            .register(Box::new(TOTAL_EMA.clone()))
            .expect("Failed to register total_ema");
        REGISTRY
            .register(Box::new(PERIOD_LOCKED.clone()))
            .expect("Failed to register period_locked");
        REGISTRY
            .register(Box::new(ALLOCATED_PERCENT.clone()))
            .expect("Failed to register allocated_percent");
        REGISTRY
            .register(Box::new(PENDING_REBATES.clone()))
            .expect("Failed to register pending_rebates");
        REGISTRY
            .register(Box::new(FORFEITED_REBATE.clone()))
            .expect("Failed to register forfeited_rebate");

        debug!("Prometheus metrics initialized");
    });
}

/// Update gauges from the engine state.
pub fn observe_state(state: &EngineState) {
    SNAPSHOT_COUNT.set(state.history.len() as i64);
    if let Ok(latest) = state.history.latest() {
        INFLATION_RATE.set(latest.inflation_rate as f64);
        TOTAL_EMA.set(latest.total_ema() as f64);
    }
    PERIOD_LOCKED.set(state.period.is_locked as i64);
    ALLOCATED_PERCENT.set(state.period.allocated_percent_total);
    PENDING_REBATES.set(i64::try_from(state.claims.total_accrued()).unwrap_or(i64::MAX));
    FORFEITED_REBATE.set(i64::try_from(state.period.forfeited_rebate).unwrap_or(i64::MAX));
}

/// Encode metrics in Prometheus text format
pub fn encode() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::AllocationClaim;
    use crate::types::AccountName;

    #[test]
    fn test_init_is_idempotent() {
        init_metrics();
        init_metrics();

        let output = encode().unwrap();
        assert!(output.contains("utilmint_snapshot_count"));
        assert!(output.contains("utilmint_period_locked"));
    }

    #[test]
    fn test_observe_state() {
        init_metrics();

        let mut state = EngineState::default();
        state.history.initialize(1_000).unwrap();
        state.period.is_locked = true;
        state.claims.upsert(AllocationClaim {
            participant: AccountName::new("alice").unwrap(),
            epoch_timestamp: 1_000,
            accrued_rebate: 77,
        });

        observe_state(&state);
        assert_eq!(SNAPSHOT_COUNT.get(), 1);
        assert_eq!(PERIOD_LOCKED.get(), 1);
        assert_eq!(PENDING_REBATES.get(), 77);
    }

    #[test]
    fn test_only_state_derived_gauges_are_exported() {
        init_metrics();

        let families = REGISTRY.gather();
        assert_eq!(families.len(), 7);
        for family in families {
            assert_eq!(
                family.get_field_type(),
                prometheus::proto::MetricType::GAUGE,
                "{} is not a gauge",
                family.get_name()
            );
        }
    }
}
